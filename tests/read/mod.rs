mod macho;
