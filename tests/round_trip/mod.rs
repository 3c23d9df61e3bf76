mod fat;
mod macho;
