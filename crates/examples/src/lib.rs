// Style.
#![allow(clippy::nonminimal_bool)]
#![allow(clippy::single_match)]

#[cfg(feature = "read")]
pub mod readobj;
