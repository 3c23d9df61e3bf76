#![cfg(all(feature = "read", feature = "write"))]

mod read;
mod round_trip;
