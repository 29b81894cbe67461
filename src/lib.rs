//! This is the interpreter as a library.  See `src/bin` directory for the
//! executable program using this library.

pub mod common;
pub mod front;
pub mod interp;
