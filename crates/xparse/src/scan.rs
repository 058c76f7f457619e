//! Streaming scanner: modes, entity decoding, and the state machine.

mod entity;
mod scanner;
mod state;

pub use scanner::Scanner;
