//! The accumulator machine: instruction set, linear memory, and the
//! fetch-decode-execute loop that interprets a finalized instruction stream.
//!
//! This crate has no notion of source text, declarations, or labels; it
//! only knows how to run [`instructions::Instruction`] sequences that some
//! other crate (the code generator) has already produced and backpatched.

pub mod constants;
pub mod instructions;
pub mod memory;
pub mod processor;

pub use instructions::{Arg, Instruction, Opcode};
pub use memory::{Memory, Storage};
pub use processor::{ExitCode, Outcome, Processor, QueueInput};
