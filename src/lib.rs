//! Translator from the Hack VM language to Hack assembly.
//!
//! The pipeline for one source unit is
//!
//! 1. `parser`: VM source text to [`VmCommand`]s
//! 2. `translator`: commands to assembly lines, using `segment` to address
//!    memory and `frame` for the calling convention
//! 3. `module`: units concatenated in order, with an optional bootstrap
//!
//! ```
//! use vmtrans::module::{assemble, Options, Unit};
//!
//! let unit = Unit::new("Main", "push constant 7\npush constant 8\nadd");
//! let lines = assemble(&[unit], &Options::default()).unwrap();
//! assert_eq!(lines[0], "// push constant 7");
//! ```

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

pub mod asm;
pub mod ast;
pub mod error;
pub mod frame;
pub mod module;
pub mod parser;
pub mod segment;
pub mod translator;

#[cfg(test)]
mod emulator;

pub use ast::{Command, Segment, VmCommand};
pub use error::TranslateError;
pub use module::{assemble, Options, Unit};
pub use translator::{LabelScope, Translator};
