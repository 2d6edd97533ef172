//! Ahead-of-time lowering of a Kiln program to LLVM textual IR.
//!
//! [`compilation::Compilation`] is the entry point most callers want:
//! `Compilation::compile_file` resolves a module graph, walks every module,
//! and returns the finished IR text.

pub mod compilation;
pub mod emitter;
pub mod error;
pub mod functions;
pub mod logging;
pub mod prelude;
pub mod resolver;
pub mod structs;
pub mod symbols;
pub mod types;
pub mod walker;

pub use compilation::Compilation;
pub use error::CompileError;
