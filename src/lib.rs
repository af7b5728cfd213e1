//! A small self-hosting Forth that lives entirely inside a 64K byte arena.
//!
//! Source text is read a line at a time, split into blank delimited tokens, and each token is
//! either executed or compiled into the dictionary as threaded code.  The outer interpreter is
//! itself Forth code: a tiny native interpreter compiles it during start up and from then on the
//! system compiles everything else by itself.

/// Module for the opcodes, number syntax and Forth source that make up the language.
#[macro_use]
pub mod lang;

/// Module for the runtime and the data structures used by the interpreter.  As well as the
/// interpreter itself.
#[macro_use]
pub mod runtime;
