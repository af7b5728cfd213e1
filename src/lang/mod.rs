/// Module for managing where source lines come from and where they were found.
pub mod source_buffer;

/// Module for defining the opcodes of the virtual machine and decompiling threaded code back into
/// a readable listing.
pub mod code;

/// Module for the numeric literal syntax understood by the outer interpreter.
pub mod number;

/// The Forth source text compiled during start up.
pub mod forth_source;
