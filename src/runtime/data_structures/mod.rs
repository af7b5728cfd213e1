/// The flat 64K block of memory all of the interpreter's state lives in, along with the addresses
/// of the system variables.
pub mod arena;

/// Stacks carved out of the top of the arena.
pub mod stack;

/// The dictionary is a linked list of word headers stored inside the arena.
pub mod dictionary;
