/// The outer interpreter, written using nothing but primitives so that the native bootstrap
/// interpreter can compile it.
pub const OUTER_INTERPRETER: &str = include_str!("../../std/interpret.f");

/// Everything else the system defines for itself once the outer interpreter is running.
pub const PRELUDE: &str = include_str!("../../std/prelude.f");

/// Name of the word holding the outer interpreter.
pub const OUTER_INTERPRETER_NAME: &str = "INTERPRET";
