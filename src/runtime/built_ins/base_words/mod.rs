/// Mostly words that are used to change or read the state of the interpreter.
mod system_words;

/// Words that manipulate the data and return stacks.
mod stack_words;

/// Words that read and write memory, and the addresses of the system variables.
mod memory_words;

/// The inner interpreter's pseudo-ops and the words that compile control structures.
mod bytecode_words;

/// Words that work with words.
mod word_words;

/// Words that create new words.
mod word_creation_words;

/// Words that work with math, logic, and bit manipulation.
mod math_logic_and_bit_words;

use crate::runtime::{
    built_ins::base_words::{
        bytecode_words::register_bytecode_words,
        math_logic_and_bit_words::register_math_logic_and_bit_words,
        memory_words::register_memory_words, stack_words::register_stack_words,
        system_words::register_system_words,
        word_creation_words::register_word_creation_words, word_words::register_word_words,
    },
    error,
    interpreter::Interpreter,
};

/// Called to register all of the core words of the language.
pub fn register_base_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    register_bytecode_words(interpreter)?;
    register_system_words(interpreter)?;
    register_stack_words(interpreter)?;
    register_math_logic_and_bit_words(interpreter)?;
    register_memory_words(interpreter)?;
    register_word_words(interpreter)?;
    register_word_creation_words(interpreter)?;

    Ok(())
}
