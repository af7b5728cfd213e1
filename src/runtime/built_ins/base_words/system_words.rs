use crate::{
    add_native_word,
    lang::{code::Opcode, number::format_number},
    runtime::{
        data_structures::{
            arena::{ARENA_SIZE, Address, DICTIONARY_START, SignedCell},
            dictionary::{HEADER_SIZE, MAX_NAME_LENGTH, WordFlags},
        },
        error::{self, ErrorKind, script_error_str},
        interpreter::Interpreter,
    },
};

/// Abort back to the outer interpreter, emptying the stacks.
///
/// Signature: `... -- `
fn word_abort(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    script_error_str(interpreter, ErrorKind::UserAbort, "ABORT")
}

/// Leave the interpreter.
///
/// Signature: ` -- `
fn word_bye(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    interpreter.bye();

    Ok(interpreter.next_ip())
}

/// Print out the current data stack without changing it, bottom first.
///
/// Signature: ` -- `
fn word_print_stack(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let base = interpreter.base();
    let values: Vec<String> = interpreter
        .stack()
        .iter()
        .map(|value| format_number(*value as SignedCell as i32, base))
        .collect();

    let depth = values.len();
    let output = interpreter.output();

    write!(output, "<{}>", depth)?;

    for value in values {
        write!(output, " {}", value)?;
    }

    write!(output, " ")?;

    Ok(interpreter.next_ip())
}

/// Print out how the system's memory is laid out and used.
///
/// Signature: ` -- `
fn word_info(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let here = interpreter.here();
    let limit = interpreter.dictionary_limit();
    let config = interpreter.config().clone();
    let primitives = interpreter
        .entries()
        .iter()
        .filter(|entry| entry.flags.contains(WordFlags::MACHINE_CODE))
        .count();

    let output = interpreter.output();

    writeln!(output, "Memory size:      {} bytes", ARENA_SIZE)?;
    writeln!(output, "Header size:      {} bytes plus the name", HEADER_SIZE)?;
    writeln!(output, "Max name length:  {}", MAX_NAME_LENGTH)?;
    writeln!(
        output,
        "Data space used:  {} of {} bytes",
        here.value() - DICTIONARY_START.value(),
        limit.value() - DICTIONARY_START.value()
    )?;
    writeln!(output, "Data stack:       {} cells", config.data_stack_cells)?;
    writeln!(output, "Return stack:     {} cells", config.return_stack_cells)?;
    writeln!(output, "Control stack:    {} cells", config.control_stack_cells)?;
    writeln!(output, "Primitives:       {}", primitives)?;

    Ok(interpreter.next_ip())
}

pub fn register_system_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        "ABORT",
        Opcode::Abort,
        word_abort,
        "Abort back to the outer interpreter, emptying the stacks.",
        "... -- "
    );

    add_native_word!(
        interpreter,
        "BYE",
        Opcode::Bye,
        word_bye,
        "Leave the interpreter.",
        " -- "
    );

    add_native_word!(
        interpreter,
        ".S",
        Opcode::DotS,
        word_print_stack,
        "Print the data stack without changing it.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "(INFO)",
        Opcode::Info,
        word_info,
        "Print how the system's memory is laid out and used.",
        " -- "
    );

    Ok(())
}
