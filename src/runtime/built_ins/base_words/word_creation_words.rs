use crate::{
    add_native_compiler_word, add_native_word,
    lang::code::Opcode,
    runtime::{
        built_ins::base_words::word_words::parse_name,
        data_structures::{arena::Address, dictionary::WordFlags},
        error::{self, ErrorKind, script_error_str},
        interpreter::{Interpreter, State},
    },
};

/// Apply a change to the flags of the newest word.
fn update_latest_flags(
    interpreter: &mut dyn Interpreter,
    update: fn(&mut WordFlags),
) -> error::Result<Address> {
    let head = interpreter.dict_head();

    if head.is_null() {
        return script_error_str(interpreter, ErrorKind::MissingName, "No word has been defined.");
    }

    let mut flags = interpreter.entry(head)?.flags;

    update(&mut flags);
    interpreter.set_flags(head, flags)?;

    Ok(interpreter.next_ip())
}

/// Start a new colon definition.  The word is linked in straight away so that `RECURSE` and
/// `DOES>` can find it, but stays invisible to searches until `;` finishes it.
///
/// Signature: ` -- `
fn word_colon(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    if interpreter.state() == State::Compiling {
        return script_error_str(
            interpreter,
            ErrorKind::NestedDefinition,
            "Can't start a new definition inside another.",
        );
    }

    let name = parse_name(interpreter, ":")?;
    let xt = interpreter.add_entry(&name, Opcode::Enter)?;

    interpreter.set_flags(xt, WordFlags::DIRTY)?;
    interpreter.set_dict_head(xt);
    interpreter.set_state(State::Compiling);

    Ok(interpreter.next_ip())
}

/// Finish the current colon definition.
///
/// Signature: ` -- `
fn word_semicolon(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    if interpreter.control_depth() != 0 {
        return script_error_str(
            interpreter,
            ErrorKind::UnbalancedControlFlow,
            "A control structure was left open.",
        );
    }

    interpreter.compile_opcode(Opcode::Exit)?;
    update_latest_flags(interpreter, |flags| flags.remove(WordFlags::DIRTY))?;
    interpreter.set_state(State::Interpreting);

    Ok(interpreter.next_ip())
}

/// Create a word that pushes the address of the dictionary space that follows it.
///
/// Signature: ` -- `
fn word_create(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let name = parse_name(interpreter, "CREATE")?;
    let xt = interpreter.add_entry(&name, Opcode::CreateRuntime)?;

    interpreter.set_dict_head(xt);

    Ok(interpreter.next_ip())
}

/// Make the newest word run even while compiling.
///
/// Signature: ` -- `
fn word_immediate(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    update_latest_flags(interpreter, |flags| flags.insert(WordFlags::IMMEDIATE))
}

/// Only allow the newest word inside definitions.
///
/// Signature: ` -- `
fn word_compile_only(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    update_latest_flags(interpreter, |flags| flags.insert(WordFlags::COMPILE_ONLY))
}

/// Hide the newest word from searches, or reveal it again.
///
/// Signature: ` -- `
fn word_hidden(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    update_latest_flags(interpreter, |flags| flags.toggle(WordFlags::HIDDEN))
}

/// Compile a call to the word being defined.
///
/// Signature: ` -- `
fn word_recurse(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let head = interpreter.dict_head();

    interpreter.comma(head.into())?;

    Ok(interpreter.next_ip())
}

/// Compile `(DOES>)`.  The rest of the definition becomes the behaviour of the words the
/// definition creates.
///
/// Signature: ` -- `
fn word_does(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    interpreter.compile_opcode(Opcode::DoesSetup)?;

    Ok(interpreter.next_ip())
}

/// Compile a reference to a word.
///
/// Signature: `xt -- `
fn word_compile_comma(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let xt = interpreter.pop()?;

    interpreter.comma(xt)?;

    Ok(interpreter.next_ip())
}

/// Compile code that pushes a value.
///
/// Signature: `value -- `
fn word_compile_literal(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.compile_literal(value)?;

    Ok(interpreter.next_ip())
}

pub fn register_word_creation_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        ":",
        Opcode::Colon,
        word_colon,
        "Start a new colon definition.",
        " -- "
    );

    add_native_compiler_word!(
        interpreter,
        ";",
        Opcode::SemiColon,
        word_semicolon,
        "Finish the current colon definition.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "CREATE",
        Opcode::Create,
        word_create,
        "Create a word that pushes the address of its data.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "IMMEDIATE",
        Opcode::Immediate,
        word_immediate,
        "Make the newest word run while compiling.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "COMPILE-ONLY",
        Opcode::CompileOnly,
        word_compile_only,
        "Only allow the newest word inside definitions.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "HIDDEN",
        Opcode::Hidden,
        word_hidden,
        "Hide or reveal the newest word.",
        " -- "
    );

    add_native_compiler_word!(
        interpreter,
        "RECURSE",
        Opcode::Recurse,
        word_recurse,
        "Compile a call to the word being defined.",
        " -- "
    );

    add_native_compiler_word!(
        interpreter,
        "DOES>",
        Opcode::Does,
        word_does,
        "Give the words made by this definition the behaviour that follows.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "COMPILE,",
        Opcode::CompileComma,
        word_compile_comma,
        "Compile a reference to a word.",
        "xt -- "
    );

    add_native_word!(
        interpreter,
        "(LITERAL)",
        Opcode::CompileLiteral,
        word_compile_literal,
        "Compile code that pushes the value.",
        "value -- "
    );

    Ok(())
}
