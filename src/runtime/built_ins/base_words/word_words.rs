use crate::{
    add_native_word,
    lang::{
        code::{Opcode, decompile},
        number::parse_number,
    },
    runtime::{
        data_structures::{
            arena::Address,
            dictionary::{Dictionary, WordFlags},
        },
        error::{self, ErrorKind, script_error},
        interpreter::Interpreter,
    },
};

/// Parse the next blank delimited token from the input as the name of a word.  Running out of
/// input is a `MissingName` error.
pub fn parse_name(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<Vec<u8>> {
    interpreter.parse_word(b' ')?;

    let name = interpreter.token();

    if name.is_empty() {
        return script_error(
            interpreter,
            ErrorKind::MissingName,
            format!("{} expected a name to follow it.", word),
        );
    }

    Ok(name)
}

/// Parse a name and look it up.  Unknown names are unresolved token errors.
fn parse_and_find(interpreter: &mut dyn Interpreter, word: &str) -> error::Result<Address> {
    let name = parse_name(interpreter, word)?;

    match interpreter.find(&name) {
        Some(xt) => Ok(xt),
        None => script_error(
            interpreter,
            ErrorKind::UnresolvedToken,
            format!("Word {} not found.", String::from_utf8_lossy(&name)),
        ),
    }
}

/// Parse the next token from the input into the word buffer.
///
/// Signature: `delimiter -- address`
fn word_word(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let delimiter = interpreter.pop()? as u8;
    let buffer = interpreter.parse_word(delimiter)?;

    interpreter.push(buffer.into())?;

    Ok(interpreter.next_ip())
}

/// Parse the next blank delimited token and look it up.  Zero if it isn't a visible word, or if
/// the input is used up.
///
/// Signature: ` -- xt | 0`
fn word_find(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    interpreter.parse_word(b' ')?;

    let token = interpreter.token();
    let xt = interpreter.find(&token).unwrap_or_default();

    interpreter.push(xt.into())?;

    Ok(interpreter.next_ip())
}

/// Try to convert a counted string to a number in the current base.
///
/// Signature: `address -- value 1 | address 0`
fn word_number(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let text = interpreter.arena().counted_string(address)?;

    match parse_number(&text, interpreter.base()) {
        Some(value) => {
            interpreter.push(value)?;
            interpreter.push(1)?;
        }

        None => {
            interpreter.push(address.into())?;
            interpreter.push(0)?;
        }
    }

    Ok(interpreter.next_ip())
}

/// Is the word immediate?
///
/// Signature: `xt -- flag`
fn word_query_immediate(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let xt = interpreter.pop_address()?;

    if !interpreter.is_entry(xt) {
        return script_error(
            interpreter,
            ErrorKind::InvalidExecutionToken,
            format!("{} is not the address of a word.", xt),
        );
    }

    let immediate = interpreter.entry(xt)?.is_immediate();

    interpreter.push_flag(immediate)?;

    Ok(interpreter.next_ip())
}

/// Parse a name and push its execution token.
///
/// Signature: ` -- xt`
fn word_tick(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let xt = parse_and_find(interpreter, "'")?;

    interpreter.push(xt.into())?;

    Ok(interpreter.next_ip())
}

/// Report a token that is neither a word nor a number.
///
/// Signature: `address -- `
fn word_unresolved(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let token = interpreter.arena().counted_string(address)?;

    script_error(
        interpreter,
        ErrorKind::UnresolvedToken,
        format!("Unknown word {}.", String::from_utf8_lossy(&token)),
    )
}

/// Print how many words are visible followed by their names, newest first.
///
/// Signature: ` -- `
fn word_words(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let listing = Dictionary::new(interpreter.arena()).to_string();

    writeln!(interpreter.output(), "{}", listing)?;

    Ok(interpreter.next_ip())
}

/// Print a listing of a word.
///
/// Signature: ` -- `
fn word_see(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let xt = parse_and_find(interpreter, "SEE")?;
    let listing = decompile(interpreter, xt)?;

    write!(interpreter.output(), "{}", listing)?;

    Ok(interpreter.next_ip())
}

/// Print the description and stack signature of a native word.
///
/// Signature: ` -- `
fn word_help(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let xt = parse_and_find(interpreter, "HELP")?;
    let entry = interpreter.entry(xt)?;

    let text = if entry.flags.contains(WordFlags::MACHINE_CODE) {
        let info = interpreter.handler_info(entry.code_field);

        format!(
            "{}  ( {} )\n    {}\n",
            entry.name_str(),
            info.signature().trim(),
            info.description()
        )
    } else {
        match Opcode::from_cell(entry.code_field) {
            Some(Opcode::Enter) => format!(
                "{} is a colon definition, use SEE {} to list it.\n",
                entry.name_str(),
                entry.name_str()
            ),
            _ => format!("{} is a defined data word.\n", entry.name_str()),
        }
    };

    write!(interpreter.output(), "{}", text)?;

    Ok(interpreter.next_ip())
}

pub fn register_word_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        "WORD",
        Opcode::Word,
        word_word,
        "Parse the next token into the word buffer.",
        "delimiter -- address"
    );

    add_native_word!(
        interpreter,
        "FIND",
        Opcode::Find,
        word_find,
        "Parse the next token and look it up, zero if not found.",
        " -- xt | 0"
    );

    add_native_word!(
        interpreter,
        "(NUMBER)",
        Opcode::Number,
        word_number,
        "Convert a counted string to a number in the current base.",
        "address -- value 1 | address 0"
    );

    add_native_word!(
        interpreter,
        "?IMMEDIATE",
        Opcode::QueryImmediate,
        word_query_immediate,
        "Is the word immediate?",
        "xt -- flag"
    );

    add_native_word!(
        interpreter,
        "'",
        Opcode::Tick,
        word_tick,
        "Parse a name and push its execution token.",
        " -- xt"
    );

    add_native_word!(
        interpreter,
        "(UNRESOLVED)",
        Opcode::Unresolved,
        word_unresolved,
        "Abort because a token is neither a word nor a number.",
        "address -- "
    );

    add_native_word!(
        interpreter,
        "WORDS",
        Opcode::Words,
        word_words,
        "List every visible word.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "SEE",
        Opcode::See,
        word_see,
        "List the definition of the following word.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "HELP",
        Opcode::Help,
        word_help,
        "Describe the following word.",
        " -- "
    );

    Ok(())
}
