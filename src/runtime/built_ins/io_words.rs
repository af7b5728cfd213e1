use crate::{
    add_native_immediate_word, add_native_word,
    lang::{code::Opcode, number::format_number},
    runtime::{
        data_structures::arena::Address,
        error::{self, ErrorKind, script_error},
        interpreter::{Interpreter, State},
    },
};

/// Longest string `."` can compile, its length has to fit in a byte.
const MAX_STRING_LENGTH: usize = u8::MAX as usize;

/// Write a character to the output.
///
/// Signature: `character -- `
fn word_emit(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let character = interpreter.pop()? as u8;

    interpreter.output().write_all(&[character])?;

    Ok(interpreter.next_ip())
}

/// Print a signed number in the current base, followed by a space.
///
/// Signature: `value -- `
fn word_dot(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop_signed()?;
    let text = format_number(value as i32, interpreter.base());

    write!(interpreter.output(), "{} ", text)?;

    Ok(interpreter.next_ip())
}

/// Print an unsigned number in the current base, followed by a space.
///
/// Signature: `value -- `
fn word_u_dot(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;
    let text = format_number(value as i32, interpreter.base());

    write!(interpreter.output(), "{} ", text)?;

    Ok(interpreter.next_ip())
}

/// Start a new line of output.
///
/// Signature: ` -- `
fn word_cr(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    writeln!(interpreter.output())?;

    Ok(interpreter.next_ip())
}

/// Write a run of characters from memory.
///
/// Signature: `address count -- `
fn word_type(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let count = interpreter.pop()? as usize;
    let address = interpreter.pop_address()?;
    let text = interpreter.arena().bytes(address, count)?.to_vec();

    interpreter.output().write_all(&text)?;

    Ok(interpreter.next_ip())
}

/// Read the next line of input into the input buffer.  At the end of the input the interpreter
/// stops.
///
/// Signature: ` -- `
fn word_query(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    interpreter.refill()?;

    Ok(interpreter.next_ip())
}

/// How many characters of the input line haven't been parsed yet?
///
/// Signature: ` -- count`
fn word_remain(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let remaining = interpreter.remaining_input();

    interpreter.push(remaining)?;

    Ok(interpreter.next_ip())
}

/// Print the text up to the next `"`, or compile code that prints it.
///
/// Signature: ` -- `
fn word_dot_quote(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let text = interpreter.parse_until(b'"')?;

    if interpreter.state() == State::Interpreting {
        interpreter.output().write_all(&text)?;

        return Ok(interpreter.next_ip());
    }

    if text.len() > MAX_STRING_LENGTH {
        return script_error(
            interpreter,
            ErrorKind::InputOverflow,
            format!(
                "String of {} characters is too long, the limit is {}.",
                text.len(),
                MAX_STRING_LENGTH
            ),
        );
    }

    interpreter.compile_opcode(Opcode::DotQuoteRuntime)?;
    interpreter.c_comma(text.len() as u8)?;

    for byte in text {
        interpreter.c_comma(byte)?;
    }

    interpreter.align_here()?;

    Ok(interpreter.next_ip())
}

/// Skip a comment that runs to the next `)`.
///
/// Signature: ` -- `
fn word_paren(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let _ = interpreter.parse_until(b')')?;

    Ok(interpreter.next_ip())
}

/// Skip the rest of the line.
///
/// Signature: ` -- `
fn word_backslash(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let _ = interpreter.parse_until(b'\n')?;

    Ok(interpreter.next_ip())
}

pub fn register_io_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        "EMIT",
        Opcode::Emit,
        word_emit,
        "Write a character to the output.",
        "character -- "
    );

    add_native_word!(
        interpreter,
        ".",
        Opcode::Dot,
        word_dot,
        "Print a signed number in the current base.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "U.",
        Opcode::UDot,
        word_u_dot,
        "Print an unsigned number in the current base.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "CR",
        Opcode::Cr,
        word_cr,
        "Start a new line of output.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "TYPE",
        Opcode::Type,
        word_type,
        "Write a run of characters from memory.",
        "address count -- "
    );

    add_native_word!(
        interpreter,
        "QUERY",
        Opcode::Query,
        word_query,
        "Read the next line of input.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "(REMAIN)",
        Opcode::Remain,
        word_remain,
        "How many input characters are left to parse.",
        " -- count"
    );

    add_native_immediate_word!(
        interpreter,
        ".\"",
        Opcode::DotQuote,
        word_dot_quote,
        "Print the following text, or compile code that prints it.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "(",
        Opcode::Paren,
        word_paren,
        "Skip a comment up to the closing parenthesis.",
        " -- "
    );

    add_native_immediate_word!(
        interpreter,
        "\\",
        Opcode::Backslash,
        word_backslash,
        "Skip the rest of the line.",
        " -- "
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::arena::SignedCell;

    #[test]
    fn unsigned_values_print_without_sign() {
        let value: SignedCell = -1;

        assert_eq!(format_number(value as u16 as i32, 10), "65535");
        assert_eq!(format_number(value as i32, 10), "-1");
    }
}
