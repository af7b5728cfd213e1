use crate::{
    add_native_word,
    lang::code::Opcode,
    runtime::{
        data_structures::arena::{
            Address, Cell, LOC_BASE, LOC_INPUT_COUNT, LOC_LATEST, LOC_STATE, LOC_TO_IN,
            LOC_WORD_BUFFER,
        },
        error,
        interpreter::Interpreter,
    },
};

/// Read a cell from memory.
///
/// Signature: `address -- value`
fn word_fetch(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let value = interpreter.arena().fetch16(address)?;

    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

/// Write a cell to memory.
///
/// Signature: `value address -- `
fn word_store(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let value = interpreter.pop()?;

    interpreter.arena_mut().store16(address, value)?;

    Ok(interpreter.next_ip())
}

/// Read a byte from memory.
///
/// Signature: `address -- byte`
fn word_c_fetch(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let value = interpreter.arena().fetch8(address);

    interpreter.push(value as Cell)?;

    Ok(interpreter.next_ip())
}

/// Write the low byte of a value to memory.
///
/// Signature: `value address -- `
fn word_c_store(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let address = interpreter.pop_address()?;
    let value = interpreter.pop()?;

    interpreter.arena_mut().store8(address, value as u8);

    Ok(interpreter.next_ip())
}

/// Append a cell to the dictionary.
///
/// Signature: `value -- `
fn word_comma(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.comma(value)?;

    Ok(interpreter.next_ip())
}

/// Append a byte to the dictionary.
///
/// Signature: `value -- `
fn word_c_comma(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.c_comma(value as u8)?;

    Ok(interpreter.next_ip())
}

/// Reserve dictionary space.  The count may not be negative.
///
/// Signature: `count -- `
fn word_allot(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let count = interpreter.pop_signed()?;
    let here = interpreter.here();

    // The dictionary only grows, so a negative count is an error.
    if count < 0 {
        return error::script_error(
            interpreter,
            error::ErrorKind::InvalidAddress,
            format!("ALLOT can't give back dictionary space, got {}.", count),
        );
    }

    let new_here = here.offset(count as u16);

    if new_here < here {
        return error::script_error(
            interpreter,
            error::ErrorKind::InvalidAddress,
            format!("Can't ALLOT {} bytes from {}.", count, here),
        );
    }

    interpreter.set_here(new_here)?;

    Ok(interpreter.next_ip())
}

/// Push the address of the next free byte of the dictionary.
///
/// Signature: ` -- address`
fn word_here(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let here = interpreter.here();

    interpreter.push(here.into())?;

    Ok(interpreter.next_ip())
}

/// Round HERE up to a cell boundary.
///
/// Signature: ` -- `
fn word_align(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    interpreter.align_here()?;

    Ok(interpreter.next_ip())
}

fn push_location(interpreter: &mut dyn Interpreter, location: Address) -> error::Result<Address> {
    interpreter.push(location.into())?;

    Ok(interpreter.next_ip())
}

fn word_state(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_STATE)
}

fn word_base(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_BASE)
}

fn word_to_in(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_TO_IN)
}

fn word_input_count(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_INPUT_COUNT)
}

fn word_latest(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_LATEST)
}

fn word_word_buffer(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    push_location(interpreter, LOC_WORD_BUFFER)
}

pub fn register_memory_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        "@",
        Opcode::Fetch,
        word_fetch,
        "Read a cell from memory.",
        "address -- value"
    );

    add_native_word!(
        interpreter,
        "!",
        Opcode::Store,
        word_store,
        "Write a cell to memory.",
        "value address -- "
    );

    add_native_word!(
        interpreter,
        "C@",
        Opcode::CFetch,
        word_c_fetch,
        "Read a byte from memory.",
        "address -- byte"
    );

    add_native_word!(
        interpreter,
        "C!",
        Opcode::CStore,
        word_c_store,
        "Write a byte to memory.",
        "byte address -- "
    );

    add_native_word!(
        interpreter,
        ",",
        Opcode::Comma,
        word_comma,
        "Append a cell to the dictionary.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "C,",
        Opcode::CComma,
        word_c_comma,
        "Append a byte to the dictionary.",
        "byte -- "
    );

    add_native_word!(
        interpreter,
        "ALLOT",
        Opcode::Allot,
        word_allot,
        "Reserve dictionary space.",
        "count -- "
    );

    add_native_word!(
        interpreter,
        "HERE",
        Opcode::Here,
        word_here,
        "The address of the next free byte of the dictionary.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "ALIGN",
        Opcode::Align,
        word_align,
        "Round HERE up to a cell boundary.",
        " -- "
    );

    add_native_word!(
        interpreter,
        "STATE",
        Opcode::State,
        word_state,
        "Address of the compiler state, zero while interpreting.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "BASE",
        Opcode::Base,
        word_base,
        "Address of the current number base.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        ">IN",
        Opcode::ToIn,
        word_to_in,
        "Address of the parse offset into the input buffer.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "#TIB",
        Opcode::InputCount,
        word_input_count,
        "Address of the number of characters in the input buffer.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "LATEST",
        Opcode::Latest,
        word_latest,
        "Address of the newest word's header address.",
        " -- address"
    );

    add_native_word!(
        interpreter,
        "WORDBUFFER",
        Opcode::WordBuffer,
        word_word_buffer,
        "Address of the counted string last parsed by WORD.",
        " -- address"
    );

    Ok(())
}
