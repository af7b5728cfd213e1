use crate::{
    add_native_word,
    lang::code::Opcode,
    runtime::{
        data_structures::arena::{Address, Cell},
        error,
        interpreter::Interpreter,
    },
};

/// Duplicate the top value on the data stack.
///
/// Signature: `value -- value value`
fn word_dup(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.push(value)?;
    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

/// Drop the top value on the data stack.
///
/// Signature: `value -- `
fn word_drop(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let _ = interpreter.pop()?;

    Ok(interpreter.next_ip())
}

/// Swap the top 2 values on the data stack.
///
/// Signature: `a b -- b a`
fn word_swap(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let a = interpreter.pop()?;
    let b = interpreter.pop()?;

    interpreter.push(a)?;
    interpreter.push(b)?;

    Ok(interpreter.next_ip())
}

/// Make a copy of the second value and place it on top.
///
/// Signature: `a b -- a b a`
fn word_over(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(a)?;
    interpreter.push(b)?;
    interpreter.push(a)?;

    Ok(interpreter.next_ip())
}

/// Rotate the third value to the top.
///
/// Signature: `a b c -- b c a`
fn word_rot(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let c = interpreter.pop()?;
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(b)?;
    interpreter.push(c)?;
    interpreter.push(a)?;

    Ok(interpreter.next_ip())
}

/// Copy the value n places down the stack to the top.  `0 PICK` is `DUP`.
///
/// Signature: `... n -- ... value`
fn word_pick(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let index = interpreter.pop()? as usize;
    let value = interpreter.peek(index)?;

    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

/// Get the depth of the data stack before calling this word.
///
/// Signature: ` -- depth`
fn word_depth(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let depth = interpreter.depth() as Cell;

    interpreter.push(depth)?;

    Ok(interpreter.next_ip())
}

/// Move the top of the data stack to the return stack.
///
/// Signature: `value -- ` `R: -- value`
fn word_to_r(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.return_push(value)?;

    Ok(interpreter.next_ip())
}

/// Move the top of the return stack back to the data stack.
///
/// Signature: ` -- value` `R: value -- `
fn word_r_from(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.return_pop()?;

    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

/// Copy the top of the return stack to the data stack.
///
/// Signature: ` -- value` `R: value -- value`
fn word_r_fetch(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.return_peek()?;

    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

pub fn register_stack_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(
        interpreter,
        "DUP",
        Opcode::Dup,
        word_dup,
        "Duplicate the top value on the data stack.",
        "value -- value value"
    );

    add_native_word!(
        interpreter,
        "DROP",
        Opcode::Drop,
        word_drop,
        "Discard the top value on the data stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "SWAP",
        Opcode::Swap,
        word_swap,
        "Swap the top 2 values on the data stack.",
        "a b -- b a"
    );

    add_native_word!(
        interpreter,
        "OVER",
        Opcode::Over,
        word_over,
        "Copy the second value to the top of the stack.",
        "a b -- a b a"
    );

    add_native_word!(
        interpreter,
        "ROT",
        Opcode::Rot,
        word_rot,
        "Rotate the third value to the top of the stack.",
        "a b c -- b c a"
    );

    add_native_word!(
        interpreter,
        "PICK",
        Opcode::Pick,
        word_pick,
        "Copy the value n places down the stack to the top.",
        "... n -- ... value"
    );

    add_native_word!(
        interpreter,
        "DEPTH",
        Opcode::Depth,
        word_depth,
        "Get the depth of the stack before calling this word.",
        " -- depth"
    );

    add_native_word!(
        interpreter,
        ">R",
        Opcode::ToR,
        word_to_r,
        "Move the top value over to the return stack.",
        "value -- "
    );

    add_native_word!(
        interpreter,
        "R>",
        Opcode::RFrom,
        word_r_from,
        "Move the top of the return stack back to the data stack.",
        " -- value"
    );

    add_native_word!(
        interpreter,
        "R@",
        Opcode::RFetch,
        word_r_fetch,
        "Copy the top of the return stack to the data stack.",
        " -- value"
    );

    Ok(())
}
