use crate::{
    add_native_word,
    lang::code::Opcode,
    runtime::{
        data_structures::arena::{Address, Cell, SignedCell},
        error::{self, ErrorKind, script_error_str},
        interpreter::Interpreter,
    },
};

/// Helper function to handle signed math operations.  The stack operations are handled here, the
/// operation itself is passed in.  Results wrap to 16 bits.
fn math_op(
    interpreter: &mut dyn Interpreter,
    iop: fn(SignedCell, SignedCell) -> SignedCell,
) -> error::Result<Address> {
    let b = interpreter.pop_signed()?;
    let a = interpreter.pop_signed()?;

    interpreter.push_signed(iop(a, b))?;

    Ok(interpreter.next_ip())
}

/// Helper for the division words, which have to check for a zero divisor first.
fn division_op(
    interpreter: &mut dyn Interpreter,
    iop: fn(SignedCell, SignedCell) -> SignedCell,
) -> error::Result<Address> {
    let b = interpreter.pop_signed()?;
    let a = interpreter.pop_signed()?;

    if b == 0 {
        return script_error_str(interpreter, ErrorKind::DivisionByZero, "Division by zero.");
    }

    interpreter.push_signed(iop(a, b))?;

    Ok(interpreter.next_ip())
}

/// Helper for bitwise operations on the raw cells.
fn logic_bit_op(interpreter: &mut dyn Interpreter, bop: fn(Cell, Cell) -> Cell) -> error::Result<Address> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push(bop(a, b))?;

    Ok(interpreter.next_ip())
}

/// Helper for comparisons, which leave a well formed flag.
fn compare_op(
    interpreter: &mut dyn Interpreter,
    cop: fn(Cell, Cell) -> bool,
) -> error::Result<Address> {
    let b = interpreter.pop()?;
    let a = interpreter.pop()?;

    interpreter.push_flag(cop(a, b))?;

    Ok(interpreter.next_ip())
}

/// Add two numbers.
///
/// Signature: `a b -- result`
fn word_add(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    math_op(interpreter, |a, b| a.wrapping_add(b))
}

/// Subtract two numbers.
///
/// Signature: `a b -- result`
fn word_subtract(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    math_op(interpreter, |a, b| a.wrapping_sub(b))
}

/// Multiply two numbers.
///
/// Signature: `a b -- result`
fn word_multiply(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    math_op(interpreter, |a, b| a.wrapping_mul(b))
}

/// Divide two numbers, rounding toward zero.
///
/// Signature: `a b -- result`
fn word_divide(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    division_op(interpreter, |a, b| a.wrapping_div(b))
}

/// Remainder of a division.  Takes the sign of the dividend.
///
/// Signature: `a b -- result`
fn word_mod(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    division_op(interpreter, |a, b| a.wrapping_rem(b))
}

/// Negate a number.
///
/// Signature: `a -- -a`
fn word_negate(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop_signed()?;

    interpreter.push_signed(value.wrapping_neg())?;

    Ok(interpreter.next_ip())
}

/// Are the two values equal?
///
/// Signature: `a b -- flag`
fn word_equal(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    compare_op(interpreter, |a, b| a == b)
}

/// Is a less than b, as signed numbers?
///
/// Signature: `a b -- flag`
fn word_less(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    compare_op(interpreter, |a, b| (a as SignedCell) < (b as SignedCell))
}

/// Is a less than b, as unsigned numbers?
///
/// Signature: `a b -- flag`
fn word_unsigned_less(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    compare_op(interpreter, |a, b| a < b)
}

/// Is the value zero?
///
/// Signature: `a -- flag`
fn word_zero_equal(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.push_flag(value == 0)?;

    Ok(interpreter.next_ip())
}

/// Bitwise and.
///
/// Signature: `a b -- result`
fn word_bit_and(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    logic_bit_op(interpreter, |a, b| a & b)
}

/// Bitwise or.
///
/// Signature: `a b -- result`
fn word_bit_or(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    logic_bit_op(interpreter, |a, b| a | b)
}

/// Bitwise exclusive or.
///
/// Signature: `a b -- result`
fn word_bit_xor(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    logic_bit_op(interpreter, |a, b| a ^ b)
}

/// Flip every bit.
///
/// Signature: `a -- result`
fn word_bit_not(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    let value = interpreter.pop()?;

    interpreter.push(!value)?;

    Ok(interpreter.next_ip())
}

/// Shift left, filling with zeros.  Shifting by 16 or more gives zero.
///
/// Signature: `value amount -- result`
fn word_bit_left_shift(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    logic_bit_op(interpreter, |a, b| a.checked_shl(b as u32).unwrap_or(0))
}

/// Shift right, filling with zeros.  Shifting by 16 or more gives zero.
///
/// Signature: `value amount -- result`
fn word_bit_right_shift(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    logic_bit_op(interpreter, |a, b| a.checked_shr(b as u32).unwrap_or(0))
}

pub fn register_math_logic_and_bit_words(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    add_native_word!(interpreter, "+", Opcode::Add, word_add, "Add 2 numbers.", "a b -- result");

    add_native_word!(
        interpreter,
        "-",
        Opcode::Sub,
        word_subtract,
        "Subtract 2 numbers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "*",
        Opcode::Mul,
        word_multiply,
        "Multiply 2 numbers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "/",
        Opcode::Div,
        word_divide,
        "Divide 2 numbers, rounding toward zero.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "MOD",
        Opcode::Mod,
        word_mod,
        "Remainder of dividing 2 numbers.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "NEG",
        Opcode::Neg,
        word_negate,
        "Negate a number.",
        "a -- -a"
    );

    add_native_word!(
        interpreter,
        "=",
        Opcode::Equal,
        word_equal,
        "Are 2 values equal?",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "LT",
        Opcode::LessThan,
        word_less,
        "Is a less than b?  Signed comparison.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "U<",
        Opcode::ULessThan,
        word_unsigned_less,
        "Is a less than b?  Unsigned comparison.",
        "a b -- flag"
    );

    add_native_word!(
        interpreter,
        "0=",
        Opcode::ZeroEqual,
        word_zero_equal,
        "Is the value zero?",
        "a -- flag"
    );

    add_native_word!(
        interpreter,
        "AND",
        Opcode::And,
        word_bit_and,
        "Bitwise and 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "OR",
        Opcode::Or,
        word_bit_or,
        "Bitwise or 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "XOR",
        Opcode::Xor,
        word_bit_xor,
        "Bitwise exclusive or 2 values.",
        "a b -- result"
    );

    add_native_word!(
        interpreter,
        "INVERT",
        Opcode::Invert,
        word_bit_not,
        "Flip every bit of a value.",
        "a -- result"
    );

    add_native_word!(
        interpreter,
        "LSHIFT",
        Opcode::LShift,
        word_bit_left_shift,
        "Shift a value's bits to the left.",
        "value amount -- result"
    );

    add_native_word!(
        interpreter,
        "RSHIFT",
        Opcode::RShift,
        word_bit_right_shift,
        "Shift a value's bits to the right.",
        "value amount -- result"
    );

    Ok(())
}
