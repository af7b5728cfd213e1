// Parameterised tests of the primitive and prelude words, run through the outer interpreter.

mod common;

use common::{eval_and_output, eval_and_stack};
use test_case::test_case;

#[test_case("0", &[], &[0]; "zero")]
#[test_case("42", &[], &[42]; "number")]
#[test_case("TRUE", &[], &[-1]; "true word")]
#[test_case("FALSE", &[], &[0]; "false word")]
#[test_case("+", &[2, 2], &[4]; "simple add")]
#[test_case("-", &[5, 2], &[3]; "simple sub")]
#[test_case("*", &[3, 4], &[12]; "simple mul")]
#[test_case("/", &[12, 3], &[4]; "simple div")]
#[test_case("/", &[-7, 2], &[-3]; "division rounds toward zero")]
#[test_case("MOD", &[13, 5], &[3]; "simple mod")]
#[test_case("MOD", &[-7, 2], &[-1]; "mod takes the sign of the dividend")]
#[test_case("+", &[32767, 1], &[-32768]; "addition wraps")]
#[test_case("*", &[256, 256], &[0]; "multiplication wraps")]
#[test_case("NEG", &[9], &[-9]; "neg")]
#[test_case("NEGATE", &[-9], &[9]; "negate negative number")]
#[test_case("1+", &[41], &[42]; "add one")]
#[test_case("1-", &[43], &[42]; "sub one")]
#[test_case("ABS", &[-42], &[42]; "abs")]
#[test_case("ABS", &[9], &[9]; "abs of positive number")]
#[test_case("MIN", &[3, 5], &[3]; "min")]
#[test_case("MAX", &[3, 5], &[5]; "max")]
#[test_case("=", &[5, 5], &[-1]; "equal")]
#[test_case("=", &[5, 4], &[0]; "not equal")]
#[test_case("<>", &[5, 4], &[-1]; "different")]
#[test_case("LT", &[-1, 1], &[-1]; "signed less")]
#[test_case("<", &[2, 1], &[0]; "less is false")]
#[test_case(">", &[4, 3], &[-1]; "greater")]
#[test_case(">", &[1, 1], &[0]; "greater for equal")]
#[test_case("U<", &[-1, 1], &[0]; "unsigned less")]
#[test_case("U<", &[1, -1], &[-1]; "unsigned less is true")]
#[test_case("0=", &[0], &[-1]; "zero equal")]
#[test_case("0=", &[5], &[0]; "is zero for non-zero")]
#[test_case("0<", &[-3], &[-1]; "negative")]
#[test_case("INVERT", &[0], &[-1]; "invert")]
#[test_case("INVERT", &[1], &[-2]; "invert number")]
#[test_case("AND", &[6, 3], &[2]; "and")]
#[test_case("OR", &[6, 3], &[7]; "or")]
#[test_case("XOR", &[6, 3], &[5]; "xor")]
#[test_case("LSHIFT", &[1, 3], &[8]; "left shift")]
#[test_case("RSHIFT", &[-1, 12], &[15]; "right shift is logical")]
#[test_case("LSHIFT", &[1, 16], &[0]; "shifting everything out")]
#[test_case("DUP", &[1], &[1, 1]; "dup")]
#[test_case("DROP", &[1, 2], &[1]; "drop")]
#[test_case("SWAP", &[1, 2], &[2, 1]; "swap")]
#[test_case("OVER", &[1, 2], &[1, 2, 1]; "over")]
#[test_case("ROT", &[1, 2, 3], &[2, 3, 1]; "rot")]
#[test_case("2 PICK", &[1, 2, 3], &[1, 2, 3, 1]; "pick")]
#[test_case("0 PICK", &[1, 2], &[1, 2, 2]; "zero pick is dup")]
#[test_case("DEPTH", &[1, 2], &[1, 2, 2]; "depth")]
#[test_case("NIP", &[1, 2], &[2]; "nip")]
#[test_case("TUCK", &[1, 2], &[2, 1, 2]; "tuck")]
#[test_case("2DUP", &[1, 2], &[1, 2, 1, 2]; "two dup")]
#[test_case("2DROP", &[1, 2, 3], &[1]; "two drop")]
#[test_case("?DUP", &[0], &[0]; "question dup of zero")]
#[test_case("?DUP", &[5], &[5, 5]; "question dup of non-zero")]
#[test_case("CELLS", &[3], &[6]; "cells")]
#[test_case("CELL+", &[100], &[102]; "cell plus")]
#[test_case("2 3 swap", &[], &[3, 2]; "names are case insensitive")]
#[test_case("1 ( a comment ) 2 \\ 3", &[], &[1, 2]; "comments")]
fn word_results(code: &str, init_stack: &[i16], expected: &[i16]) {
    let result = eval_and_stack(code, init_stack).unwrap();

    assert_eq!(result, expected);
}

#[test_case("#133", 133; "decimal prefix")]
#[test_case("$A000", 0xa000_u16 as i16; "hex prefix")]
#[test_case("$a000", 0xa000_u16 as i16; "hex prefix lower case")]
#[test_case("-125", -125; "negative decimal")]
#[test_case("%1110", 14; "binary prefix")]
#[test_case("$-10", -16; "negative hex")]
#[test_case("'A'", 65; "character literal")]
#[test_case("65535", -1; "largest cell")]
fn numeric_literals(token: &str, expected: i16) {
    let result = eval_and_stack(token, &[]).unwrap();

    assert_eq!(result, vec![expected]);
}

#[test_case("12A"; "letter in decimal")]
#[test_case("--125"; "double minus")]
#[test_case("-1-25"; "minus in the middle")]
#[test_case("p"; "not a digit")]
#[test_case("65536"; "too large")]
#[test_case("$"; "prefix without digits")]
#[test_case("#5A"; "bad digit after prefix")]
fn malformed_numbers_are_unresolved(token: &str) {
    let error = eval_and_stack(token, &[]).unwrap_err();

    assert_eq!(
        error.kind(),
        cf_forth::runtime::error::ErrorKind::UnresolvedToken
    );
}

#[test_case("HEX FF DECIMAL", &[255]; "hex base")]
#[test_case("2 BASE ! 1010 DECIMAL", &[10]; "binary base")]
#[test_case("HEX #10 DECIMAL", &[10]; "prefix overrides base")]
#[test_case("HEX -A DECIMAL", &[-10]; "negative in the current base")]
fn number_base(code: &str, expected: &[i16]) {
    assert_eq!(eval_and_stack(code, &[]).unwrap(), expected);
}

#[test_case("1 2 + .", "3 "; "dot")]
#[test_case("-5 .", "-5 "; "dot negative")]
#[test_case("-1 U.", "65535 "; "unsigned dot")]
#[test_case("255 HEX . DECIMAL", "FF "; "dot in hex")]
#[test_case("65 EMIT 66 EMIT", "AB"; "emit")]
#[test_case("CR", "\n"; "carriage return")]
#[test_case("3 SPACES", "   "; "spaces")]
#[test_case("1 2 3 .S", "<3> 1 2 3 "; "print stack")]
#[test_case(".\" Hello, world!\"", "Hello, world!"; "dot quote while interpreting")]
fn printed_output(code: &str, expected: &str) {
    assert_eq!(eval_and_output(code).unwrap(), expected);
}
