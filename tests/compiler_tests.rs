// Colon definitions, control structures, defining words and error recovery.

mod common;

use cf_forth::runtime::{
    config::Config,
    data_structures::stack::StackRole,
    error::ErrorKind,
    interpreter::{CodeManagement, Interpreter, InterpreterStack, State, WordManagement},
};
use common::{eval_and_output, eval_and_stack, new_system, new_system_with, signed_stack};
use test_case::test_case;

#[test]
fn colon_definition() {
    assert_eq!(eval_and_stack(": DOUBLE DUP + ; 5 DOUBLE", &[]).unwrap(), vec![10]);
}

#[test]
fn definitions_can_span_lines() {
    let result = eval_and_stack(": SQUARE\n  DUP *\n;\n4 SQUARE", &[]).unwrap();

    assert_eq!(result, vec![16]);
}

#[test]
fn conditional_negation() {
    let result = eval_and_stack(": ABS DUP 0 LT IF NEG THEN ; 3 ABS -3 ABS", &[]).unwrap();

    assert_eq!(result, vec![3, 3]);
}

#[test]
fn if_else_then_nests() {
    let code = ": SIGN DUP 0 LT IF DROP -1 ELSE 0 > IF 1 ELSE 0 THEN THEN ;\n\
                -5 SIGN 0 SIGN 7 SIGN";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![-1, 0, 1]);
}

#[test]
fn begin_while_repeat() {
    let code = ": COUNTDOWN BEGIN DUP WHILE DUP 1- REPEAT ; 3 COUNTDOWN";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![3, 2, 1, 0]);
}

#[test]
fn begin_until() {
    let code = ": SUM 0 SWAP BEGIN SWAP OVER + SWAP 1- DUP 0= UNTIL DROP ; 4 SUM";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![10]);
}

#[test]
fn recursion() {
    let code = ": FACT DUP 1 > IF DUP 1- RECURSE * THEN ; 5 FACT";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![120]);
}

#[test]
fn return_stack_inside_a_definition() {
    let code = ": T >R 10 R@ R> + + ; 1 T";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![12]);
}

#[test]
fn newer_definitions_shadow_older_ones() {
    let code = ": FOO 1 ; ' FOO : FOO 2 ; FOO SWAP EXECUTE";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![2, 1]);
}

#[test]
fn words_compiled_earlier_keep_their_meaning() {
    let code = ": ONE 1 ; : TWO ONE ONE + ; : ONE 100 ; TWO";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![2]);
}

#[test]
fn redefining_find_leaves_the_outer_interpreter_alone() {
    let (mut interpreter, _) = new_system();

    interpreter.evaluate(": FIND 0 ;").unwrap();
    interpreter.evaluate("1 2 +").unwrap();

    assert_eq!(signed_stack(&interpreter), vec![3]);
}

#[test]
fn constants_and_variables() {
    let code = "42 CONSTANT ANSWER VARIABLE X 7 X ! ANSWER X @ 1+";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![42, 8]);
}

#[test]
fn plus_store() {
    let code = "VARIABLE Y 5 Y ! 3 Y +! Y @";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![8]);
}

#[test]
fn create_and_allot() {
    let code = "CREATE BUF 4 ALLOT BUF HERE SWAP -";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![4]);
}

#[test]
fn does_gives_created_words_behaviour() {
    let code = ": ADDER CREATE , DOES> @ + ; 10 ADDER ADD10 5 ADD10";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![15]);
}

#[test]
fn immediate_words_run_while_compiling() {
    let code = ": FIVE 5 ; IMMEDIATE : T FIVE ; DEPTH";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![5, 1]);
}

#[test]
fn literal_and_brackets() {
    let code = ": T [ 3 4 + ] LITERAL ; T";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![7]);
}

#[test]
fn hidden_words_are_not_found() {
    let error = eval_and_stack(": SECRET 1 ; HIDDEN SECRET", &[]).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnresolvedToken);
}

#[test]
fn dot_quote_compiles_its_text() {
    let output = eval_and_output(": HELLO .\" Hello, world!\" 1 . ; HELLO").unwrap();

    assert_eq!(output, "Hello, world!1 ");
}

#[test]
fn type_prints_memory() {
    let output = eval_and_output("CREATE MSG 72 C, 105 C, MSG 2 TYPE").unwrap();

    assert_eq!(output, "Hi");
}

#[test]
fn remaining_input() {
    assert_eq!(eval_and_stack("(REMAIN) 1", &[]).unwrap(), vec![2, 1]);
}

#[test]
fn see_lists_a_colon_definition() {
    let output = eval_and_output(": DOUBLE DUP + ; SEE DOUBLE").unwrap();

    assert!(output.starts_with(": DOUBLE\n"), "{}", output);
    assert!(output.contains("DUP\n"), "{}", output);
    assert!(output.contains("+\n"), "{}", output);
    assert!(output.contains("EXIT\n"), "{}", output);
    assert!(output.ends_with(";\n"), "{}", output);
}

#[test]
fn see_shows_literals_and_jumps() {
    let output = eval_and_output(": T IF 1 ELSE 2 THEN ; SEE T").unwrap();

    assert!(output.contains("(JUMP-IF-FALSE) "), "{}", output);
    assert!(output.contains("(JUMP) "), "{}", output);
    assert!(output.contains("(LIT) 1\n"), "{}", output);
    assert!(output.contains("(LIT) 2\n"), "{}", output);
    assert!(output.ends_with(";\n"), "{}", output);
}

#[test]
fn see_describes_native_words() {
    let output = eval_and_output("SEE DUP").unwrap();

    assert_eq!(output, "DUP is native code, opcode 10 DUP.\n");
}

#[test]
fn help_shows_the_signature() {
    let output = eval_and_output("HELP DUP").unwrap();

    assert!(output.starts_with("DUP  ( value -- value value )\n"), "{}", output);
}

#[test]
fn words_lists_the_dictionary() {
    let output = eval_and_output("WORDS").unwrap();

    assert!(output.contains(" words defined.\n"), "{}", output);
    assert!(output.contains("INTERPRET"));
    assert!(output.contains("CONSTANT"));
    assert!(output.ends_with('\n'));
}

#[test]
fn info_describes_memory() {
    let output = eval_and_output("(INFO)").unwrap();

    assert!(output.contains("Memory size:      65536 bytes"), "{}", output);
    assert!(output.contains("Data stack:       64 cells"), "{}", output);
}

#[test_case("1 0 /", ErrorKind::DivisionByZero; "division by zero")]
#[test_case("1 0 MOD", ErrorKind::DivisionByZero; "mod by zero")]
#[test_case("DROP", ErrorKind::StackUnderflow(StackRole::Data); "data stack underflow")]
#[test_case("R>", ErrorKind::StackUnderflow(StackRole::Return); "return stack underflow")]
#[test_case("NOSUCHWORD", ErrorKind::UnresolvedToken; "unknown word")]
#[test_case("' NOSUCHWORD", ErrorKind::UnresolvedToken; "tick of unknown word")]
#[test_case("IF", ErrorKind::CompileOnly; "compile only while interpreting")]
#[test_case(":", ErrorKind::MissingName; "colon without a name")]
#[test_case(": AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA ;", ErrorKind::NameTooLong; "name too long")]
#[test_case(": T IF ;", ErrorKind::UnbalancedControlFlow; "unclosed if")]
#[test_case(": T THEN ;", ErrorKind::UnbalancedControlFlow; "then without if")]
#[test_case(": T AGAIN ;", ErrorKind::UnbalancedControlFlow; "again without begin")]
#[test_case(": T IF BEGIN THEN AGAIN ;", ErrorKind::UnbalancedControlFlow; "then on a loop start")]
#[test_case(": T BEGIN IF AGAIN ;", ErrorKind::UnbalancedControlFlow; "again on an open if")]
#[test_case(": T IF UNTIL ;", ErrorKind::UnbalancedControlFlow; "until on an open if")]
#[test_case(": T IF WHILE REPEAT ;", ErrorKind::UnbalancedControlFlow; "while without begin")]
#[test_case(": T BEGIN 1 THEN ;", ErrorKind::UnbalancedControlFlow; "then on compiled code")]
#[test_case(": DEF : ; IMMEDIATE : T DEF", ErrorKind::NestedDefinition; "nested definition")]
#[test_case("1 EXECUTE", ErrorKind::InvalidExecutionToken; "execute of a non word")]
#[test_case("' (LIT) EXECUTE", ErrorKind::InvalidExecutionToken; "execute of an inline op")]
#[test_case("1 2 ABORT", ErrorKind::UserAbort; "abort")]
#[test_case("-1 @", ErrorKind::InvalidAddress; "fetch past the end of memory")]
#[test_case("-2 ALLOT", ErrorKind::InvalidAddress; "negative allot")]
fn errors_abort(code: &str, kind: ErrorKind) {
    let (mut interpreter, _) = new_system();
    let error = interpreter.evaluate(code).unwrap_err();

    assert_eq!(error.kind(), kind);
    assert!(!error.is_fatal());

    // Everything is back to a clean interpreting state.
    assert_eq!(interpreter.depth(), 0);
    assert_eq!(interpreter.return_depth(), 0);
    assert_eq!(interpreter.control_depth(), 0);
    assert_eq!(interpreter.state(), State::Interpreting);

    interpreter.evaluate("1 2 +").unwrap();
    assert_eq!(signed_stack(&interpreter), vec![3]);
}

#[test]
fn abort_mid_definition_restores_the_dictionary() {
    let (mut interpreter, _) = new_system();

    interpreter.evaluate("1 2").unwrap();

    let head = interpreter.dict_head();
    let here = interpreter.here();
    let error = interpreter
        .evaluate(": BROKEN 1 2 NOSUCHWORD ;")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnresolvedToken);
    assert_eq!(interpreter.dict_head(), head);
    assert!(interpreter.here() >= here);
    assert_eq!(interpreter.find(b"BROKEN"), None);
    assert_eq!(interpreter.depth(), 0);
    assert_eq!(interpreter.state(), State::Interpreting);
}

#[test]
fn misnested_control_flow_is_not_compiled() {
    let (mut interpreter, _) = new_system();
    let head = interpreter.dict_head();
    let error = interpreter
        .evaluate(": T IF BEGIN THEN AGAIN ;")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnbalancedControlFlow);
    assert!(!error.is_fatal());
    assert_eq!(interpreter.dict_head(), head);
    assert_eq!(interpreter.find(b"T"), None);
}

#[test]
fn nested_conditionals_and_loops() {
    let code = ": EVENS 0 SWAP BEGIN DUP WHILE DUP 1 AND 0= IF SWAP 1+ SWAP THEN 1- REPEAT DROP ;\n\
                : DRAIN IF BEGIN 1- DUP 0= UNTIL THEN ;\n\
                5 EVENS 3 -1 DRAIN 3 0 DRAIN";

    assert_eq!(eval_and_stack(code, &[]).unwrap(), vec![2, 0, 3]);
}

#[test]
fn negative_allot_leaves_the_dictionary_alone() {
    let (mut interpreter, _) = new_system();
    let here = interpreter.here();
    let error = interpreter.evaluate("-2000 ALLOT").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidAddress);
    assert!(!error.is_fatal());
    assert_eq!(interpreter.here(), here);

    interpreter.evaluate(": X 1 ; : Y 2 ; X Y 2 3 +").unwrap();
    assert_eq!(signed_stack(&interpreter), vec![1, 2, 5]);
}

#[test]
fn evaluate_stops_at_the_first_error() {
    let (mut interpreter, output) = new_system();
    let error = interpreter.evaluate("1 .\nNOSUCHWORD\n2 .").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnresolvedToken);
    assert_eq!(output.text(), "1 ");
}

#[test]
fn errors_name_their_source() {
    let (mut interpreter, _) = new_system();
    let error = interpreter.evaluate("1 2\nNOSUCHWORD").unwrap_err();

    assert_eq!(error.location().as_ref().map(|location| location.line()), Some(2));
    assert!(error.to_string().contains("NOSUCHWORD"), "{}", error);
}

#[test]
fn data_stack_overflow() {
    let (mut interpreter, _) = new_system_with(Config {
        data_stack_cells: 8,
        prompt: false,
        ..Config::default()
    });

    interpreter.evaluate("1 2 3").unwrap();

    let error = interpreter.evaluate("4 5 6 7 8 9 10").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::StackOverflow(StackRole::Data));
    assert_eq!(interpreter.depth(), 0);
}

#[test]
fn runaway_recursion_overflows_the_return_stack() {
    let (mut interpreter, _) = new_system();
    let error = interpreter.evaluate(": LOOP RECURSE ; LOOP").unwrap_err();

    assert_eq!(error.kind(), ErrorKind::StackOverflow(StackRole::Return));
    assert_eq!(interpreter.return_depth(), 0);
}

#[test]
fn corrupted_code_field_is_fatal() {
    let (mut interpreter, _) = new_system();
    let error = interpreter
        .evaluate(": X ; ' X 4 + 200 SWAP ! X")
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::IllegalOpcode);
    assert!(error.is_fatal());
    assert_eq!(error.opcode(), Some(200));
    assert!(error.address().is_some());
}
