// Whole scripts run through `interact`, the way the command line runs files and the terminal.

mod common;

use cf_forth::{
    lang::source_buffer::{LineSource, ScriptLines, SourceLocation},
    runtime::{
        config::Config,
        interpreter::{Interpreter, InterpreterStack, WordManagement},
    },
};
use common::{new_system, new_system_with, signed_stack};
use std::{collections::VecDeque, io};

/// Lines that claim to be typed by a person.
struct TypedLines {
    lines: VecDeque<String>,
    location: SourceLocation,
}

impl TypedLines {
    fn new(lines: &[&str]) -> TypedLines {
        TypedLines {
            lines: lines.iter().map(|line| line.to_string()).collect(),
            location: SourceLocation::new_from_path("<typed>"),
        }
    }
}

impl LineSource for TypedLines {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn location(&self) -> SourceLocation {
        self.location.clone()
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

fn script(source: &str) -> Box<dyn LineSource> {
    Box::new(ScriptLines::from_source("<test>", source))
}

#[test]
fn script_runs_every_line() {
    let (mut interpreter, output) = new_system();

    interpreter
        .interact(script(": SQUARE DUP * ;\n3 SQUARE .\n4 SQUARE ."))
        .unwrap();

    assert_eq!(output.text(), "9 16 ");
    assert!(!interpreter.exit_requested());
}

#[test]
fn errors_do_not_stop_later_lines() {
    let (mut interpreter, output) = new_system();

    interpreter
        .interact(script("1 .\nNOSUCHWORD 5\n: BROKEN 1 0 / ;\nBROKEN\n2 ."))
        .unwrap();

    assert_eq!(output.text(), "1 2 ");
    assert_eq!(interpreter.depth(), 0);
    assert!(interpreter.find(b"BROKEN").is_some());
}

#[test]
fn definitions_carry_across_lines() {
    let (mut interpreter, _) = new_system();

    interpreter
        .interact(script(": COUNT-UP\n  0 BEGIN 1+ DUP 3 =\n  UNTIL\n;\nCOUNT-UP"))
        .unwrap();

    assert_eq!(signed_stack(&interpreter), vec![3]);
}

#[test]
fn bye_stops_the_script() {
    let (mut interpreter, output) = new_system();

    interpreter.interact(script("1 .\nBYE\n2 .")).unwrap();

    assert_eq!(output.text(), "1 ");
    assert!(interpreter.exit_requested());
}

#[test]
fn interpreter_can_be_reused_after_a_script() {
    let (mut interpreter, output) = new_system();

    interpreter.interact(script(": SEVEN 7 ;")).unwrap();
    interpreter.evaluate("SEVEN .").unwrap();

    assert_eq!(output.text(), "7 ");
}

#[test]
fn query_reads_the_next_line() {
    let (mut interpreter, _) = new_system();

    interpreter
        .interact(script("QUERY\n1 2\n(REMAIN) DROP QUERY"))
        .unwrap();

    assert_eq!(signed_stack(&interpreter), vec![1, 2]);
}

#[test]
fn interactive_input_gets_a_prompt() {
    let (mut interpreter, output) = new_system_with(Config::default());

    interpreter
        .interact(Box::new(TypedLines::new(&["1 2 + .", ": X", "1 ;"])))
        .unwrap();

    // No prompt while a definition is still open.
    assert_eq!(output.text(), " ok\n3  ok\n ok\n");
}

#[test]
fn scripts_are_not_prompted() {
    let (mut interpreter, output) = new_system_with(Config::default());

    interpreter.interact(script("1 2 + .")).unwrap();

    assert_eq!(output.text(), "3 ");
}

#[test]
fn disabled_prompt() {
    let (mut interpreter, output) = new_system();

    interpreter
        .interact(Box::new(TypedLines::new(&["1 2 + ."])))
        .unwrap();

    assert_eq!(output.text(), "3 ");
}
