#![allow(dead_code)]

use cf_forth::runtime::{
    config::Config,
    error::Result,
    interpreter::{
        InterpreterStack, Interpreter, bootstrap::start_system,
        forth_interpreter::ForthInterpreter,
    },
};
use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

/// Output sink the tests can read back after the interpreter has written to it.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).to_string()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A fully bootstrapped system with the prompt off and its output captured.
pub fn new_system_with(config: Config) -> (ForthInterpreter, SharedBuffer) {
    let mut interpreter = start_system(config).expect("The system should bootstrap.");
    let output = SharedBuffer::default();

    interpreter.set_output(Box::new(output.clone()));

    (interpreter, output)
}

pub fn new_system() -> (ForthInterpreter, SharedBuffer) {
    new_system_with(Config {
        prompt: false,
        ..Config::default()
    })
}

/// The data stack as signed numbers, bottom first.
pub fn signed_stack(interpreter: &ForthInterpreter) -> Vec<i16> {
    interpreter
        .stack()
        .iter()
        .map(|value| *value as i16)
        .collect()
}

/// Run some code on a fresh system after pushing the initial values, and return the stack.
pub fn eval_and_stack(code: &str, init_stack: &[i16]) -> Result<Vec<i16>> {
    let (mut interpreter, _) = new_system();

    for &value in init_stack {
        interpreter.push(value as u16)?;
    }

    interpreter.evaluate(code)?;

    Ok(signed_stack(&interpreter))
}

/// Run some code on a fresh system and return everything it printed.
pub fn eval_and_output(code: &str) -> Result<String> {
    let (mut interpreter, output) = new_system();

    interpreter.evaluate(code)?;

    Ok(output.text())
}
