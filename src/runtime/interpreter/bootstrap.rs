use crate::{
    lang::{
        code::Opcode,
        forth_source::{OUTER_INTERPRETER, OUTER_INTERPRETER_NAME, PRELUDE},
        number::parse_number,
    },
    runtime::{
        built_ins::register_builtin_words,
        config::Config,
        error::{self, ErrorKind, ScriptError},
        interpreter::{Interpreter, State, forth_interpreter::ForthInterpreter},
    },
};
use tracing::info;

/// Create an interpreter, register the native words and run both bootstrap stages.  The result
/// is ready to `interact` with or `evaluate` source.
pub fn start_system(config: Config) -> error::Result<ForthInterpreter> {
    let mut interpreter = ForthInterpreter::with_config(config)?;

    register_builtin_words(&mut interpreter)?;
    bootstrap(&mut interpreter)?;

    Ok(interpreter)
}

/// Bring a freshly registered interpreter up to a usable state.
///
/// The native words must already be registered.  First a minimal interpreter written in Rust
/// compiles the Forth outer interpreter.  That then becomes the place the system restarts from
/// after an error, and compiles the rest of the standard words itself.
pub fn bootstrap(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    info!("compiling the outer interpreter");

    for line in OUTER_INTERPRETER.lines() {
        mini_interpret(interpreter, line)?;
    }

    if interpreter.state() != State::Interpreting || interpreter.control_depth() != 0 {
        return bootstrap_error(format!(
            "{} was left unfinished.",
            OUTER_INTERPRETER_NAME
        ));
    }

    let xt = interpreter
        .find(OUTER_INTERPRETER_NAME.as_bytes())
        .ok_or_else(|| {
            ScriptError::new(
                ErrorKind::Bootstrap,
                format!("{} was not defined.", OUTER_INTERPRETER_NAME),
            )
        })?;

    let recovery = interpreter.entry(xt)?.parameter_field();
    interpreter.set_recovery_address(recovery);

    info!(%recovery, "compiling the prelude");

    interpreter.evaluate(PRELUDE).map_err(|error| {
        ScriptError::new(
            ErrorKind::Bootstrap,
            format!("The prelude failed to compile: {}", error),
        )
    })
}

/// Interpret or compile one line of source without any help from Forth code.
///
/// Only the essentials are handled: words run when interpreting or when they're immediate and are
/// compiled otherwise, numbers become literals.  Anything else stops the bootstrap.  Only native
/// words can be run, there is no inner interpreter yet to run colon definitions with.
pub fn mini_interpret(interpreter: &mut dyn Interpreter, line: &str) -> error::Result<()> {
    interpreter.paste_code(line)?;

    loop {
        interpreter.parse_word(b' ')?;

        let token = interpreter.token();

        if token.is_empty() {
            return Ok(());
        }

        match interpreter.find(&token) {
            Some(xt) => {
                let entry = interpreter.entry(xt)?;

                if interpreter.state() == State::Interpreting || entry.is_immediate() {
                    if Opcode::from_cell(entry.code_field) == Some(Opcode::Enter) {
                        return bootstrap_error(format!(
                            "{} is a colon definition and can't run yet.",
                            entry.name_str()
                        ));
                    }

                    interpreter.execute_xt(xt)?;
                } else {
                    interpreter.comma(xt.into())?;
                }
            }

            None => {
                let Some(value) = parse_number(&token, interpreter.base()) else {
                    return bootstrap_error(format!(
                        "Unknown word {} while bootstrapping.",
                        String::from_utf8_lossy(&token)
                    ));
                };

                if interpreter.state() == State::Compiling {
                    interpreter.compile_literal(value)?;
                } else {
                    interpreter.push(value)?;
                }
            }
        }
    }
}

fn bootstrap_error<T>(message: String) -> error::Result<T> {
    ScriptError::new_as_result(ErrorKind::Bootstrap, message)
}
