use cf_forth::{
    lang::source_buffer::{LineSource, ScriptLines, StdinLines},
    runtime::{
        config::Config,
        error::{self, ErrorKind, ScriptError},
        interpreter::bootstrap::start_system,
    },
};
use std::env::args;

/// Open a Forth source file, naming the file if that fails.
fn open_script(path: &str) -> error::Result<Box<dyn LineSource>> {
    match ScriptLines::from_file(path) {
        Ok(source) => Ok(Box::new(source)),
        Err(err) => ScriptError::new_as_result(
            ErrorKind::Io,
            format!("Could not read {}: {}", path, err),
        ),
    }
}

fn main() -> error::Result<()> {
    // Stack sizes and the prompt can be changed from the environment.
    let config = Config::from_env()?;
    let prelude_path = config.prelude_path.clone();

    // Create the interpreter, register the native words and let the system compile the rest of
    // itself.
    let mut interpreter = start_system(config)?;

    // An extra start up file runs before anything the user types.
    if let Some(path) = prelude_path {
        interpreter.interact(open_script(&path)?)?;

        if interpreter.exit_requested() {
            return Ok(());
        }
    }

    // With an argument run that script, otherwise read from the terminal until BYE or the end of
    // the input.
    let args: Vec<String> = args().collect();

    if args.len() >= 2 {
        interpreter.interact(open_script(&args[1])?)?;
    } else {
        interpreter.interact(Box::new(StdinLines::new()))?;
    }

    // Looks like everything went well.
    Ok(())
}
