use std::io::{ stdin, ErrorKind::Interrupted, Read };
use crate::{ add_native_word,
             lang::code::Opcode,
             runtime::{ data_structures::arena::{ Address, Cell },
                        error::{ self, script_error },
                        interpreter::Interpreter } };



#[cfg(windows)]
/// Windows specific versions of the terminal words.
mod windows;

#[cfg(windows)]
use windows::{ enter_raw_mode, leave_raw_mode };



#[cfg(unix)]
/// Unix specific versions of the terminal words.
mod unix;

#[cfg(unix)]
use unix::{ enter_raw_mode, leave_raw_mode };



/// What KEY pushes once stdin is used up.
const END_OF_INPUT: Cell = 0xffff;



/// Read one byte from stdin, retrying if interrupted.  `None` at the end of the input.
fn read_byte() -> std::io::Result<Option<u8>>
{
    let mut buffer = [0; 1];
    let stdin = stdin();
    let mut handle = stdin.lock();

    loop
    {
        match handle.read(&mut buffer)
        {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buffer[0])),
            Err(ref error) if error.kind() == Interrupted => continue,
            Err(error) => return Err(error)
        }
    }
}



/// Read a single key press from the terminal.  Will block until one is available.  When stdin is
/// a terminal it's switched to raw mode for the read, so the key arrives without waiting for
/// enter and isn't echoed.
///
/// Signature: ` -- character`
fn word_key(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    interpreter.output().flush()?;

    let was_raw = match enter_raw_mode()
        {
            Ok(was_raw) => was_raw,
            Err(error) => return script_error(interpreter,
                                              error::ErrorKind::Io,
                                              format!("Could not set terminal mode: {}", error))
        };

    let result = read_byte();

    if was_raw
    {
        if let Err(error) = leave_raw_mode()
        {
            return script_error(interpreter,
                                error::ErrorKind::Io,
                                format!("Could not restore terminal mode: {}", error));
        }
    }

    match result
    {
        Ok(Some(character)) => interpreter.push(character as Cell)?,
        Ok(None) => interpreter.push(END_OF_INPUT)?,
        Err(error) => return script_error(interpreter,
                                          error::ErrorKind::Io,
                                          format!("Failed to read from stdin: {}", error))
    }

    Ok(interpreter.next_ip())
}



/// Register the terminal words with the interpreter.
pub fn register_terminal_words(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    add_native_word!(interpreter, "KEY", Opcode::Key, word_key,
        "Read a key press from the terminal, -1 at the end of the input.",
        " -- character");

    Ok(())
}
