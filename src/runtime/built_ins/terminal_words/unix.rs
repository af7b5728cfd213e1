use lazy_static::lazy_static;
use libc::{
    BRKINT, CS8, ECHO, ICANON, ICRNL, IEXTEN, INPCK, ISIG, ISTRIP, IXON, STDIN_FILENO, TCSAFLUSH,
    isatty, tcgetattr, tcsetattr, termios,
};
use std::{io::Error, mem::zeroed, sync::Mutex};

lazy_static! {
    /// The terminal settings from before raw mode was entered.  `None` while not in raw mode.
    static ref ORIGINAL_TERMIOS: Mutex<Option<termios>> = Mutex::new(None);
}

/// Switch stdin to raw mode.  Returns false, doing nothing, if stdin isn't a terminal or raw mode
/// is already on.
pub fn enter_raw_mode() -> std::io::Result<bool> {
    let mut original = ORIGINAL_TERMIOS
        .lock()
        .map_err(|_| Error::other("Terminal mode lock was poisoned."))?;

    if original.is_some() || unsafe { isatty(STDIN_FILENO) } != 1 {
        return Ok(false);
    }

    let mut settings: termios = unsafe { zeroed() };

    if unsafe { tcgetattr(STDIN_FILENO, &mut settings) } == -1 {
        return Err(Error::last_os_error());
    }

    let mut raw = settings;

    // Output processing is left on so that newlines still return the cursor.
    raw.c_iflag &= !(BRKINT | ICRNL | INPCK | ISTRIP | IXON);
    raw.c_cflag |= CS8;
    raw.c_lflag &= !(ECHO | ICANON | IEXTEN | ISIG);

    if unsafe { tcsetattr(STDIN_FILENO, TCSAFLUSH, &raw) } == -1 {
        return Err(Error::last_os_error());
    }

    *original = Some(settings);

    Ok(true)
}

/// Restore the settings saved by `enter_raw_mode`.
pub fn leave_raw_mode() -> std::io::Result<()> {
    let mut original = ORIGINAL_TERMIOS
        .lock()
        .map_err(|_| Error::other("Terminal mode lock was poisoned."))?;

    if let Some(settings) = original.take()
        && unsafe { tcsetattr(STDIN_FILENO, TCSAFLUSH, &settings) } == -1
    {
        return Err(Error::last_os_error());
    }

    Ok(())
}
