use lazy_static::lazy_static;
use std::{io::Error, sync::Mutex};
use winapi::{
    shared::minwindef::DWORD,
    um::{
        consoleapi::{GetConsoleMode, SetConsoleMode},
        handleapi::INVALID_HANDLE_VALUE,
        processenv::GetStdHandle,
        winbase::STD_INPUT_HANDLE,
        wincon::{ENABLE_ECHO_INPUT, ENABLE_LINE_INPUT, ENABLE_PROCESSED_INPUT},
    },
};

lazy_static! {
    /// The console input mode from before raw mode was entered.  `None` while not in raw mode.
    static ref INPUT_MODE: Mutex<Option<DWORD>> = Mutex::new(None);
}

/// Switch the console input to raw mode.  Returns false, doing nothing, if stdin isn't a console
/// or raw mode is already on.
pub fn enter_raw_mode() -> std::io::Result<bool> {
    let mut saved = INPUT_MODE
        .lock()
        .map_err(|_| Error::other("Console mode lock was poisoned."))?;

    if saved.is_some() {
        return Ok(false);
    }

    unsafe {
        let std_in_handle = GetStdHandle(STD_INPUT_HANDLE);

        if std_in_handle == INVALID_HANDLE_VALUE {
            return Err(Error::last_os_error());
        }

        let mut mode: DWORD = 0;

        // Redirected input has no console mode to change.
        if GetConsoleMode(std_in_handle, &mut mode) == 0 {
            return Ok(false);
        }

        let raw = mode & !(ENABLE_ECHO_INPUT | ENABLE_LINE_INPUT | ENABLE_PROCESSED_INPUT);

        if SetConsoleMode(std_in_handle, raw) == 0 {
            return Err(Error::last_os_error());
        }

        *saved = Some(mode);
    }

    Ok(true)
}

/// Restore the console mode saved by `enter_raw_mode`.
pub fn leave_raw_mode() -> std::io::Result<()> {
    let mut saved = INPUT_MODE
        .lock()
        .map_err(|_| Error::other("Console mode lock was poisoned."))?;

    if let Some(mode) = saved.take() {
        unsafe {
            if SetConsoleMode(GetStdHandle(STD_INPUT_HANDLE), mode) == 0 {
                return Err(Error::last_os_error());
            }
        }
    }

    Ok(())
}
