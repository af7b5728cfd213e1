use crate::runtime::error::{self, ErrorKind, ScriptError};
use std::env::var;

/// Tunables fixed when the interpreter is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Depth of the data stack, in cells.
    pub data_stack_cells: u16,

    /// Depth of the return stack, in cells.
    pub return_stack_cells: u16,

    /// Depth of the control stack used while compiling, in cells.
    pub control_stack_cells: u16,

    /// Print `ok` before reading each line from an interactive source.
    pub prompt: bool,

    /// A Forth file to run once the system is up, before any user input.
    pub prelude_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_stack_cells: 64,
            return_stack_cells: 64,
            control_stack_cells: 32,
            prompt: true,
            prelude_path: None,
        }
    }
}

/// Together the stacks may take at most half of the arena.
const MAX_STACK_CELLS: u32 = 0x4000;

impl Config {
    /// Start from the defaults and apply any overrides found in the environment.
    ///
    /// * `FF_DATA_STACK`, `FF_RETURN_STACK`, `FF_CONTROL_STACK`: stack depths in cells.
    /// * `FF_PROMPT`: `0` or `off` turns the prompt off.
    /// * `FF_PRELUDE`: path of a Forth file to run at start up.
    pub fn from_env() -> error::Result<Config> {
        let mut config = Config::default();

        if let Some(cells) = stack_size_from_env("FF_DATA_STACK")? {
            config.data_stack_cells = cells;
        }

        if let Some(cells) = stack_size_from_env("FF_RETURN_STACK")? {
            config.return_stack_cells = cells;
        }

        if let Some(cells) = stack_size_from_env("FF_CONTROL_STACK")? {
            config.control_stack_cells = cells;
        }

        if let Ok(prompt) = var("FF_PROMPT") {
            config.prompt = !matches!(prompt.to_ascii_lowercase().as_str(), "0" | "off" | "false");
        }

        if let Ok(path) = var("FF_PRELUDE") {
            config.prelude_path = Some(path);
        }

        config.validate()?;

        Ok(config)
    }

    /// Make sure the stacks leave room for everything else in the arena.
    pub fn validate(&self) -> error::Result<()> {
        let cells = [
            self.data_stack_cells,
            self.return_stack_cells,
            self.control_stack_cells,
        ];

        if cells.contains(&0) {
            return ScriptError::new_as_result(
                ErrorKind::Configuration,
                "Stack depths must be at least one cell.".to_string(),
            );
        }

        let total: u32 = cells.iter().map(|cells| *cells as u32).sum();

        if total > MAX_STACK_CELLS {
            return ScriptError::new_as_result(
                ErrorKind::Configuration,
                format!(
                    "The stacks ask for {} cells, at most {} are available.",
                    total, MAX_STACK_CELLS
                ),
            );
        }

        Ok(())
    }
}

fn stack_size_from_env(name: &str) -> error::Result<Option<u16>> {
    match var(name) {
        Ok(value) => match value.trim().parse::<u16>() {
            Ok(cells) => Ok(Some(cells)),
            Err(_) => ScriptError::new_as_result(
                ErrorKind::Configuration,
                format!("{} should be a number of cells, not {}.", name, value),
            ),
        },

        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn oversized_stacks_are_rejected() {
        let config = Config {
            data_stack_cells: 0x3000,
            return_stack_cells: 0x3000,
            ..Config::default()
        };

        let error = config.validate().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn empty_stacks_are_rejected() {
        let config = Config {
            control_stack_cells: 0,
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }
}
