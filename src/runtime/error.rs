
use std::{ error::Error,
           process::Termination,
           fmt::{ self, Debug, Display, Formatter }, process::ExitCode };
use crate::{ lang::{ code::Opcode, source_buffer::SourceLocation },
             runtime::data_structures::{ arena::{ Address, Cell }, stack::StackRole } };

use super::interpreter::Interpreter;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The broad category of an error.  The category decides whether the interpreter can recover by
/// aborting back to the outer interpreter or has to give up entirely.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind
{
    StackOverflow(StackRole),
    StackUnderflow(StackRole),
    UnresolvedToken,
    MalformedNumber,
    IllegalOpcode,
    UnbalancedControlFlow,
    CompileOnly,
    DivisionByZero,
    InvalidAddress,
    InvalidExecutionToken,
    MissingName,
    NameTooLong,
    NestedDefinition,
    InputOverflow,
    UserAbort,
    DictionaryFull,
    Bootstrap,
    Configuration,
    Io
}


impl ErrorKind
{
    /// Fatal errors end the process instead of aborting back to the outer interpreter.
    pub fn is_fatal(&self) -> bool
    {
        matches!(self,
                 ErrorKind::IllegalOpcode
                 | ErrorKind::DictionaryFull
                 | ErrorKind::Bootstrap
                 | ErrorKind::Configuration
                 | ErrorKind::Io)
    }
}



/// Any error that occurs while running Forth code, or while bringing the interpreter up.
#[derive(Clone)]
pub struct ScriptError
{
    /// What kind of failure this was.
    kind: ErrorKind,

    /// The location in the source code the error occurred, if available.
    location: Option<SourceLocation>,

    /// The description of the error.
    error: String,

    /// The instruction pointer at the time of the error, if the inner interpreter was running.
    address: Option<Address>,

    /// The code field of the word that was executing, if any.
    opcode: Option<Cell>
}


impl Error for ScriptError
{
}


/// When returned from main, convert the error result to an operating system exit code.
impl Termination for ScriptError
{
    /// Because this type represents an error, the exit code is always FAILURE.
    fn report(self) -> ExitCode
    {
        eprintln!("Error: {}", self);
        ExitCode::FAILURE
    }
}


/// Pretty print the ScriptError so the user can see what went wrong and where.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.error)?,
            None => write!(f, "{}", self.error)?
        }

        if let Some(opcode) = self.opcode
        {
            match Opcode::from_cell(opcode)
            {
                Some(op) => write!(f, " (opcode {:02x} {}", opcode, op)?,
                None => write!(f, " (opcode {:04x}", opcode)?
            }

            match self.address
            {
                Some(address) => write!(f, " at {})", address)?,
                None => write!(f, ")")?
            }
        }
        else if let Some(address) = self.address
        {
            write!(f, " (at {})", address)?;
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError.
    pub fn new(kind: ErrorKind, error: String) -> ScriptError
    {
        ScriptError
            {
                kind,
                location: None,
                error,
                address: None,
                opcode: None
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(kind: ErrorKind, error: String) -> Result<T>
    {
        Err(ScriptError::new(kind, error))
    }

    /// Record where in the arena the error happened, unless that is already known.
    pub fn at(mut self, address: Address, opcode: Cell) -> ScriptError
    {
        if self.address.is_none()
        {
            self.address = Some(address);
            self.opcode = Some(opcode);
        }

        self
    }

    /// Record which line of source was being processed, unless that is already known.
    pub fn with_location(mut self, location: SourceLocation) -> ScriptError
    {
        if self.location.is_none()
        {
            self.location = Some(location);
        }

        self
    }

    /// What kind of error this was.
    pub fn kind(&self) -> ErrorKind
    {
        self.kind
    }

    /// Can the interpreter carry on after aborting?
    pub fn is_fatal(&self) -> bool
    {
        self.kind.is_fatal()
    }

    /// If available, the location in the source code the error occurred.
    pub fn location(&self) -> &Option<SourceLocation>
    {
        &self.location
    }

    /// The description of the error.
    pub fn error(&self) -> &String
    {
        &self.error
    }

    /// If available, the instruction pointer at the time of the error.
    pub fn address(&self) -> Option<Address>
    {
        self.address
    }

    /// If available, the code field of the word executing at the time of the error.
    pub fn opcode(&self) -> Option<Cell>
    {
        self.opcode
    }
}


/// Allow for the conversion of a std::io::Error into a ScriptError.
impl From<std::io::Error> for ScriptError
{
    fn from(error: std::io::Error) -> ScriptError
    {
        ScriptError::new(ErrorKind::Io, format!("I/O error: {}", error))
    }
}



/// A convenience function for creating a ScriptError and wrapping in in a Result::Err using the
/// interpreter's current position.
pub fn script_error<T>(interpreter: &dyn Interpreter, kind: ErrorKind, message: String) -> Result<T>
{
    let address = interpreter.ip();
    let opcode = interpreter.current_opcode();

    Err(ScriptError::new(kind, message).at(address, opcode))
}



pub fn script_error_str<T>(interpreter: &dyn Interpreter, kind: ErrorKind, message: &str) -> Result<T>
{
    script_error(interpreter, kind, message.to_string())
}
