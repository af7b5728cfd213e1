use crate::{
    lang::{code::Opcode, source_buffer::SourceLocation},
    runtime::{
        config::Config,
        data_structures::{
            arena::{Address, Arena, Cell, FALSE, SignedCell, TRUE},
            dictionary::{DictionaryEntry, WordFlags},
        },
        error::{self, ErrorKind, ScriptError},
    },
};
use std::io::Write;

pub mod forth_interpreter;

/// Stage one of start up: the native interpreter that compiles the Forth outer interpreter.
pub mod bootstrap;

/// Whether the outer interpreter is running or compiling words.  Stored in the arena as the
/// `STATE` variable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Interpreting,
    Compiling,
}

impl State {
    pub fn from_cell(value: Cell) -> State {
        if value == 0 {
            State::Interpreting
        } else {
            State::Compiling
        }
    }

    pub fn cell(&self) -> Cell {
        match self {
            State::Interpreting => 0,
            State::Compiling => 1,
        }
    }
}

/// Trait for managing the interpreter's stacks.  All three stacks live inside the arena, these
/// functions are the only way words touch them.
pub trait InterpreterStack {
    /// Use to examine the full data stack when required.  One example is for the stack dump command
    /// `.S`.  The values are listed bottom first.
    fn stack(&self) -> Vec<Cell>;

    /// How many values are on the data stack?
    fn depth(&self) -> usize;

    /// Push a cell onto the data stack.  Fails if the stack is full.
    fn push(&mut self, value: Cell) -> error::Result<()>;

    /// Pop a cell from the data stack.  If the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Cell>;

    /// Read a data stack value without removing it, zero being the top.
    fn peek(&self, index: usize) -> error::Result<Cell>;

    /// Push a signed number.
    fn push_signed(&mut self, value: SignedCell) -> error::Result<()> {
        self.push(value as Cell)
    }

    /// Pop the top value as a signed number.
    fn pop_signed(&mut self) -> error::Result<SignedCell> {
        Ok(self.pop()? as SignedCell)
    }

    /// Push a well formed flag, all bits set for true.
    fn push_flag(&mut self, flag: bool) -> error::Result<()> {
        self.push(if flag { TRUE } else { FALSE })
    }

    /// Pop the top value, any non-zero value is true.
    fn pop_flag(&mut self) -> error::Result<bool> {
        Ok(self.pop()? != FALSE)
    }

    /// Pop the top value and treat it as an address.
    fn pop_address(&mut self) -> error::Result<Address> {
        Ok(Address::from(self.pop()?))
    }

    /// Push a return address, or a value parked with `>R`.
    fn return_push(&mut self, value: Cell) -> error::Result<()>;

    fn return_pop(&mut self) -> error::Result<Cell>;

    fn return_peek(&self) -> error::Result<Cell>;

    fn return_depth(&self) -> usize;

    /// Push an address onto the control stack used while compiling control structures.
    fn control_push(&mut self, value: Cell) -> error::Result<()>;

    /// Pop from the control stack.  Running dry means the control structures don't balance.
    fn control_pop(&mut self) -> error::Result<Cell>;

    fn control_depth(&self) -> usize;

    /// Empty all three stacks.
    fn clear_stacks(&mut self);
}

/// Trait for compiling into the dictionary and for managing the incoming source text.
///
/// The compiling functions are mostly used by immediate words while `STATE` is compiling.
pub trait CodeManagement {
    /// The next free byte of dictionary space.
    fn here(&self) -> Address;

    /// Move HERE.  It has to stay between the start of the dictionary and the bottom of the
    /// stacks.
    fn set_here(&mut self, here: Address) -> error::Result<()>;

    /// Append a cell to the dictionary.
    fn comma(&mut self, value: Cell) -> error::Result<()>;

    /// Append a byte to the dictionary.
    fn c_comma(&mut self, value: u8) -> error::Result<()>;

    /// Round HERE up to the next cell boundary.
    fn align_here(&mut self) -> error::Result<()> {
        let here = self.here();
        self.set_here(here.aligned())
    }

    /// Compile the native word for the given opcode into the current definition.  This is how the
    /// compiler refers to pseudo-ops such as `(LIT)` and `(JUMP)`.
    fn compile_opcode(&mut self, opcode: Opcode) -> error::Result<()>;

    /// Compile code that pushes the value when run.
    fn compile_literal(&mut self, value: Cell) -> error::Result<()> {
        self.compile_opcode(Opcode::Lit)?;
        self.comma(value)
    }

    /// Compile a jump with its destination.  Returns the address of the destination cell so it
    /// can be patched later.
    fn compile_jump(&mut self, opcode: Opcode, destination: Address) -> error::Result<Address> {
        self.compile_opcode(opcode)?;

        let operand = self.here();
        self.comma(destination.into())?;

        Ok(operand)
    }

    /// Is the outer interpreter interpreting or compiling?
    fn state(&self) -> State;

    fn set_state(&mut self, state: State);

    /// The current number base.
    fn base(&self) -> Cell;

    /// Replace the contents of the input buffer with a line of text.
    fn paste_code(&mut self, code: &str) -> error::Result<()>;

    /// Throw away whatever is left in the input buffer.
    fn clear_input(&mut self);

    /// Skip leading delimiters and copy the next run of characters into the word buffer as a
    /// counted string.  A blank delimiter matches any white space.  At the end of the input the
    /// word buffer is left empty.  Returns the word buffer's address.
    fn parse_word(&mut self, delimiter: u8) -> error::Result<Address>;

    /// Skip a single blank, then take everything up to the delimiter, consuming the delimiter as
    /// well.  Used for comments and strings.
    fn parse_until(&mut self, delimiter: u8) -> error::Result<Vec<u8>>;

    /// The contents of the word buffer.
    fn token(&self) -> Vec<u8>;

    /// How many input characters remain unparsed?
    fn remaining_input(&self) -> Cell;

    /// Load the next line of source into the input buffer.  Returns false, and stops the inner
    /// interpreter, once there is no more input.
    fn refill(&mut self) -> error::Result<bool>;

    /// Where the line currently in the input buffer came from.
    fn current_location(&self) -> Option<SourceLocation>;
}

/// A native word handler.  Runs the word whose header is the interpreter's current word and
/// returns the address of the next cell the inner interpreter should fetch.
pub type WordHandler = fn(&mut dyn Interpreter) -> error::Result<Address>;

/// Information about a word handler.  Once created it's fields are read-only and accessed by member
/// methods.
#[derive(Clone)]
pub struct WordHandlerInfo {
    name: String,
    opcode: Option<Opcode>,
    handler: WordHandler,
    description: String,
    signature: String,
}

/// Core implementation of WordHandlerInfo's methods.
impl WordHandlerInfo {
    /// Create a new WordHandlerInfo instance.
    pub fn new(
        name: String,
        opcode: Option<Opcode>,
        handler: WordHandler,
        description: String,
        signature: String,
    ) -> WordHandlerInfo {
        WordHandlerInfo {
            name,
            opcode,
            handler,
            description,
            signature,
        }
    }

    /// The handler every unassigned dispatch slot starts with.
    pub fn illegal() -> WordHandlerInfo {
        WordHandlerInfo::new(
            "(ILLEGAL)".to_string(),
            None,
            illegal_instruction,
            "Reached an opcode with no handler.".to_string(),
            String::new(),
        )
    }

    /// The name of the word itself.
    pub fn name(&self) -> &String {
        &self.name
    }

    /// The opcode the handler is installed under, `None` for the illegal instruction handler.
    pub fn opcode(&self) -> Option<Opcode> {
        self.opcode
    }

    /// The Handler function for the word.
    pub fn handler(&self) -> WordHandler {
        self.handler
    }

    /// A simple description of the word.
    pub fn description(&self) -> &String {
        &self.description
    }

    /// The word's stack signature.
    pub fn signature(&self) -> &String {
        &self.signature
    }
}

/// Fatal.  Only a corrupted code field can get us here.
fn illegal_instruction(interpreter: &mut dyn Interpreter) -> error::Result<Address> {
    error::script_error(
        interpreter,
        ErrorKind::IllegalOpcode,
        format!("Illegal instruction in word at {}.", interpreter.current_word()),
    )
}

/// Simplify registering a native regular word with the interpreter.
///
/// Required parameters are, the interpreter instance to register with.  The name of the word to
/// register.  The opcode the word dispatches on.  The word function handler to execute for the
/// word.  A simple description of the word.  As well as the word's stack signature.
#[macro_export]
macro_rules! add_native_word {
    (
        $interpreter:expr ,
        $name:expr ,
        $opcode:expr ,
        $function:expr ,
        $description:expr ,
        $signature:expr
    ) => {{
        // Import the necessary items for the macro to work.
        use $crate::runtime::data_structures::dictionary::WordFlags;

        $interpreter.add_native_word(
            $name,                    // Name.
            $opcode,                  // Dispatch slot.
            $function,                // Function handler.
            WordFlags::empty(),       // Runs when it's executed.
            $description.to_string(), // Word description.
            $signature.to_string(),   // Word signature.
        )?;
    }};
}

/// Simplify registering a native immediate word with the interpreter.  That is, this word is
/// intended to be executed at compile time.
///
/// Required parameters are, the interpreter instance to register with.  The name of the word to
/// register.  The opcode the word dispatches on.  The word function handler to execute for the
/// word.  A simple description of the word.  As well as the word's stack signature.
#[macro_export]
macro_rules! add_native_immediate_word {
    (
        $interpreter:expr ,
        $name:literal ,
        $opcode:expr ,
        $function:expr ,
        $description:literal ,
        $signature:literal
    ) => {{
        // Import the necessary items for the macro to work.
        use $crate::runtime::data_structures::dictionary::WordFlags;

        $interpreter.add_native_word(
            $name,
            $opcode,
            $function,
            WordFlags::IMMEDIATE, // The word runs at compile time.
            $description.to_string(),
            $signature.to_string(),
        )?;
    }};
}

/// Register a native word that only makes sense while compiling, such as `IF`.  These are both
/// immediate and compile only.
#[macro_export]
macro_rules! add_native_compiler_word {
    (
        $interpreter:expr ,
        $name:literal ,
        $opcode:expr ,
        $function:expr ,
        $description:literal ,
        $signature:literal
    ) => {{
        use $crate::runtime::data_structures::dictionary::WordFlags;

        $interpreter.add_native_word(
            $name,
            $opcode,
            $function,
            WordFlags::IMMEDIATE | WordFlags::COMPILE_ONLY,
            $description.to_string(),
            $signature.to_string(),
        )?;
    }};
}

/// Trait for managing and executing words known to the interpreter.
pub trait WordManagement {
    /// Header address of the newest word.
    fn dict_head(&self) -> Address;

    /// Make a header the newest word.
    fn set_dict_head(&mut self, head: Address);

    /// Write a new header at HERE, linked back to the current head.  HERE moves to the new word's
    /// parameter field.  The head is left alone, call `set_dict_head` to link the word in.
    fn add_entry(&mut self, name: &[u8], opcode: Opcode) -> error::Result<Address>;

    /// Find a visible word by name, newest first.
    fn find(&self, name: &[u8]) -> Option<Address>;

    /// Find the native word for an opcode.
    fn find_by_opcode(&self, opcode: Opcode) -> Option<Address>;

    /// Decode the header at an address.
    fn entry(&self, xt: Address) -> error::Result<DictionaryEntry>;

    /// Is the address the header of a linked word?
    fn is_entry(&self, xt: Address) -> bool;

    /// Every linked word, newest first.
    fn entries(&self) -> Vec<DictionaryEntry>;

    fn set_flags(&mut self, xt: Address, flags: WordFlags) -> error::Result<()>;

    fn set_code_field(&mut self, xt: Address, opcode: Opcode) -> error::Result<()>;

    fn set_does_code(&mut self, xt: Address, code: Address) -> error::Result<()>;

    /// Install a handler in the dispatch table and add a dictionary entry for it.
    fn add_native_word(
        &mut self,
        name: &str,
        opcode: Opcode,
        handler: WordHandler,
        flags: WordFlags,
        description: String,
        signature: String,
    ) -> error::Result<Address>;

    /// Install a handler in the dispatch table only.  Used for the runtimes of colon, created and
    /// `DOES>` words, which are reached through code fields but never by name.
    fn add_native_handler(
        &mut self,
        name: &str,
        opcode: Opcode,
        handler: WordHandler,
        description: String,
    );

    /// The dispatch table entry for a code field value.
    fn handler_info(&self, code_field: Cell) -> &WordHandlerInfo;

    /// Run a word right now, as if it had been found at the current instruction pointer.  Returns
    /// the address the inner interpreter should continue from.
    fn execute_xt(&mut self, xt: Address) -> error::Result<Address>;
}

/// Interpreter trait combining the other interpreter traits.  It adds the inner interpreter and
/// the error recovery.
pub trait Interpreter: InterpreterStack + CodeManagement + WordManagement {
    /// The memory everything lives in.
    fn arena(&self) -> &Arena;

    fn arena_mut(&mut self) -> &mut Arena;

    fn config(&self) -> &Config;

    /// The highest address dictionary space may grow to, just below the stacks.
    fn dictionary_limit(&self) -> Address;

    /// Address of the cell being executed.
    fn ip(&self) -> Address;

    fn set_ip(&mut self, ip: Address);

    /// The header of the word being executed.
    fn current_word(&self) -> Address;

    /// The code field of the word being executed.
    fn current_opcode(&self) -> Cell;

    /// Address of the cell after the current one, where most words continue.
    fn next_ip(&self) -> Address {
        self.ip().next_cell()
    }

    /// Where all user visible output goes.
    fn output(&mut self) -> &mut dyn Write;

    /// Stop the inner interpreter after the current word.
    fn halt(&mut self);

    /// Stop the inner interpreter and ask the host program to exit.
    fn bye(&mut self);

    fn is_running(&self) -> bool;

    /// Where to continue after an abort, the start of the outer interpreter's body.  Until it's
    /// known every error is fatal.
    fn recovery_address(&self) -> Option<Address>;

    fn set_recovery_address(&mut self, address: Address);

    /// Report the error, reset the stacks, the input and the compiler, and prepare to resume at
    /// the recovery address.  Errors without a recovery address are handed back.
    fn abort(&mut self, error: ScriptError) -> error::Result<()>;

    /// Run the inner interpreter until it is halted or a fatal error occurs.
    fn run(&mut self) -> error::Result<()>;

    /// Run some source text through the outer interpreter.  Stops at the first error, which is
    /// returned after the interpreter has recovered from it.
    fn evaluate(&mut self, source: &str) -> error::Result<()>;
}
