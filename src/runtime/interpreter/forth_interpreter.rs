use std::{ io::{ stdout, Write },
           mem::replace };
use tracing::{ debug, trace };
use crate::{ lang::{ code::Opcode,
                     source_buffer::{ LineSource, ScriptLines, SourceLocation, StdinLines } },
             runtime::{ config::Config,
                        data_structures::{ arena::{ Address,
                                                    Arena,
                                                    Cell,
                                                    CELL_SIZE,
                                                    DICTIONARY_START,
                                                    INPUT_BUFFER_SIZE,
                                                    LOC_BASE,
                                                    LOC_HERE,
                                                    LOC_INPUT_BUFFER,
                                                    LOC_INPUT_COUNT,
                                                    LOC_LATEST,
                                                    LOC_STATE,
                                                    LOC_TO_IN,
                                                    LOC_WORD_BUFFER,
                                                    WORD_BUFFER_SIZE },
                                           dictionary::{ read_entry,
                                                         write_entry,
                                                         Dictionary,
                                                         DictionaryEntry,
                                                         WordFlags,
                                                         DE_CODE_FIELD,
                                                         DE_DOES_CODE,
                                                         DE_FLAGS },
                                           stack::{ Stack, StackRole } },
                        error::{ self,
                                 ErrorKind,
                                 ScriptError },
                        interpreter::{ CodeManagement,
                                       Interpreter,
                                       InterpreterStack,
                                       State,
                                       WordHandler,
                                       WordHandlerInfo,
                                       WordManagement } } };



/// Number of slots in the dispatch table, one per possible opcode byte.
pub const DISPATCH_TABLE_SIZE: usize = 256;



/// The core interpreter implementation.  Owns the arena and everything that describes how the
/// arena is being used.
pub struct ForthInterpreter
{
    /// All of the system's memory.
    arena: Arena,

    /// The data stack, the last stack carved out of the arena.
    data_stack: Stack,

    /// Return addresses of the colon definitions being executed.
    return_stack: Stack,

    /// Placeholders and branch destinations of control structures being compiled.
    control_stack: Stack,

    /// The dictionary may grow up to, but not into, this address.
    dictionary_limit: Address,


    /// Native handlers, indexed by opcode.
    handlers: Vec<WordHandlerInfo>,

    /// The instruction pointer, address of the cell being executed.
    ip: Address,

    /// Header of the word being executed.
    current_word: Address,

    /// Cleared to stop the inner interpreter.
    running: bool,

    /// Set by BYE.
    exit_requested: bool,

    /// Where execution resumes after an abort.
    recovery: Option<Address>,


    /// Where new lines of source come from.
    input: Box<dyn LineSource>,

    /// Set while `evaluate` is running some source text.
    evaluating: bool,

    /// The first error raised during an `evaluate`, handed back once the interpreter has stopped.
    pending_error: Option<ScriptError>,

    /// Where user visible output goes.
    output: Box<dyn Write>,

    config: Config
}


impl ForthInterpreter
{
    /// Create an interpreter using the default configuration.  No words exist yet, see the
    /// `register_*_words` functions and `bootstrap`.
    pub fn new() -> ForthInterpreter
    {
        ForthInterpreter::build(Config::default())
    }

    /// Create an interpreter with non-default stack sizes or prompt.
    pub fn with_config(config: Config) -> error::Result<ForthInterpreter>
    {
        config.validate()?;

        Ok(ForthInterpreter::build(config))
    }

    fn build(config: Config) -> ForthInterpreter
    {
        let (return_stack, below) = Stack::carve(StackRole::Return,
                                                 Address::new(0xfffe),
                                                 config.return_stack_cells);
        let (control_stack, below) = Stack::carve(StackRole::Control,
                                                  below,
                                                  config.control_stack_cells);
        let (data_stack, below) = Stack::carve(StackRole::Data, below, config.data_stack_cells);

        let mut interpreter = ForthInterpreter
            {
                arena: Arena::new(),
                data_stack,
                return_stack,
                control_stack,
                dictionary_limit: below,
                handlers: vec![WordHandlerInfo::illegal(); DISPATCH_TABLE_SIZE],
                ip: Address::null(),
                current_word: Address::null(),
                running: false,
                exit_requested: false,
                recovery: None,
                input: Box::new(StdinLines::new()),
                evaluating: false,
                pending_error: None,
                output: Box::new(stdout()),
                config
            };

        interpreter.reset_system_variables();
        interpreter
    }

    fn reset_system_variables(&mut self)
    {
        self.set_variable(LOC_HERE, DICTIONARY_START.into());
        self.set_variable(LOC_STATE, State::Interpreting.cell());
        self.set_variable(LOC_BASE, 10);
        self.set_variable(LOC_LATEST, 0);
        self.clear_input();
    }

    /// Send output somewhere other than stdout.
    pub fn set_output(&mut self, output: Box<dyn Write>)
    {
        self.output = output;
    }

    /// Has BYE been executed?
    pub fn exit_requested(&self) -> bool
    {
        self.exit_requested
    }

    /// Run the outer interpreter over every line of a source, reporting and recovering from
    /// errors as they happen.  Returns once the source is used up, BYE is executed, or a fatal
    /// error occurs.
    pub fn interact(&mut self, source: Box<dyn LineSource>) -> error::Result<()>
    {
        let recovery = self.require_recovery()?;

        self.input = source;
        self.evaluating = false;
        self.restart_at(recovery);

        self.run()
    }

    fn require_recovery(&self) -> error::Result<Address>
    {
        self.recovery.ok_or_else(||
            {
                ScriptError::new(ErrorKind::Bootstrap,
                                 "The outer interpreter hasn't been compiled yet.".to_string())
            })
    }

    fn restart_at(&mut self, address: Address)
    {
        self.clear_input();
        self.return_stack.clear();
        self.ip = address;
    }

    // System variables live at fixed, always valid, addresses.
    fn variable(&self, location: Address) -> Cell
    {
        self.arena.fetch16(location).unwrap_or_default()
    }

    fn set_variable(&mut self, location: Address, value: Cell)
    {
        let _ = self.arena.store16(location, value);
    }

    fn input_byte(&self, index: Cell) -> u8
    {
        self.arena.fetch8(LOC_INPUT_BUFFER.offset(index))
    }

    /// Fetch, decode and run one cell of threaded code.
    fn step(&mut self) -> error::Result<Address>
    {
        let ip = self.ip;
        let xt = self.arena.fetch_address(ip)?;
        let code_field = self.arena.fetch16(xt.offset(DE_CODE_FIELD)).map_err(|error| error.at(ip, 0))?;

        self.current_word = xt;

        let handler = self.handler_info(code_field).handler();

        handler(self).map_err(|error| error.at(ip, code_field))
    }

    fn out_of_space(&self, what: &str) -> ScriptError
    {
        ScriptError::new(ErrorKind::DictionaryFull,
                         format!("Out of dictionary space while {}.", what))
    }
}


impl Default for ForthInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}


impl InterpreterStack for ForthInterpreter
{
    fn stack(&self) -> Vec<Cell>
    {
        self.data_stack.contents(&self.arena)
    }

    fn depth(&self) -> usize
    {
        self.data_stack.depth()
    }

    fn push(&mut self, value: Cell) -> error::Result<()>
    {
        self.data_stack.push(&mut self.arena, value)
    }

    fn pop(&mut self) -> error::Result<Cell>
    {
        self.data_stack.pop(&self.arena)
    }

    fn peek(&self, index: usize) -> error::Result<Cell>
    {
        self.data_stack.peek(&self.arena, index)
    }

    fn return_push(&mut self, value: Cell) -> error::Result<()>
    {
        self.return_stack.push(&mut self.arena, value)
    }

    fn return_pop(&mut self) -> error::Result<Cell>
    {
        self.return_stack.pop(&self.arena)
    }

    fn return_peek(&self) -> error::Result<Cell>
    {
        self.return_stack.peek(&self.arena, 0)
    }

    fn return_depth(&self) -> usize
    {
        self.return_stack.depth()
    }

    fn control_push(&mut self, value: Cell) -> error::Result<()>
    {
        self.control_stack.push(&mut self.arena, value)
    }

    fn control_pop(&mut self) -> error::Result<Cell>
    {
        if self.control_stack.is_empty()
        {
            return ScriptError::new_as_result(ErrorKind::UnbalancedControlFlow,
                                              "Control structure is missing its opening word."
                                                  .to_string());
        }

        self.control_stack.pop(&self.arena)
    }

    fn control_depth(&self) -> usize
    {
        self.control_stack.depth()
    }

    fn clear_stacks(&mut self)
    {
        self.data_stack.clear();
        self.return_stack.clear();
        self.control_stack.clear();
    }
}


impl CodeManagement for ForthInterpreter
{
    fn here(&self) -> Address
    {
        Address::from(self.variable(LOC_HERE))
    }

    fn set_here(&mut self, here: Address) -> error::Result<()>
    {
        if here < DICTIONARY_START
        {
            return ScriptError::new_as_result(ErrorKind::InvalidAddress,
                                              format!("HERE can't move below {}.",
                                                      DICTIONARY_START));
        }

        if here >= self.dictionary_limit
        {
            return Err(self.out_of_space("moving HERE"));
        }

        self.set_variable(LOC_HERE, here.into());
        Ok(())
    }

    fn comma(&mut self, value: Cell) -> error::Result<()>
    {
        let here = self.here();

        if here.value() as u32 + CELL_SIZE as u32 >= self.dictionary_limit.value() as u32
        {
            return Err(self.out_of_space("compiling"));
        }

        self.arena.store16(here, value)?;
        self.set_here(here.next_cell())
    }

    fn c_comma(&mut self, value: u8) -> error::Result<()>
    {
        let here = self.here();

        if here.offset(1) >= self.dictionary_limit
        {
            return Err(self.out_of_space("compiling"));
        }

        self.arena.store8(here, value);
        self.set_here(here.offset(1))
    }

    fn compile_opcode(&mut self, opcode: Opcode) -> error::Result<()>
    {
        match self.find_by_opcode(opcode)
        {
            Some(xt) => self.comma(xt.into()),
            None => ScriptError::new_as_result(ErrorKind::Bootstrap,
                                               format!("No native word implements {}.", opcode))
        }
    }

    fn state(&self) -> State
    {
        State::from_cell(self.variable(LOC_STATE))
    }

    fn set_state(&mut self, state: State)
    {
        self.set_variable(LOC_STATE, state.cell());
    }

    fn base(&self) -> Cell
    {
        self.variable(LOC_BASE)
    }

    fn paste_code(&mut self, code: &str) -> error::Result<()>
    {
        let bytes = code.as_bytes();

        if bytes.len() > INPUT_BUFFER_SIZE as usize
        {
            self.clear_input();

            return ScriptError::new_as_result(ErrorKind::InputOverflow,
                                              format!("Input line is {} characters long, \
                                                       the limit is {}.",
                                                      bytes.len(),
                                                      INPUT_BUFFER_SIZE));
        }

        self.arena.store_bytes(LOC_INPUT_BUFFER, bytes)?;
        self.set_variable(LOC_INPUT_COUNT, bytes.len() as Cell);
        self.set_variable(LOC_TO_IN, 0);

        Ok(())
    }

    fn clear_input(&mut self)
    {
        self.set_variable(LOC_INPUT_COUNT, 0);
        self.set_variable(LOC_TO_IN, 0);
        self.arena.store8(LOC_WORD_BUFFER, 0);
    }

    fn parse_word(&mut self, delimiter: u8) -> error::Result<Address>
    {
        let count = self.variable(LOC_INPUT_COUNT).min(INPUT_BUFFER_SIZE);
        let mut index = self.variable(LOC_TO_IN).min(count);

        let is_delimiter = |character: u8|
            {
                if delimiter == b' '
                {
                    character.is_ascii_whitespace()
                }
                else
                {
                    character == delimiter
                }
            };

        while index < count && is_delimiter(self.input_byte(index))
        {
            index += 1;
        }

        let start = index;

        while index < count && !is_delimiter(self.input_byte(index))
        {
            index += 1;
        }

        let length = (index - start).min(WORD_BUFFER_SIZE - 1);
        let token = self.arena.bytes(LOC_INPUT_BUFFER.offset(start), length as usize)?.to_vec();

        self.arena.store8(LOC_WORD_BUFFER, length as u8);
        self.arena.store_bytes(LOC_WORD_BUFFER.offset(1), &token)?;
        self.set_variable(LOC_TO_IN, index);

        Ok(LOC_WORD_BUFFER)
    }

    fn parse_until(&mut self, delimiter: u8) -> error::Result<Vec<u8>>
    {
        let count = self.variable(LOC_INPUT_COUNT).min(INPUT_BUFFER_SIZE);
        let mut index = self.variable(LOC_TO_IN).min(count);

        if index < count && self.input_byte(index).is_ascii_whitespace()
        {
            index += 1;
        }

        let start = index;

        while index < count && self.input_byte(index) != delimiter
        {
            index += 1;
        }

        let text = self.arena.bytes(LOC_INPUT_BUFFER.offset(start), (index - start) as usize)?.to_vec();

        if index < count
        {
            index += 1;
        }

        self.set_variable(LOC_TO_IN, index);

        Ok(text)
    }

    fn token(&self) -> Vec<u8>
    {
        self.arena.counted_string(LOC_WORD_BUFFER).unwrap_or_default()
    }

    fn remaining_input(&self) -> Cell
    {
        self.variable(LOC_INPUT_COUNT).saturating_sub(self.variable(LOC_TO_IN))
    }

    fn refill(&mut self) -> error::Result<bool>
    {
        if self.evaluating && self.pending_error.is_some()
        {
            self.clear_input();
            self.halt();

            return Ok(false);
        }

        if    !self.evaluating
           && self.config.prompt
           && self.input.is_interactive()
           && self.state() == State::Interpreting
        {
            writeln!(self.output, " ok")?;
            self.output.flush()?;
        }

        match self.input.read_line()?
        {
            Some(line) =>
                {
                    self.paste_code(&line)?;
                    Ok(true)
                },

            None =>
                {
                    self.clear_input();
                    self.halt();
                    Ok(false)
                }
        }
    }

    fn current_location(&self) -> Option<SourceLocation>
    {
        Some(self.input.location())
    }
}


impl WordManagement for ForthInterpreter
{
    fn dict_head(&self) -> Address
    {
        Address::from(self.variable(LOC_LATEST))
    }

    fn set_dict_head(&mut self, head: Address)
    {
        self.set_variable(LOC_LATEST, head.into());
    }

    fn add_entry(&mut self, name: &[u8], opcode: Opcode) -> error::Result<Address>
    {
        let here = self.here();
        let head = self.dict_head();
        let (xt, parameter_field) = write_entry(&mut self.arena,
                                                here,
                                                self.dictionary_limit,
                                                head,
                                                name,
                                                opcode.cell())?;

        self.set_here(parameter_field)?;

        trace!(name = %String::from_utf8_lossy(name), %xt, %opcode, "added dictionary entry");

        Ok(xt)
    }

    fn find(&self, name: &[u8]) -> Option<Address>
    {
        Dictionary::new(&self.arena).find(name)
    }

    fn find_by_opcode(&self, opcode: Opcode) -> Option<Address>
    {
        Dictionary::new(&self.arena).find_by_opcode(opcode.cell())
    }

    fn entry(&self, xt: Address) -> error::Result<DictionaryEntry>
    {
        read_entry(&self.arena, xt)
    }

    fn is_entry(&self, xt: Address) -> bool
    {
        Dictionary::new(&self.arena).contains(xt)
    }

    fn entries(&self) -> Vec<DictionaryEntry>
    {
        Dictionary::new(&self.arena).entries().collect()
    }

    fn set_flags(&mut self, xt: Address, flags: WordFlags) -> error::Result<()>
    {
        self.arena.store16(xt.offset(DE_FLAGS), flags.bits())
    }

    fn set_code_field(&mut self, xt: Address, opcode: Opcode) -> error::Result<()>
    {
        self.arena.store16(xt.offset(DE_CODE_FIELD), opcode.cell())
    }

    fn set_does_code(&mut self, xt: Address, code: Address) -> error::Result<()>
    {
        self.arena.store16(xt.offset(DE_DOES_CODE), code.into())
    }

    fn add_native_word(&mut self,
                       name: &str,
                       opcode: Opcode,
                       handler: WordHandler,
                       flags: WordFlags,
                       description: String,
                       signature: String) -> error::Result<Address>
    {
        self.handlers[opcode.slot()] = WordHandlerInfo::new(name.to_string(),
                                                            Some(opcode),
                                                            handler,
                                                            description,
                                                            signature);

        let xt = self.add_entry(name.as_bytes(), opcode)?;

        self.set_flags(xt, flags | WordFlags::MACHINE_CODE)?;
        self.set_dict_head(xt);

        Ok(xt)
    }

    fn add_native_handler(&mut self,
                          name: &str,
                          opcode: Opcode,
                          handler: WordHandler,
                          description: String)
    {
        self.handlers[opcode.slot()] = WordHandlerInfo::new(name.to_string(),
                                                            Some(opcode),
                                                            handler,
                                                            description,
                                                            String::new());
    }

    fn handler_info(&self, code_field: Cell) -> &WordHandlerInfo
    {
        // Slot zero is never assigned, so it always holds the illegal instruction handler.
        let slot = if (code_field as usize) < DISPATCH_TABLE_SIZE { code_field as usize } else { 0 };

        &self.handlers[slot]
    }

    fn execute_xt(&mut self, xt: Address) -> error::Result<Address>
    {
        if !self.is_entry(xt)
        {
            return ScriptError::new_as_result(ErrorKind::InvalidExecutionToken,
                                              format!("{} is not the address of a word.", xt));
        }

        let entry = self.entry(xt)?;

        if let Some(opcode) = Opcode::from_cell(entry.code_field)
            && opcode.has_inline_operand()
        {
            return ScriptError::new_as_result(ErrorKind::InvalidExecutionToken,
                                              format!("{} can only be compiled, not executed.",
                                                      entry.name_str()));
        }

        if    entry.flags.contains(WordFlags::COMPILE_ONLY)
           && self.state() == State::Interpreting
        {
            return ScriptError::new_as_result(ErrorKind::CompileOnly,
                                              format!("{} is only valid inside a definition.",
                                                      entry.name_str()));
        }

        self.current_word = xt;

        let handler = self.handler_info(entry.code_field).handler();

        handler(self)
    }
}


impl Interpreter for ForthInterpreter
{
    fn arena(&self) -> &Arena
    {
        &self.arena
    }

    fn arena_mut(&mut self) -> &mut Arena
    {
        &mut self.arena
    }

    fn config(&self) -> &Config
    {
        &self.config
    }

    fn dictionary_limit(&self) -> Address
    {
        self.dictionary_limit
    }

    fn ip(&self) -> Address
    {
        self.ip
    }

    fn set_ip(&mut self, ip: Address)
    {
        self.ip = ip;
    }

    fn current_word(&self) -> Address
    {
        self.current_word
    }

    fn current_opcode(&self) -> Cell
    {
        self.arena.fetch16(self.current_word.offset(DE_CODE_FIELD)).unwrap_or_default()
    }

    fn output(&mut self) -> &mut dyn Write
    {
        &mut *self.output
    }

    fn halt(&mut self)
    {
        self.running = false;
    }

    fn bye(&mut self)
    {
        self.exit_requested = true;
        self.running = false;
    }

    fn is_running(&self) -> bool
    {
        self.running
    }

    fn recovery_address(&self) -> Option<Address>
    {
        self.recovery
    }

    fn set_recovery_address(&mut self, address: Address)
    {
        self.recovery = Some(address);
    }

    fn abort(&mut self, error: ScriptError) -> error::Result<()>
    {
        let error = match self.current_location()
            {
                Some(location) if self.variable(LOC_INPUT_COUNT) > 0 => error.with_location(location),
                _ => error
            };

        debug!(kind = ?error.kind(), %error, "aborting");

        self.clear_stacks();
        self.clear_input();

        // Throw away a half compiled word whatever STATE is, an immediate word may already have
        // switched back to interpreting while the definition is still open.
        let head = self.dict_head();

        if let Ok(entry) = self.entry(head)
            && entry.flags.contains(WordFlags::DIRTY)
        {
            self.set_dict_head(entry.previous);
        }

        self.set_state(State::Interpreting);

        let Some(recovery) = self.recovery
        else
        {
            return Err(error);
        };

        self.ip = recovery;

        if self.evaluating
        {
            if self.pending_error.is_none()
            {
                self.pending_error = Some(error);
            }
        }
        else
        {
            let _ = self.output.flush();
            eprintln!("Error: {}", error);
        }

        Ok(())
    }

    fn run(&mut self) -> error::Result<()>
    {
        self.running = true;

        while self.running
        {
            match self.step()
            {
                Ok(next) => self.ip = next,

                Err(error) if error.is_fatal() =>
                    {
                        self.running = false;

                        let error = match self.current_location()
                            {
                                Some(location) => error.with_location(location),
                                None => error
                            };

                        return Err(error);
                    },

                Err(error) =>
                    {
                        if let Err(error) = self.abort(error)
                        {
                            self.running = false;
                            return Err(error);
                        }
                    }
            }
        }

        self.output.flush()?;

        Ok(())
    }

    fn evaluate(&mut self, source: &str) -> error::Result<()>
    {
        let recovery = self.require_recovery()?;

        let saved_input = replace(&mut self.input,
                                  Box::new(ScriptLines::from_source("<evaluate>", source)));
        let saved_evaluating = replace(&mut self.evaluating, true);

        self.pending_error = None;
        self.restart_at(recovery);

        let result = self.run();

        self.input = saved_input;
        self.evaluating = saved_evaluating;

        result?;

        match self.pending_error.take()
        {
            Some(error) => Err(error),
            None => Ok(())
        }
    }
}
