use crate::{ add_native_compiler_word,
             add_native_word,
             lang::code::Opcode,
             runtime::{ data_structures::arena::{ Address, DICTIONARY_START },
                        error::{ self, script_error, ErrorKind },
                        interpreter::Interpreter } };



/// The parameter field of the word being executed.
fn current_parameter_field(interpreter: &dyn Interpreter) -> error::Result<Address>
{
    Ok(interpreter.entry(interpreter.current_word())?.parameter_field())
}

/// Address of the inline operand that follows the current cell.
fn operand_address(interpreter: &dyn Interpreter) -> Address
{
    interpreter.ip().next_cell()
}

/// Is the address the still unresolved operand of a compiled forward jump?  Such a cell holds zero
/// and comes right after the xt of (JUMP) or (JUMP-IF-FALSE), below HERE.
fn is_open_placeholder(interpreter: &dyn Interpreter, address: Address) -> error::Result<bool>
{
    if address < DICTIONARY_START.next_cell() || address >= interpreter.here()
    {
        return Ok(false);
    }

    if interpreter.arena().fetch16(address)? != 0
    {
        return Ok(false);
    }

    let previous = Address::from(interpreter.arena().fetch16(address.back(2))?);
    let is_jump = |opcode| interpreter.find_by_opcode(opcode) == Some(previous);

    Ok(is_jump(Opcode::Jump) || is_jump(Opcode::JumpIfFalse))
}

/// Fill in the destination of a forward jump compiled by IF or ELSE.
fn patch_placeholder(interpreter: &mut dyn Interpreter,
                     placeholder: Address,
                     destination: Address) -> error::Result<()>
{
    if !is_open_placeholder(interpreter, placeholder)?
    {
        return script_error(interpreter,
                            ErrorKind::UnbalancedControlFlow,
                            format!("The control stack entry {} isn't an open jump.", placeholder));
    }

    interpreter.arena_mut().store16(placeholder, destination.into())
}

/// Pop a loop start left by BEGIN and compile it as the operand of the jump just compiled.
fn resolve_backward(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let destination = Address::from(interpreter.control_pop()?);

    if    destination < DICTIONARY_START
       || destination > interpreter.here()
       || is_open_placeholder(interpreter, destination)?
    {
        return script_error(interpreter,
                            ErrorKind::UnbalancedControlFlow,
                            format!("The control stack entry {} isn't a loop start.", destination));
    }

    interpreter.comma(destination.into())
}



/// Code field of colon definitions.  Save the return address and continue in the word's body.
fn word_enter(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let return_address = interpreter.next_ip();

    interpreter.return_push(return_address.into())?;
    current_parameter_field(interpreter)
}

/// Code field of words made by CREATE.  Push the word's data address.
fn word_create_runtime(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let parameter_field = current_parameter_field(interpreter)?;

    interpreter.push(parameter_field.into())?;

    Ok(interpreter.next_ip())
}

/// Code field of words given behaviour with DOES>.  Push the word's data address, then call the
/// code that followed DOES>.
fn word_does_runtime(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let entry = interpreter.entry(interpreter.current_word())?;
    let return_address = interpreter.next_ip();

    interpreter.push(entry.parameter_field().into())?;
    interpreter.return_push(return_address.into())?;

    Ok(entry.does_code)
}

/// Return from the current colon definition.
///
/// Signature: ` -- ` `R: address -- `
fn word_exit(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    Ok(Address::from(interpreter.return_pop()?))
}

/// Push the cell that follows inline.
///
/// Signature: ` -- value`
fn word_lit(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let operand = operand_address(interpreter);
    let value = interpreter.arena().fetch16(operand)?;

    interpreter.push(value)?;

    Ok(operand.next_cell())
}

/// Continue at the address that follows inline.
///
/// Signature: ` -- `
fn word_jump(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    interpreter.arena().fetch_address(operand_address(interpreter))
}

/// Continue at the inline address if the flag is zero, otherwise skip over it.
///
/// Signature: `flag -- `
fn word_jump_if_false(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let flag = interpreter.pop_flag()?;
    let operand = operand_address(interpreter);

    if flag
    {
        Ok(operand.next_cell())
    }
    else
    {
        interpreter.arena().fetch_address(operand)
    }
}

/// Run the word whose execution token is on the stack.
///
/// Signature: `xt -- ...`
fn word_execute(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let xt = interpreter.pop_address()?;

    interpreter.execute_xt(xt)
}

/// Compiled by DOES>.  Point the newest word at the code that follows, then return from the
/// defining word.
///
/// Signature: ` -- ` `R: address -- `
fn word_does_setup(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let head = interpreter.dict_head();
    let does_code = interpreter.next_ip();

    interpreter.set_code_field(head, Opcode::DoesRuntime)?;
    interpreter.set_does_code(head, does_code)?;

    Ok(Address::from(interpreter.return_pop()?))
}

/// Print the counted string that follows inline and continue after it.
///
/// Signature: ` -- `
fn word_dot_quote_runtime(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let operand = operand_address(interpreter);
    let text = interpreter.arena().counted_string(operand)?;

    interpreter.output().write_all(&text)?;

    Ok(operand.offset(1 + text.len() as u16).aligned())
}

/// Move a value from the data stack to the control stack.
///
/// Signature: `value -- ` `C: -- value`
fn word_to_control(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let value = interpreter.pop()?;

    interpreter.control_push(value)?;

    Ok(interpreter.next_ip())
}

/// Move a value from the control stack to the data stack.
///
/// Signature: ` -- value` `C: value -- `
fn word_from_control(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let value = interpreter.control_pop()?;

    interpreter.push(value)?;

    Ok(interpreter.next_ip())
}

/// Mark the start of a loop.
///
/// Signature: `C: -- destination`
fn word_begin(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let here = interpreter.here();

    interpreter.control_push(here.into())?;

    Ok(interpreter.next_ip())
}

/// Jump back to the start of the loop.
///
/// Signature: `C: destination -- `
fn word_again(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    interpreter.compile_opcode(Opcode::Jump)?;
    resolve_backward(interpreter)?;

    Ok(interpreter.next_ip())
}

/// Compile the loop start from the control stack as the operand of the jump before it.  UNTIL
/// uses it after compiling (JUMP-IF-FALSE).
///
/// Signature: ` -- ` `C: destination -- `
fn word_resolve_backward(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    resolve_backward(interpreter)?;

    Ok(interpreter.next_ip())
}

/// Compile a conditional forward jump, its destination is filled in by ELSE or THEN.
///
/// Signature: `C: -- placeholder`
fn word_if(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let placeholder = interpreter.compile_jump(Opcode::JumpIfFalse, Address::null())?;

    interpreter.control_push(placeholder.into())?;

    Ok(interpreter.next_ip())
}

/// End the true branch with a jump past the false branch, and point the IF here.
///
/// Signature: `C: placeholder -- placeholder`
fn word_else(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let if_placeholder = Address::from(interpreter.control_pop()?);
    let else_placeholder = interpreter.compile_jump(Opcode::Jump, Address::null())?;
    let here = interpreter.here();

    patch_placeholder(interpreter, if_placeholder, here)?;
    interpreter.control_push(else_placeholder.into())?;

    Ok(interpreter.next_ip())
}

/// Resolve the open IF or ELSE to the current position.
///
/// Signature: `C: placeholder -- `
fn word_then(interpreter: &mut dyn Interpreter) -> error::Result<Address>
{
    let placeholder = Address::from(interpreter.control_pop()?);
    let here = interpreter.here();

    patch_placeholder(interpreter, placeholder, here)?;

    Ok(interpreter.next_ip())
}



pub fn register_bytecode_words(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    interpreter.add_native_handler("ENTER", Opcode::Enter, word_enter,
        "Call a colon definition.".to_string());

    interpreter.add_native_handler("CREATE-RUNTIME", Opcode::CreateRuntime, word_create_runtime,
        "Push the data address of a created word.".to_string());

    interpreter.add_native_handler("DOES-RUNTIME", Opcode::DoesRuntime, word_does_runtime,
        "Push the data address of a word and run its DOES> code.".to_string());

    add_native_word!(interpreter, "EXIT", Opcode::Exit, word_exit,
        "Return from the current word.",
        " -- ");

    add_native_word!(interpreter, "(LIT)", Opcode::Lit, word_lit,
        "Push the value that follows inline.",
        " -- value");

    add_native_word!(interpreter, "(JUMP)", Opcode::Jump, word_jump,
        "Continue at the address that follows inline.",
        " -- ");

    add_native_word!(interpreter, "(JUMP-IF-FALSE)", Opcode::JumpIfFalse, word_jump_if_false,
        "Continue at the inline address if the flag is false.",
        "flag -- ");

    add_native_word!(interpreter, "EXECUTE", Opcode::Execute, word_execute,
        "Run the word with the given execution token.",
        "xt -- ...");

    add_native_word!(interpreter, "(DOES>)", Opcode::DoesSetup, word_does_setup,
        "Give the newest word the behaviour that follows.",
        " -- ");

    add_native_word!(interpreter, "(.\")", Opcode::DotQuoteRuntime, word_dot_quote_runtime,
        "Print the counted string that follows inline.",
        " -- ");

    add_native_word!(interpreter, ">C", Opcode::ToControl, word_to_control,
        "Move a value to the control stack.",
        "value -- ");

    add_native_word!(interpreter, "C>", Opcode::FromControl, word_from_control,
        "Move a value from the control stack.",
        " -- value");

    add_native_compiler_word!(interpreter, "BEGIN", Opcode::Begin, word_begin,
        "Mark the start of a loop.",
        "C: -- destination");

    add_native_compiler_word!(interpreter, "AGAIN", Opcode::Again, word_again,
        "Jump back to the start of the loop.",
        "C: destination -- ");

    add_native_word!(interpreter, "<RESOLVE", Opcode::ResolveBackward, word_resolve_backward,
        "Compile the loop start from the control stack as a jump operand.",
        "C: destination -- ");

    add_native_compiler_word!(interpreter, "IF", Opcode::If, word_if,
        "Run the following code only if the flag is true.",
        "flag -- ");

    add_native_compiler_word!(interpreter, "ELSE", Opcode::Else, word_else,
        "Start the code run when the IF flag was false.",
        " -- ");

    add_native_compiler_word!(interpreter, "THEN", Opcode::Then, word_then,
        "End an IF or IF ELSE.",
        " -- ");

    Ok(())
}

