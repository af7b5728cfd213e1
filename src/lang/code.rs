use crate::runtime::{
    data_structures::{
        arena::{Address, Arena, CELL_SIZE, Cell, SignedCell},
        dictionary::{Dictionary, DictionaryEntry},
    },
    error,
    interpreter::Interpreter,
};
use std::fmt::{self, Display, Formatter, Write};

/// Every operation the virtual machine knows how to perform.  A word's code field holds one of
/// these and the inner interpreter uses it to pick the handler to run.
///
/// Opcode zero is never assigned, so a zeroed code field always lands on the illegal instruction
/// handler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Call a colon definition: save the return address and continue in the word's body.
    Enter = 0x01,

    /// Return from a colon definition.
    Exit = 0x02,

    /// Push the cell that follows inline in the body.
    Lit = 0x03,

    /// Continue at the address that follows inline.
    Jump = 0x04,

    /// Pop a flag and continue at the inline address if it was zero.
    JumpIfFalse = 0x05,

    /// Run the word whose execution token is on the stack.
    Execute = 0x06,

    /// What a `CREATE`d word does: push its parameter field.
    CreateRuntime = 0x07,

    /// What a word built with `DOES>` does: push its parameter field and call its does code.
    DoesRuntime = 0x08,

    /// Compiled by `DOES>`, points the newest word at the code that follows.
    DoesSetup = 0x09,

    /// Print the counted string that follows inline.
    DotQuoteRuntime = 0x0a,

    Dup = 0x10,
    Drop = 0x11,
    Swap = 0x12,
    Over = 0x13,
    Rot = 0x14,
    Pick = 0x15,
    Depth = 0x16,
    ToR = 0x17,
    RFrom = 0x18,
    RFetch = 0x19,

    Add = 0x20,
    Sub = 0x21,
    Mul = 0x22,
    Div = 0x23,
    Mod = 0x24,
    Neg = 0x25,
    Equal = 0x26,
    LessThan = 0x27,
    ULessThan = 0x28,
    ZeroEqual = 0x29,
    And = 0x2a,
    Or = 0x2b,
    Xor = 0x2c,
    Invert = 0x2d,
    LShift = 0x2e,
    RShift = 0x2f,

    Fetch = 0x30,
    Store = 0x31,
    CFetch = 0x32,
    CStore = 0x33,
    Comma = 0x34,
    CComma = 0x35,
    Allot = 0x36,
    Here = 0x37,
    Align = 0x38,

    State = 0x40,
    Base = 0x41,
    ToIn = 0x42,
    InputCount = 0x43,
    Latest = 0x44,
    WordBuffer = 0x45,

    Word = 0x50,
    Find = 0x51,
    Number = 0x52,
    QueryImmediate = 0x53,
    CompileComma = 0x54,
    CompileLiteral = 0x55,
    Colon = 0x56,
    SemiColon = 0x57,
    Create = 0x58,
    Immediate = 0x59,
    CompileOnly = 0x5a,
    Hidden = 0x5b,
    Tick = 0x5c,
    Recurse = 0x5d,
    Does = 0x5e,
    Unresolved = 0x5f,
    ToControl = 0x60,
    FromControl = 0x61,
    ResolveBackward = 0x62,

    Begin = 0x68,
    Again = 0x69,
    If = 0x6a,
    Else = 0x6b,
    Then = 0x6c,

    Emit = 0x70,
    Dot = 0x71,
    UDot = 0x72,
    Cr = 0x73,
    Type = 0x74,
    DotS = 0x75,
    Query = 0x76,
    Remain = 0x77,
    DotQuote = 0x78,
    Paren = 0x79,
    Backslash = 0x7a,
    Words = 0x7b,
    See = 0x7c,
    Help = 0x7d,
    Info = 0x7e,
    Key = 0x7f,

    Abort = 0x90,
    Bye = 0x91,
}

impl Opcode {
    /// Every opcode, in numeric order.
    pub const ALL: &'static [Opcode] = &[
        Opcode::Enter,
        Opcode::Exit,
        Opcode::Lit,
        Opcode::Jump,
        Opcode::JumpIfFalse,
        Opcode::Execute,
        Opcode::CreateRuntime,
        Opcode::DoesRuntime,
        Opcode::DoesSetup,
        Opcode::DotQuoteRuntime,
        Opcode::Dup,
        Opcode::Drop,
        Opcode::Swap,
        Opcode::Over,
        Opcode::Rot,
        Opcode::Pick,
        Opcode::Depth,
        Opcode::ToR,
        Opcode::RFrom,
        Opcode::RFetch,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Neg,
        Opcode::Equal,
        Opcode::LessThan,
        Opcode::ULessThan,
        Opcode::ZeroEqual,
        Opcode::And,
        Opcode::Or,
        Opcode::Xor,
        Opcode::Invert,
        Opcode::LShift,
        Opcode::RShift,
        Opcode::Fetch,
        Opcode::Store,
        Opcode::CFetch,
        Opcode::CStore,
        Opcode::Comma,
        Opcode::CComma,
        Opcode::Allot,
        Opcode::Here,
        Opcode::Align,
        Opcode::State,
        Opcode::Base,
        Opcode::ToIn,
        Opcode::InputCount,
        Opcode::Latest,
        Opcode::WordBuffer,
        Opcode::Word,
        Opcode::Find,
        Opcode::Number,
        Opcode::QueryImmediate,
        Opcode::CompileComma,
        Opcode::CompileLiteral,
        Opcode::Colon,
        Opcode::SemiColon,
        Opcode::Create,
        Opcode::Immediate,
        Opcode::CompileOnly,
        Opcode::Hidden,
        Opcode::Tick,
        Opcode::Recurse,
        Opcode::Does,
        Opcode::Unresolved,
        Opcode::ToControl,
        Opcode::FromControl,
        Opcode::ResolveBackward,
        Opcode::Begin,
        Opcode::Again,
        Opcode::If,
        Opcode::Else,
        Opcode::Then,
        Opcode::Emit,
        Opcode::Dot,
        Opcode::UDot,
        Opcode::Cr,
        Opcode::Type,
        Opcode::DotS,
        Opcode::Query,
        Opcode::Remain,
        Opcode::DotQuote,
        Opcode::Paren,
        Opcode::Backslash,
        Opcode::Words,
        Opcode::See,
        Opcode::Help,
        Opcode::Info,
        Opcode::Key,
        Opcode::Abort,
        Opcode::Bye,
    ];

    /// Decode a code field.  Anything that isn't an assigned opcode gives `None`.
    pub fn from_cell(value: Cell) -> Option<Opcode> {
        Opcode::ALL.iter().copied().find(|op| op.cell() == value)
    }

    /// The value stored in a code field.
    pub const fn cell(&self) -> Cell {
        *self as u8 as Cell
    }

    /// The dispatch table slot for the opcode.
    pub const fn slot(&self) -> usize {
        *self as u8 as usize
    }

    /// Does a reference to this word in a body carry an operand right after it?  Such words
    /// can't be run by `EXECUTE`.
    pub const fn has_inline_operand(&self) -> bool {
        matches!(
            self,
            Opcode::Lit | Opcode::Jump | Opcode::JumpIfFalse | Opcode::DotQuoteRuntime
        )
    }

    /// A short name used in diagnostics.
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Enter => "ENTER",
            Opcode::Exit => "EXIT",
            Opcode::Lit => "LIT",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP-IF-FALSE",
            Opcode::Execute => "EXECUTE",
            Opcode::CreateRuntime => "CREATE-RUNTIME",
            Opcode::DoesRuntime => "DOES-RUNTIME",
            Opcode::DoesSetup => "DOES-SETUP",
            Opcode::DotQuoteRuntime => "DOT-QUOTE-RUNTIME",
            Opcode::Dup => "DUP",
            Opcode::Drop => "DROP",
            Opcode::Swap => "SWAP",
            Opcode::Over => "OVER",
            Opcode::Rot => "ROT",
            Opcode::Pick => "PICK",
            Opcode::Depth => "DEPTH",
            Opcode::ToR => "TO-R",
            Opcode::RFrom => "R-FROM",
            Opcode::RFetch => "R-FETCH",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Equal => "EQUAL",
            Opcode::LessThan => "LT",
            Opcode::ULessThan => "ULT",
            Opcode::ZeroEqual => "ZERO-EQUAL",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Invert => "INVERT",
            Opcode::LShift => "LSHIFT",
            Opcode::RShift => "RSHIFT",
            Opcode::Fetch => "FETCH",
            Opcode::Store => "STORE",
            Opcode::CFetch => "C-FETCH",
            Opcode::CStore => "C-STORE",
            Opcode::Comma => "COMMA",
            Opcode::CComma => "C-COMMA",
            Opcode::Allot => "ALLOT",
            Opcode::Here => "HERE",
            Opcode::Align => "ALIGN",
            Opcode::State => "STATE",
            Opcode::Base => "BASE",
            Opcode::ToIn => "TO-IN",
            Opcode::InputCount => "INPUT-COUNT",
            Opcode::Latest => "LATEST",
            Opcode::WordBuffer => "WORD-BUFFER",
            Opcode::Word => "WORD",
            Opcode::Find => "FIND",
            Opcode::Number => "NUMBER",
            Opcode::QueryImmediate => "QUERY-IMMEDIATE",
            Opcode::CompileComma => "COMPILE-COMMA",
            Opcode::CompileLiteral => "COMPILE-LITERAL",
            Opcode::Colon => "COLON",
            Opcode::SemiColon => "SEMICOLON",
            Opcode::Create => "CREATE",
            Opcode::Immediate => "IMMEDIATE",
            Opcode::CompileOnly => "COMPILE-ONLY",
            Opcode::Hidden => "HIDDEN",
            Opcode::Tick => "TICK",
            Opcode::Recurse => "RECURSE",
            Opcode::Does => "DOES",
            Opcode::Unresolved => "UNRESOLVED",
            Opcode::ToControl => "TO-C",
            Opcode::FromControl => "C-FROM",
            Opcode::ResolveBackward => "RESOLVE-BACKWARD",
            Opcode::Begin => "BEGIN",
            Opcode::Again => "AGAIN",
            Opcode::If => "IF",
            Opcode::Else => "ELSE",
            Opcode::Then => "THEN",
            Opcode::Emit => "EMIT",
            Opcode::Dot => "DOT",
            Opcode::UDot => "U-DOT",
            Opcode::Cr => "CR",
            Opcode::Type => "TYPE",
            Opcode::DotS => "DOT-S",
            Opcode::Query => "QUERY",
            Opcode::Remain => "REMAIN",
            Opcode::DotQuote => "DOT-QUOTE",
            Opcode::Paren => "PAREN",
            Opcode::Backslash => "BACKSLASH",
            Opcode::Words => "WORDS",
            Opcode::See => "SEE",
            Opcode::Help => "HELP",
            Opcode::Info => "INFO",
            Opcode::Key => "KEY",
            Opcode::Abort => "ABORT",
            Opcode::Bye => "BYE",
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Turn a word back into something resembling the source that produced it.
///
/// Colon definitions are listed one cell per line with the address of the cell, the name of the
/// word referenced there and any inline operand.  The listing stops at the `EXIT` that ends the
/// word, which is the first one no jump reaches past.
pub fn decompile(interpreter: &dyn Interpreter, xt: Address) -> error::Result<String> {
    let arena = interpreter.arena();
    let dictionary = Dictionary::new(arena);
    let entry = dictionary.entry(xt)?;
    let mut result = String::new();

    let immediate = if entry.is_immediate() { " IMMEDIATE" } else { "" };

    match Opcode::from_cell(entry.code_field) {
        Some(Opcode::Enter) => {
            let end = body_end(interpreter, &dictionary, xt);

            writeln!(&mut result, ": {}", entry.name_str())
                .expect("Writing to String should never fail.");
            list_body(arena, &dictionary, entry.parameter_field(), end, &mut result)?;
            writeln!(&mut result, ";{}", immediate).expect("Writing to String should never fail.");
        }

        Some(Opcode::CreateRuntime) => {
            writeln!(
                &mut result,
                "CREATE {}  ( data at {} )",
                entry.name_str(),
                entry.parameter_field()
            )
            .expect("Writing to String should never fail.");
        }

        Some(Opcode::DoesRuntime) => {
            let end = body_end(interpreter, &dictionary, entry.does_code);

            writeln!(
                &mut result,
                "CREATE {}  ( data at {} )\nDOES>",
                entry.name_str(),
                entry.parameter_field()
            )
            .expect("Writing to String should never fail.");
            list_body(arena, &dictionary, entry.does_code, end, &mut result)?;
        }

        Some(op) => {
            writeln!(
                &mut result,
                "{} is native code, opcode {:02x} {}.{}",
                entry.name_str(),
                op.cell(),
                op,
                immediate
            )
            .expect("Writing to String should never fail.");
        }

        None => {
            writeln!(
                &mut result,
                "{} has an unknown code field {:04x}.",
                entry.name_str(),
                entry.code_field
            )
            .expect("Writing to String should never fail.");
        }
    }

    Ok(result)
}

// A body can't extend past the header of the word defined after it, nor past HERE.
fn body_end(interpreter: &dyn Interpreter, dictionary: &Dictionary, start: Address) -> Address {
    dictionary
        .entries()
        .map(|entry| entry.address)
        .filter(|address| *address > start)
        .min()
        .unwrap_or_else(|| interpreter.here())
}

fn list_body(
    arena: &Arena,
    dictionary: &Dictionary,
    start: Address,
    end: Address,
    result: &mut String,
) -> error::Result<()> {
    let mut ip = start;
    let mut furthest = start;

    while ip < end {
        let cell = arena.fetch16(ip)?;
        let target = referenced_entry(dictionary, cell);

        let Some(target) = target else {
            writeln!(result, "  {}  {:04x}", ip, cell).expect("Writing to String should never fail.");
            ip = ip.next_cell();
            continue;
        };

        let name = target.name_str();

        match Opcode::from_cell(target.code_field) {
            Some(Opcode::Lit) => {
                let value = arena.fetch16(ip.next_cell())? as SignedCell;

                writeln!(result, "  {}  {} {}", ip, name, value)
                    .expect("Writing to String should never fail.");
                ip = ip.offset(2 * CELL_SIZE);
            }

            Some(Opcode::Jump) | Some(Opcode::JumpIfFalse) => {
                let destination = arena.fetch_address(ip.next_cell())?;

                writeln!(result, "  {}  {} {}", ip, name, destination)
                    .expect("Writing to String should never fail.");

                furthest = furthest.max(destination);
                ip = ip.offset(2 * CELL_SIZE);
            }

            Some(Opcode::DotQuoteRuntime) => {
                let text = arena.counted_string(ip.next_cell())?;

                writeln!(
                    result,
                    "  {}  .\" {}\"",
                    ip,
                    String::from_utf8_lossy(&text)
                )
                .expect("Writing to String should never fail.");

                ip = ip
                    .offset(CELL_SIZE + 1 + text.len() as u16)
                    .aligned();
            }

            Some(Opcode::Exit) => {
                writeln!(result, "  {}  {}", ip, name).expect("Writing to String should never fail.");

                if ip >= furthest {
                    break;
                }

                ip = ip.next_cell();
            }

            _ => {
                writeln!(result, "  {}  {}", ip, name).expect("Writing to String should never fail.");
                ip = ip.next_cell();
            }
        }
    }

    Ok(())
}

fn referenced_entry(dictionary: &Dictionary, cell: Cell) -> Option<DictionaryEntry> {
    let address = Address::from(cell);

    if dictionary.contains(address) {
        dictionary.entry(address).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_its_cell() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_cell(op.cell()), Some(*op));
        }
    }

    #[test]
    fn zero_and_unassigned_values_are_not_opcodes() {
        assert_eq!(Opcode::from_cell(0), None);
        assert_eq!(Opcode::from_cell(0xff), None);
        assert_eq!(Opcode::from_cell(0x100 + Opcode::Dup.cell()), None);
    }

    #[test]
    fn only_branches_and_literals_carry_operands() {
        assert!(Opcode::Lit.has_inline_operand());
        assert!(Opcode::JumpIfFalse.has_inline_operand());
        assert!(!Opcode::Enter.has_inline_operand());
        assert!(!Opcode::Exit.has_inline_operand());
    }
}
