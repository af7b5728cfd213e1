use crate::runtime::{
    data_structures::arena::{Address, Arena, Cell, LOC_LATEST},
    error::{self, ErrorKind, ScriptError},
};
use std::{
    fmt::{self, Display, Formatter},
    ops::BitOr,
};

/// Offset of the link to the previous, older, entry.
pub const DE_PREVIOUS: u16 = 0;

/// Offset of the word's flag bits.
pub const DE_FLAGS: u16 = 2;

/// Offset of the code field, the opcode the inner interpreter dispatches on.
pub const DE_CODE_FIELD: u16 = 4;

/// Offset of the address of the high level code run by words built with `DOES>`.
pub const DE_DOES_CODE: u16 = 6;

/// Offset of the name's length byte.  The name's characters follow it directly.
pub const DE_NAME: u16 = 8;

/// Size of a header not counting the characters of its name.
pub const HEADER_SIZE: u16 = DE_NAME + 1;

/// Longest name a word may have.
pub const MAX_NAME_LENGTH: usize = 31;

/// Flag bits stored in each dictionary header.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct WordFlags(Cell);

impl WordFlags {
    /// The code field names a native handler.
    pub const MACHINE_CODE: WordFlags = WordFlags(1 << 0);

    /// The word runs even while compiling.
    pub const IMMEDIATE: WordFlags = WordFlags(1 << 1);

    /// The word only makes sense inside a colon definition.
    pub const COMPILE_ONLY: WordFlags = WordFlags(1 << 3);

    /// The word is left out of name lookups.
    pub const HIDDEN: WordFlags = WordFlags(1 << 4);

    /// The word is still being compiled.
    pub const DIRTY: WordFlags = WordFlags(1 << 5);

    pub const fn empty() -> WordFlags {
        WordFlags(0)
    }

    pub const fn from_bits(bits: Cell) -> WordFlags {
        WordFlags(bits)
    }

    pub const fn bits(&self) -> Cell {
        self.0
    }

    pub const fn contains(&self, other: WordFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: WordFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: WordFlags) {
        self.0 &= !other.0;
    }

    pub fn toggle(&mut self, other: WordFlags) {
        self.0 ^= other.0;
    }
}

impl BitOr for WordFlags {
    type Output = WordFlags;

    fn bitor(self, rhs: WordFlags) -> WordFlags {
        WordFlags(self.0 | rhs.0)
    }
}

impl Display for WordFlags {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let names = [
            (WordFlags::MACHINE_CODE, "machine-code"),
            (WordFlags::IMMEDIATE, "immediate"),
            (WordFlags::COMPILE_ONLY, "compile-only"),
            (WordFlags::HIDDEN, "hidden"),
            (WordFlags::DIRTY, "dirty"),
        ];

        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        write!(f, "{}", set.join(" "))
    }
}

/// A decoded copy of one header.  The header itself lives in the arena, this is just a convenient
/// way to look at it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DictionaryEntry {
    /// Where the header starts.  This is also the word's execution token.
    pub address: Address,

    /// The next older entry, or null for the oldest.
    pub previous: Address,

    pub flags: WordFlags,

    /// The opcode the inner interpreter dispatches on.
    pub code_field: Cell,

    /// The high level code run by `DOES>` words, otherwise null.
    pub does_code: Address,

    pub name: Vec<u8>,
}

impl DictionaryEntry {
    /// The word's name as text.
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).to_string()
    }

    /// Where the word's body starts, the first even address past the name.
    pub fn parameter_field(&self) -> Address {
        self.address
            .offset(HEADER_SIZE + self.name.len() as u16)
            .aligned()
    }

    pub fn is_immediate(&self) -> bool {
        self.flags.contains(WordFlags::IMMEDIATE)
    }

    /// Can the word be found by name?
    pub fn is_visible(&self) -> bool {
        !self.flags.contains(WordFlags::HIDDEN) && !self.flags.contains(WordFlags::DIRTY)
    }
}

/// Decode the header at the given address.
pub fn read_entry(arena: &Arena, address: Address) -> error::Result<DictionaryEntry> {
    let name_length = arena.fetch8(address.offset(DE_NAME)) as usize;

    Ok(DictionaryEntry {
        address,
        previous: arena.fetch_address(address.offset(DE_PREVIOUS))?,
        flags: WordFlags::from_bits(arena.fetch16(address.offset(DE_FLAGS))?),
        code_field: arena.fetch16(address.offset(DE_CODE_FIELD))?,
        does_code: arena.fetch_address(address.offset(DE_DOES_CODE))?,
        name: arena
            .bytes(address.offset(HEADER_SIZE), name_length)?
            .to_vec(),
    })
}

/// Write a new header at `here` (rounded up to a cell boundary), pointing back at `previous`.
/// Returns the new entry's address and the first free address after it, which is also the
/// entry's parameter field.
///
/// The new entry is not linked in, the dictionary's head is left alone.
pub fn write_entry(
    arena: &mut Arena,
    here: Address,
    limit: Address,
    previous: Address,
    name: &[u8],
    code_field: Cell,
) -> error::Result<(Address, Address)> {
    if name.is_empty() {
        return ScriptError::new_as_result(
            ErrorKind::MissingName,
            "A word needs a name.".to_string(),
        );
    }

    if name.len() > MAX_NAME_LENGTH {
        return ScriptError::new_as_result(
            ErrorKind::NameTooLong,
            format!(
                "The name {} is longer than {} characters.",
                String::from_utf8_lossy(name),
                MAX_NAME_LENGTH
            ),
        );
    }

    let address = here.aligned();
    let end = address.value() as u32 + HEADER_SIZE as u32 + name.len() as u32;

    if end + 1 >= limit.value() as u32 || address < here {
        return ScriptError::new_as_result(
            ErrorKind::DictionaryFull,
            format!("No room left for the word {}.", String::from_utf8_lossy(name)),
        );
    }

    arena.store16(address.offset(DE_PREVIOUS), previous.into())?;
    arena.store16(address.offset(DE_FLAGS), 0)?;
    arena.store16(address.offset(DE_CODE_FIELD), code_field)?;
    arena.store16(address.offset(DE_DOES_CODE), 0)?;
    arena.store8(address.offset(DE_NAME), name.len() as u8);
    arena.store_bytes(address.offset(HEADER_SIZE), name)?;

    let parameter_field = address
        .offset(HEADER_SIZE + name.len() as u16)
        .aligned();

    Ok((address, parameter_field))
}

/// A read only view of the dictionary, the linked list of headers starting at the newest entry.
pub struct Dictionary<'a> {
    arena: &'a Arena,
    head: Address,
}

impl<'a> Dictionary<'a> {
    /// View the dictionary whose head is recorded in the arena's system variables.
    pub fn new(arena: &'a Arena) -> Dictionary<'a> {
        let head = arena.fetch_address(LOC_LATEST).unwrap_or_default();

        Dictionary { arena, head }
    }

    /// Walk the entries, newest first.
    pub fn entries(&self) -> Entries<'a> {
        Entries {
            arena: self.arena,
            next: self.head,
            remaining: self.arena_entry_limit(),
        }
    }

    /// Find a visible word by name.  The newest definition wins, names are compared without
    /// regard to case.
    pub fn find(&self, name: &[u8]) -> Option<Address> {
        if name.is_empty() {
            return None;
        }

        self.entries()
            .find(|entry| entry.is_visible() && entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.address)
    }

    /// Find the native word that dispatches on the given opcode, visible or not.
    pub fn find_by_opcode(&self, code_field: Cell) -> Option<Address> {
        self.entries()
            .find(|entry| {
                entry.code_field == code_field && entry.flags.contains(WordFlags::MACHINE_CODE)
            })
            .map(|entry| entry.address)
    }

    /// Is the address the start of a linked entry?
    pub fn contains(&self, address: Address) -> bool {
        !address.is_null() && self.entries().any(|entry| entry.address == address)
    }

    pub fn entry(&self, address: Address) -> error::Result<DictionaryEntry> {
        read_entry(self.arena, address)
    }

    // Even a corrupted link can't walk more entries than could fit in memory.
    fn arena_entry_limit(&self) -> usize {
        0x10000 / (HEADER_SIZE as usize + 1)
    }
}

/// Iterator over a chain of headers.
pub struct Entries<'a> {
    arena: &'a Arena,
    next: Address,
    remaining: usize,
}

impl Iterator for Entries<'_> {
    type Item = DictionaryEntry;

    fn next(&mut self) -> Option<DictionaryEntry> {
        if self.next.is_null() || self.remaining == 0 {
            return None;
        }

        let entry = read_entry(self.arena, self.next).ok()?;

        self.remaining -= 1;
        self.next = entry.previous;

        Some(entry)
    }
}

/// List the visible words, newest first.
impl Display for Dictionary<'_> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        let visible: Vec<DictionaryEntry> = self.entries().filter(|e| e.is_visible()).collect();
        let mut column = 0;

        writeln!(formatter, "{} words defined.", visible.len())?;

        for entry in visible.iter() {
            let name = entry.name_str();

            if column + name.len() + 1 > 80 {
                writeln!(formatter)?;
                column = 0;
            }

            write!(formatter, "{} ", name)?;
            column += name.len() + 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::data_structures::arena::{DICTIONARY_START, LOC_LATEST};

    fn add(arena: &mut Arena, here: Address, name: &str, code: Cell) -> Address {
        let head = arena.fetch_address(LOC_LATEST).unwrap();
        let (entry, next) =
            write_entry(arena, here, Address::new(0xf000), head, name.as_bytes(), code).unwrap();

        arena.store16(LOC_LATEST, entry.into()).unwrap();
        next
    }

    #[test]
    fn newest_definition_shadows_older() {
        let mut arena = Arena::new();
        let here = add(&mut arena, DICTIONARY_START, "FOO", 1);
        let first = Dictionary::new(&arena).find(b"FOO").unwrap();
        add(&mut arena, here, "foo", 2);

        let dictionary = Dictionary::new(&arena);
        let found = dictionary.find(b"Foo").unwrap();

        assert_ne!(found, first);
        assert_eq!(dictionary.entry(found).unwrap().code_field, 2);
        assert_eq!(dictionary.entry(first).unwrap().code_field, 1);
    }

    #[test]
    fn parameter_field_is_even() {
        let mut arena = Arena::new();
        let next = add(&mut arena, DICTIONARY_START, "ABCD", 1);
        let entry = Dictionary::new(&arena).entry(DICTIONARY_START).unwrap();

        assert_eq!(entry.parameter_field(), next);
        assert_eq!(next.value() % 2, 0);
        assert_eq!(next, DICTIONARY_START.offset(HEADER_SIZE + 4).aligned());
    }

    #[test]
    fn dirty_and_hidden_words_are_skipped() {
        let mut arena = Arena::new();
        add(&mut arena, DICTIONARY_START, "SECRET", 1);

        arena
            .store16(
                DICTIONARY_START.offset(DE_FLAGS),
                WordFlags::HIDDEN.bits(),
            )
            .unwrap();
        assert_eq!(Dictionary::new(&arena).find(b"SECRET"), None);

        arena
            .store16(DICTIONARY_START.offset(DE_FLAGS), WordFlags::DIRTY.bits())
            .unwrap();
        assert_eq!(Dictionary::new(&arena).find(b"SECRET"), None);
    }

    #[test]
    fn long_names_are_rejected() {
        let mut arena = Arena::new();
        let name = [b'X'; MAX_NAME_LENGTH + 1];
        let error = write_entry(
            &mut arena,
            DICTIONARY_START,
            Address::new(0xf000),
            Address::null(),
            &name,
            1,
        )
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NameTooLong);
    }

    #[test]
    fn full_dictionary_is_reported() {
        let mut arena = Arena::new();
        let error = write_entry(
            &mut arena,
            Address::new(0x0ff0),
            Address::new(0x0ff8),
            Address::null(),
            b"TOO-BIG",
            1,
        )
        .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::DictionaryFull);
    }
}
