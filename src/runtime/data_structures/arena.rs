use crate::runtime::error::{self, ErrorKind, ScriptError};
use std::fmt::{self, Display, Formatter};

/// A single 16-bit cell, the natural unit of the data stack and the dictionary.
pub type Cell = u16;

/// The same cell viewed as a two's-complement signed number.
pub type SignedCell = i16;

/// Size of a cell in bytes.
pub const CELL_SIZE: u16 = 2;

/// Total size of the arena.  Every address the machine can form is inside it.
pub const ARENA_SIZE: usize = 0x10000;

/// The canonical true flag.  Any non-zero cell is treated as true.
pub const TRUE: Cell = 0xffff;

/// The canonical false flag.
pub const FALSE: Cell = 0;

/// A byte position within the arena.
///
/// Addresses are kept distinct from plain cells so that code can't accidentally treat a value on
/// the stack as a location without saying so.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Address(u16);

impl Address {
    pub const fn new(value: u16) -> Address {
        Address(value)
    }

    /// The raw position of the address.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// The null address.  Nothing valid ever lives at address zero.
    pub const fn null() -> Address {
        Address(0)
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Move forward the given number of bytes.  Arithmetic wraps the way a 16-bit machine's
    /// address bus would.
    pub const fn offset(&self, bytes: u16) -> Address {
        Address(self.0.wrapping_add(bytes))
    }

    /// Move backwards the given number of bytes.
    pub const fn back(&self, bytes: u16) -> Address {
        Address(self.0.wrapping_sub(bytes))
    }

    /// The next cell boundary at or after this address.
    pub const fn aligned(&self) -> Address {
        Address(self.0.wrapping_add(1) & !1)
    }

    /// The address of the next cell.
    pub const fn next_cell(&self) -> Address {
        self.offset(CELL_SIZE)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl From<Address> for Cell {
    fn from(address: Address) -> Cell {
        address.0
    }
}

impl From<Cell> for Address {
    fn from(value: Cell) -> Address {
        Address(value)
    }
}

/// Next free byte of dictionary space.
pub const LOC_HERE: Address = Address::new(0x0002);

/// Zero while interpreting, one while compiling.
pub const LOC_STATE: Address = Address::new(0x0004);

/// Radix used for parsing and printing numbers.
pub const LOC_BASE: Address = Address::new(0x0006);

/// Index of the next unparsed character in the input buffer.
pub const LOC_TO_IN: Address = Address::new(0x0008);

/// Number of characters held in the input buffer.
pub const LOC_INPUT_COUNT: Address = Address::new(0x000a);

/// Header address of the newest dictionary entry.
pub const LOC_LATEST: Address = Address::new(0x000c);

/// Counted string holding the most recently parsed token.
pub const LOC_WORD_BUFFER: Address = Address::new(0x000e);
pub const WORD_BUFFER_SIZE: u16 = 128;

/// The line of source text currently being interpreted.
pub const LOC_INPUT_BUFFER: Address = Address::new(0x008e);
pub const INPUT_BUFFER_SIZE: u16 = 1024;

/// First byte of dictionary space, just past the system area.
pub const DICTIONARY_START: Address = Address::new(0x048e);

/// The one flat block of memory everything lives in.  System variables, buffers, dictionary and
/// stacks are all just ranges of this buffer.
pub struct Arena {
    bytes: Box<[u8]>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    /// A zero filled arena.
    pub fn new() -> Arena {
        Arena {
            bytes: vec![0u8; ARENA_SIZE].into_boxed_slice(),
        }
    }

    pub fn fetch8(&self, address: Address) -> u8 {
        self.bytes[address.0 as usize]
    }

    pub fn store8(&mut self, address: Address, value: u8) {
        self.bytes[address.0 as usize] = value;
    }

    /// Read a little-endian cell.  The last byte of the arena can't start a cell.
    pub fn fetch16(&self, address: Address) -> error::Result<Cell> {
        let index = Self::cell_index(address)?;

        Ok(u16::from_le_bytes([self.bytes[index], self.bytes[index + 1]]))
    }

    /// Write a little-endian cell.
    pub fn store16(&mut self, address: Address, value: Cell) -> error::Result<()> {
        let index = Self::cell_index(address)?;
        let [low, high] = value.to_le_bytes();

        self.bytes[index] = low;
        self.bytes[index + 1] = high;

        Ok(())
    }

    /// Read a cell and treat it as an address.
    pub fn fetch_address(&self, address: Address) -> error::Result<Address> {
        Ok(Address(self.fetch16(address)?))
    }

    /// Borrow a run of bytes.
    pub fn bytes(&self, address: Address, length: usize) -> error::Result<&[u8]> {
        let start = address.0 as usize;

        self.bytes.get(start..start + length).ok_or_else(|| {
            ScriptError::new(
                ErrorKind::InvalidAddress,
                format!("Range {} + {} runs past the end of memory.", address, length),
            )
        })
    }

    /// Copy a run of bytes into the arena.
    pub fn store_bytes(&mut self, address: Address, data: &[u8]) -> error::Result<()> {
        let start = address.0 as usize;

        match self.bytes.get_mut(start..start + data.len()) {
            Some(target) => {
                target.copy_from_slice(data);
                Ok(())
            }

            None => ScriptError::new_as_result(
                ErrorKind::InvalidAddress,
                format!(
                    "Range {} + {} runs past the end of memory.",
                    address,
                    data.len()
                ),
            ),
        }
    }

    /// Read a counted string, a length byte followed by that many bytes.
    pub fn counted_string(&self, address: Address) -> error::Result<Vec<u8>> {
        let length = self.fetch8(address) as usize;

        Ok(self.bytes(address.offset(1), length)?.to_vec())
    }

    fn cell_index(address: Address) -> error::Result<usize> {
        let index = address.0 as usize;

        if index + 1 >= ARENA_SIZE {
            return ScriptError::new_as_result(
                ErrorKind::InvalidAddress,
                format!("Cell access at {} runs past the end of memory.", address),
            );
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_little_endian() {
        let mut arena = Arena::new();

        arena.store16(Address::new(0x100), 0xa0b1).unwrap();

        assert_eq!(arena.fetch8(Address::new(0x100)), 0xb1);
        assert_eq!(arena.fetch8(Address::new(0x101)), 0xa0);
        assert_eq!(arena.fetch16(Address::new(0x100)).unwrap(), 0xa0b1);
    }

    #[test]
    fn last_byte_cannot_hold_a_cell() {
        let mut arena = Arena::new();

        assert!(arena.fetch16(Address::new(0xffff)).is_err());
        assert!(arena.store16(Address::new(0xffff), 1).is_err());
        assert!(arena.store16(Address::new(0xfffe), 1).is_ok());
    }

    #[test]
    fn alignment_rounds_up() {
        assert_eq!(Address::new(0x48f).aligned(), Address::new(0x490));
        assert_eq!(Address::new(0x490).aligned(), Address::new(0x490));
    }

    #[test]
    fn system_area_is_laid_out_back_to_back() {
        assert_eq!(
            LOC_WORD_BUFFER.offset(WORD_BUFFER_SIZE),
            LOC_INPUT_BUFFER
        );
        assert_eq!(
            LOC_INPUT_BUFFER.offset(INPUT_BUFFER_SIZE),
            DICTIONARY_START
        );
    }

    #[test]
    fn counted_strings_read_their_length() {
        let mut arena = Arena::new();

        arena.store_bytes(LOC_WORD_BUFFER, &[3, b'D', b'U', b'P']).unwrap();

        assert_eq!(arena.counted_string(LOC_WORD_BUFFER).unwrap(), b"DUP".to_vec());
    }
}
