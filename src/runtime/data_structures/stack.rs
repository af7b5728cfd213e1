use crate::runtime::{
    data_structures::arena::{Address, Arena, CELL_SIZE, Cell},
    error::{self, ErrorKind, ScriptError},
};
use std::fmt::{self, Display, Formatter};

/// Which of the machine's stacks a view belongs to.  Used to word error messages.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StackRole {
    Data,
    Return,
    Control,
}

impl Display for StackRole {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            StackRole::Data => write!(f, "data"),
            StackRole::Return => write!(f, "return"),
            StackRole::Control => write!(f, "control"),
        }
    }
}

/// A stack living inside the arena.
///
/// The stack occupies the cells from `bottom` up to, but not including, `top` and grows upwards.
/// `cursor` is the next free cell: equal to `bottom` when empty, one cell short of `top` when
/// full.  The stack only records positions, the values themselves stay in the arena.
#[derive(Clone, Copy, Debug)]
pub struct Stack {
    role: StackRole,
    top: Address,
    bottom: Address,
    cursor: Address,
}

impl Stack {
    /// Carve a stack holding `cells` values out of the arena, just below `below`.  Returns the
    /// stack along with the highest address still free underneath it.
    pub fn carve(role: StackRole, below: Address, cells: u16) -> (Stack, Address) {
        // One extra slot, since the cell right under `top` is never written.
        let bottom = below.back(CELL_SIZE * (cells + 1));
        let stack = Stack {
            role,
            top: below,
            bottom,
            cursor: bottom,
        };

        (stack, bottom.back(CELL_SIZE))
    }

    pub fn role(&self) -> StackRole {
        self.role
    }

    pub fn top(&self) -> Address {
        self.top
    }

    pub fn bottom(&self) -> Address {
        self.bottom
    }

    /// How many values the stack can hold.
    pub fn capacity(&self) -> usize {
        ((self.top.value() - self.bottom.value()) / CELL_SIZE) as usize - 1
    }

    pub fn depth(&self) -> usize {
        ((self.cursor.value() - self.bottom.value()) / CELL_SIZE) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == self.bottom
    }

    /// Would one more push overflow the stack?
    pub fn will_overflow(&self) -> bool {
        self.cursor.next_cell() >= self.top
    }

    pub fn push(&mut self, arena: &mut Arena, value: Cell) -> error::Result<()> {
        if self.will_overflow() {
            return ScriptError::new_as_result(
                ErrorKind::StackOverflow(self.role),
                format!("The {} stack overflowed.", self.role),
            );
        }

        arena.store16(self.cursor, value)?;
        self.cursor = self.cursor.next_cell();

        Ok(())
    }

    pub fn pop(&mut self, arena: &Arena) -> error::Result<Cell> {
        if self.is_empty() {
            return ScriptError::new_as_result(
                ErrorKind::StackUnderflow(self.role),
                format!("The {} stack underflowed.", self.role),
            );
        }

        self.cursor = self.cursor.back(CELL_SIZE);
        arena.fetch16(self.cursor)
    }

    /// Read the value `index` places below the top without removing anything.
    pub fn peek(&self, arena: &Arena, index: usize) -> error::Result<Cell> {
        if index >= self.depth() {
            return ScriptError::new_as_result(
                ErrorKind::StackUnderflow(self.role),
                format!("The {} stack holds only {} values.", self.role, self.depth()),
            );
        }

        arena.fetch16(self.cursor.back(CELL_SIZE * (index as u16 + 1)))
    }

    /// Forget every value on the stack.
    pub fn clear(&mut self) {
        self.cursor = self.bottom;
    }

    /// The stack's values, bottom first.
    pub fn contents(&self, arena: &Arena) -> Vec<Cell> {
        (0..self.depth())
            .filter_map(|index| {
                arena
                    .fetch16(self.bottom.offset(CELL_SIZE * index as u16))
                    .ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_stack() -> (Arena, Stack) {
        let (stack, _) = Stack::carve(StackRole::Data, Address::new(0xfffe), 3);
        (Arena::new(), stack)
    }

    #[test]
    fn values_come_back_in_reverse_order() {
        let (mut arena, mut stack) = small_stack();

        stack.push(&mut arena, 1).unwrap();
        stack.push(&mut arena, 2).unwrap();

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(&arena).unwrap(), 2);
        assert_eq!(stack.pop(&arena).unwrap(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn capacity_is_exact() {
        let (mut arena, mut stack) = small_stack();

        assert_eq!(stack.capacity(), 3);

        for value in 0..3 {
            stack.push(&mut arena, value).unwrap();
        }

        assert!(stack.will_overflow());

        let error = stack.push(&mut arena, 99).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StackOverflow(StackRole::Data));
        assert_eq!(stack.contents(&arena), vec![0, 1, 2]);
    }

    #[test]
    fn popping_empty_stack_underflows() {
        let (arena, mut stack) = small_stack();

        let error = stack.pop(&arena).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StackUnderflow(StackRole::Data));
    }

    #[test]
    fn carving_leaves_a_gap_below() {
        let (stack, next) = Stack::carve(StackRole::Return, Address::new(0xfffe), 4);

        assert_eq!(stack.bottom(), Address::new(0xfffe - 10));
        assert_eq!(next, Address::new(0xfffe - 12));
    }

    #[test]
    fn peek_reads_without_popping() {
        let (mut arena, mut stack) = small_stack();

        stack.push(&mut arena, 7).unwrap();
        stack.push(&mut arena, 8).unwrap();

        assert_eq!(stack.peek(&arena, 0).unwrap(), 8);
        assert_eq!(stack.peek(&arena, 1).unwrap(), 7);
        assert!(stack.peek(&arena, 2).is_err());
        assert_eq!(stack.depth(), 2);
    }
}
