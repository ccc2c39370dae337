//! Fixed-slot arena
//!
//! Slots are addressed by `u32` index. Index 0 is the null slot: it is never
//! handed out, so 0 can mean "no slot" in links stored elsewhere. Freed slots
//! form an intrusive free list threaded through the slots themselves.

use crate::error::{fatal, MemoryError};

pub const NULL_INDEX: u32 = 0;

#[derive(Debug, Clone)]
enum Slot<T> {
    Null,
    Free { next: u32 },
    Occupied(T),
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    /// Slots backed by reserved storage; grows in `commit_step` increments
    committed: usize,
    reserved: usize,
    commit_step: usize,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new(reserved: usize, commit_step: usize) -> Self {
        let reserved = reserved.max(2);
        let commit_step = commit_step.max(1);
        let committed = commit_step.min(reserved);
        let mut slots = Vec::with_capacity(committed);
        slots.push(Slot::Null);
        Self { slots, free_head: NULL_INDEX, committed, reserved, commit_step, live: 0 }
    }

    /// Takes the free-list head, or the slot at the cursor when the list is empty
    pub fn try_allocate(&mut self, value: T) -> Result<u32, MemoryError> {
        if self.free_head != NULL_INDEX {
            let index = self.free_head;
            let slot = &mut self.slots[index as usize];
            self.free_head = match slot {
                Slot::Free { next } => *next,
                _ => unreachable!("free list reached a slot that is not free"),
            };
            *slot = Slot::Occupied(value);
            self.live += 1;
            return Ok(index);
        }
        let cursor = self.slots.len();
        if cursor >= self.reserved {
            return Err(MemoryError::Exhausted { reserved: self.reserved });
        }
        if cursor >= self.committed {
            let step = self.commit_step.min(self.reserved - self.committed);
            self.slots.reserve_exact(step);
            self.committed += step;
        }
        self.slots.push(Slot::Occupied(value));
        self.live += 1;
        Ok(cursor as u32)
    }

    /// Like [`try_allocate`](Self::try_allocate), but exhaustion is fatal
    pub fn allocate(&mut self, value: T) -> u32 {
        match self.try_allocate(value) {
            Ok(index) => index,
            Err(error) => fatal(error),
        }
    }

    pub fn free(&mut self, index: u32) -> T {
        debug_assert_ne!(index, NULL_INDEX, "freed the null slot");
        let slot = &mut self.slots[index as usize];
        if !matches!(slot, Slot::Occupied(_)) {
            invalid_slot(index);
        }
        let Slot::Occupied(value) = std::mem::replace(slot, Slot::Free { next: self.free_head })
        else {
            unreachable!()
        };
        self.free_head = index;
        self.live -= 1;
        value
    }

    pub fn get(&self, index: u32) -> &T {
        debug_assert_ne!(index, NULL_INDEX, "resolved the null slot");
        match &self.slots[index as usize] {
            Slot::Occupied(value) => value,
            _ => invalid_slot(index),
        }
    }

    pub fn get_mut(&mut self, index: u32) -> &mut T {
        debug_assert_ne!(index, NULL_INDEX, "resolved the null slot");
        match &mut self.slots[index as usize] {
            Slot::Occupied(value) => value,
            _ => invalid_slot(index),
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        matches!(self.slots.get(index as usize), Some(Slot::Occupied(_)))
    }

    /// Number of live slots
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Live slots in index order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| match slot {
            Slot::Occupied(value) => Some((index as u32, value)),
            _ => None,
        })
    }
}

#[cold]
fn invalid_slot(index: u32) -> ! {
    panic!("slot {} is not allocated", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_slot_is_never_allocated() {
        let mut arena = Arena::new(16, 4);
        let first = arena.allocate("a");
        assert_ne!(first, NULL_INDEX);
        assert_eq!(first, 1);
        assert!(!arena.contains(NULL_INDEX));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut arena = Arena::new(16, 4);
        let a = arena.allocate(1);
        let b = arena.allocate(2);
        let c = arena.allocate(3);
        assert_eq!(arena.free(a), 1);
        assert_eq!(arena.free(c), 3);
        assert_eq!(arena.len(), 1);

        assert_eq!(arena.allocate(4), c);
        assert_eq!(arena.allocate(5), a);
        assert_eq!(*arena.get(b), 2);
        assert_eq!(*arena.get(a), 5);
    }

    #[test]
    fn test_commit_grows_lazily() {
        let mut arena = Arena::new(100, 8);
        assert_eq!(arena.committed(), 8);
        for value in 0..7 {
            arena.allocate(value);
        }
        assert_eq!(arena.committed(), 8);
        arena.allocate(7);
        assert_eq!(arena.committed(), 16);
    }

    #[test]
    fn test_exhaustion_is_reported() {
        let mut arena = Arena::new(3, 1);
        arena.allocate(());
        arena.allocate(());
        assert_eq!(arena.try_allocate(()), Err(MemoryError::Exhausted { reserved: 3 }));
    }

    #[test]
    #[should_panic(expected = "arena exhausted")]
    fn test_exhaustion_is_fatal() {
        let mut arena = Arena::new(2, 1);
        arena.allocate(());
        arena.allocate(());
    }

    #[test]
    #[should_panic(expected = "not allocated")]
    fn test_resolving_freed_slot_panics() {
        let mut arena = Arena::new(8, 8);
        let index = arena.allocate(7u8);
        arena.free(index);
        arena.get(index);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena = Arena::new(8, 8);
        let a = arena.allocate('a');
        let b = arena.allocate('b');
        arena.allocate('c');
        arena.free(b);
        let live: Vec<_> = arena.iter().map(|(_, value)| *value).collect();
        assert_eq!(live, vec!['a', 'c']);
        assert!(arena.contains(a));
    }
}
