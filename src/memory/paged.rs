//! Paged sequence
//!
//! A doubly linked chain of fixed-capacity pages holding records of one type.
//! Inserting or removing costs at most one page's worth of moves, never the
//! length of the sequence. Every record is reachable through a [`Handle`]
//! whose cell is rewritten whenever the record moves.

use super::arena::{Arena, NULL_INDEX};
use super::handle::{Handle, HandleTable, Location};
use crate::config::EngineConfig;

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: Handle<T>,
    value: T,
}

#[derive(Debug, Clone)]
struct Page<T> {
    prev: u32,
    next: u32,
    entries: Vec<Entry<T>>,
}

/// Position inside a [`PagedSequence`]
///
/// A cursor whose index equals its page's length is past the end. Only the
/// last page ever holds such a cursor after a sequence operation returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    page: u32,
    index: u32,
}

impl Cursor {
    pub fn location(self) -> Location {
        Location { page: self.page, index: self.index }
    }
}

#[derive(Debug, Clone)]
pub struct PagedSequence<T> {
    pages: Arena<Page<T>>,
    handles: HandleTable<T>,
    capacity: usize,
    head: u32,
    tail: u32,
    len: usize,
}

impl<T> PagedSequence<T> {
    /// Creates an empty sequence whose pages hold `capacity` records
    pub fn new(capacity: usize, reserved: usize, commit_step: usize) -> Self {
        let capacity = capacity.max(2);
        let mut pages = Arena::new(reserved, commit_step);
        let head = pages.allocate(Page {
            prev: NULL_INDEX,
            next: NULL_INDEX,
            entries: Vec::with_capacity(capacity),
        });
        Self {
            pages,
            handles: HandleTable::new(reserved, commit_step),
            capacity,
            head,
            tail: head,
            len: 0,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new(config.page_capacity::<Entry<T>>(), config.reserved_slots, config.commit_slots)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn page_capacity(&self) -> usize {
        self.capacity
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn first(&self) -> Cursor {
        Cursor { page: self.head, index: 0 }
    }

    /// The past-the-end cursor; inserting before it appends
    pub fn end(&self) -> Cursor {
        Cursor { page: self.tail, index: self.page(self.tail).entries.len() as u32 }
    }

    /// The last record, if any
    pub fn last(&self) -> Option<Cursor> {
        self.prev(self.end())
    }

    pub fn is_end(&self, cursor: Cursor) -> bool {
        cursor.index as usize >= self.page(cursor.page).entries.len()
    }

    pub fn get(&self, cursor: Cursor) -> Option<&T> {
        self.page(cursor.page).entries.get(cursor.index as usize).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut T> {
        self.pages
            .get_mut(cursor.page)
            .entries
            .get_mut(cursor.index as usize)
            .map(|entry| &mut entry.value)
    }

    pub fn handle_at(&self, cursor: Cursor) -> Option<Handle<T>> {
        self.page(cursor.page).entries.get(cursor.index as usize).map(|entry| entry.handle)
    }

    pub fn next(&self, cursor: Cursor) -> Cursor {
        let page = self.page(cursor.page);
        let index = cursor.index as usize + 1;
        if index >= page.entries.len() && page.next != NULL_INDEX {
            Cursor { page: page.next, index: 0 }
        } else {
            Cursor { page: cursor.page, index: index.min(page.entries.len()) as u32 }
        }
    }

    /// Steps back one record; `None` when already at the first
    pub fn prev(&self, cursor: Cursor) -> Option<Cursor> {
        if cursor.index > 0 {
            return Some(Cursor { page: cursor.page, index: cursor.index - 1 });
        }
        let prev = self.page(cursor.page).prev;
        if prev == NULL_INDEX {
            return None;
        }
        let len = self.page(prev).entries.len() as u32;
        Some(Cursor { page: prev, index: len - 1 })
    }

    pub fn cursor_of(&self, handle: Handle<T>) -> Cursor {
        let location = self.handles.resolve(handle);
        Cursor { page: location.page, index: location.index }
    }

    pub fn locate(&self, handle: Handle<T>) -> Location {
        self.handles.resolve(handle)
    }

    pub fn resolve(&self, handle: Handle<T>) -> &T {
        let location = self.handles.resolve(handle);
        let entry = &self.page(location.page).entries[location.index as usize];
        debug_assert_eq!(entry.handle, handle, "handle cell is stale");
        &entry.value
    }

    pub fn resolve_mut(&mut self, handle: Handle<T>) -> &mut T {
        let location = self.handles.resolve(handle);
        let entry = &mut self.pages.get_mut(location.page).entries[location.index as usize];
        debug_assert_eq!(entry.handle, handle, "handle cell is stale");
        &mut entry.value
    }

    pub fn is_live(&self, handle: Handle<T>) -> bool {
        self.handles.is_live(handle)
    }

    /// Inserts `value` before `cursor`, leaving `cursor` on the new record
    pub fn insert_before(&mut self, cursor: &mut Cursor, value: T) -> Handle<T> {
        let handle = self.handles.issue(Location::NULL);
        let page_len = self.page(cursor.page).entries.len();
        if page_len == self.capacity {
            let next = self.open_following_page(cursor.page);
            if cursor.index as usize == page_len {
                *cursor = Cursor { page: next, index: 0 };
            } else if let Some(last) = self.pages.get_mut(cursor.page).entries.pop() {
                self.pages.get_mut(next).entries.insert(0, last);
                self.reindex(next, 0);
            }
        }
        self.pages.get_mut(cursor.page).entries.insert(cursor.index as usize, Entry { handle, value });
        self.reindex(cursor.page, cursor.index);
        self.len += 1;
        handle
    }

    pub fn push_back(&mut self, value: T) -> Handle<T> {
        let mut cursor = self.end();
        self.insert_before(&mut cursor, value)
    }

    /// Removes the record at `cursor`, leaving `cursor` on the record after it
    pub fn remove_at(&mut self, cursor: &mut Cursor) -> T {
        let (prev, next, page_len) = {
            let page = self.page(cursor.page);
            (page.prev, page.next, page.entries.len())
        };
        debug_assert!((cursor.index as usize) < page_len, "removed past the end");
        let entry = if page_len == 1 && (prev != NULL_INDEX || next != NULL_INDEX) {
            let mut page = self.pages.free(cursor.page);
            self.unlink(prev, next);
            *cursor = if next != NULL_INDEX {
                Cursor { page: next, index: 0 }
            } else {
                Cursor { page: prev, index: self.page(prev).entries.len() as u32 }
            };
            page.entries.swap_remove(0)
        } else {
            let entry = self.pages.get_mut(cursor.page).entries.remove(cursor.index as usize);
            self.reindex(cursor.page, cursor.index);
            if cursor.index as usize == page_len - 1 && next != NULL_INDEX {
                *cursor = Cursor { page: next, index: 0 };
            }
            entry
        };
        self.handles.release(entry.handle);
        self.len -= 1;
        entry.value
    }

    pub fn remove(&mut self, handle: Handle<T>) -> T {
        let mut cursor = self.cursor_of(handle);
        self.remove_at(&mut cursor)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.iter_from(self.first())
    }

    pub fn iter_from(&self, cursor: Cursor) -> Iter<'_, T> {
        Iter { sequence: self, cursor }
    }

    fn page(&self, index: u32) -> &Page<T> {
        self.pages.get(index)
    }

    /// Returns the page after `page` if it has room, else splices in a new one
    fn open_following_page(&mut self, page: u32) -> u32 {
        let next = self.page(page).next;
        if next != NULL_INDEX && self.page(next).entries.len() < self.capacity {
            return next;
        }
        let inserted = self.pages.allocate(Page {
            prev: page,
            next,
            entries: Vec::with_capacity(self.capacity),
        });
        self.pages.get_mut(page).next = inserted;
        if next == NULL_INDEX {
            self.tail = inserted;
        } else {
            self.pages.get_mut(next).prev = inserted;
        }
        inserted
    }

    fn unlink(&mut self, prev: u32, next: u32) {
        if prev == NULL_INDEX {
            self.head = next;
        } else {
            self.pages.get_mut(prev).next = next;
        }
        if next == NULL_INDEX {
            self.tail = prev;
        } else {
            self.pages.get_mut(next).prev = prev;
        }
    }

    /// Rewrites the handle cells of every record on `page` from `from` on
    fn reindex(&mut self, page: u32, from: u32) {
        let entries = &self.pages.get(page).entries;
        for (index, entry) in entries.iter().enumerate().skip(from as usize) {
            self.handles.relocate(entry.handle, Location { page, index: index as u32 });
        }
    }
}

pub struct Iter<'a, T> {
    sequence: &'a PagedSequence<T>,
    cursor: Cursor,
}

impl<'a, T> Iter<'a, T> {
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle<T>, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let sequence = self.sequence;
        let entry = sequence.page(self.cursor.page).entries.get(self.cursor.index as usize)?;
        self.cursor = sequence.next(self.cursor);
        Some((entry.handle, &entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn create_test_sequence(capacity: usize) -> PagedSequence<u32> {
        PagedSequence::new(capacity, 1 << 12, 16)
    }

    /// Small deterministic generator so interleavings are reproducible
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, bound: usize) -> usize {
            (self.next() % bound as u64) as usize
        }
    }

    fn cursor_at(sequence: &PagedSequence<u32>, position: usize) -> Cursor {
        let mut cursor = sequence.first();
        for _ in 0..position {
            cursor = sequence.next(cursor);
        }
        cursor
    }

    fn values(sequence: &PagedSequence<u32>) -> Vec<u32> {
        sequence.iter().map(|(_, value)| *value).collect()
    }

    #[test]
    fn test_append_splits_pages() {
        let mut sequence = create_test_sequence(4);
        for value in 0..10 {
            sequence.push_back(value);
        }
        assert_eq!(values(&sequence), (0..10).collect::<Vec<_>>());
        assert_eq!(sequence.page_count(), 3);
        assert_eq!(sequence.len(), 10);
    }

    #[test]
    fn test_insert_into_full_page_migrates_last_record() {
        let mut sequence = create_test_sequence(4);
        let handles: Vec<_> = (0..4).map(|value| sequence.push_back(value)).collect();
        let mut cursor = sequence.cursor_of(handles[1]);
        let inserted = sequence.insert_before(&mut cursor, 99);

        assert_eq!(sequence.get(cursor), Some(&99));
        assert_eq!(values(&sequence), vec![0, 99, 1, 2, 3]);
        assert_eq!(sequence.page_count(), 2);
        // The displaced last record now lives at the head of the new page
        let moved = sequence.locate(handles[3]);
        assert_eq!(moved.index, 0);
        assert_ne!(moved.page, sequence.locate(handles[0]).page);
        assert_eq!(*sequence.resolve(inserted), 99);
    }

    #[test]
    fn test_insert_uses_room_on_next_page() {
        let mut sequence = create_test_sequence(4);
        for value in 0..6 {
            sequence.push_back(value);
        }
        assert_eq!(sequence.page_count(), 2);
        let mut cursor = cursor_at(&sequence, 0);
        sequence.insert_before(&mut cursor, 50);
        assert_eq!(sequence.page_count(), 2);
        assert_eq!(values(&sequence), vec![50, 0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_removing_only_record_unlinks_page() {
        let mut sequence = create_test_sequence(2);
        for value in 0..5 {
            sequence.push_back(value);
        }
        assert_eq!(sequence.page_count(), 3);
        let mut cursor = cursor_at(&sequence, 4);
        assert_eq!(sequence.remove_at(&mut cursor), 4);
        assert_eq!(sequence.page_count(), 2);
        assert!(sequence.is_end(cursor));

        let mut cursor = cursor_at(&sequence, 2);
        sequence.remove_at(&mut cursor);
        assert_eq!(sequence.get(cursor), Some(&3));
        assert_eq!(values(&sequence), vec![0, 1, 3]);
    }

    #[test]
    fn test_removing_last_on_page_moves_cursor_to_next_page() {
        let mut sequence = create_test_sequence(2);
        for value in 0..4 {
            sequence.push_back(value);
        }
        let mut cursor = cursor_at(&sequence, 1);
        assert_eq!(sequence.remove_at(&mut cursor), 1);
        assert_eq!(sequence.get(cursor), Some(&2));
    }

    #[test]
    fn test_sequence_can_be_emptied_and_refilled() {
        let mut sequence = create_test_sequence(2);
        let handles: Vec<_> = (0..5).map(|value| sequence.push_back(value)).collect();
        for handle in handles {
            sequence.remove(handle);
        }
        assert!(sequence.is_empty());
        assert_eq!(sequence.page_count(), 1);
        assert!(sequence.last().is_none());
        sequence.push_back(7);
        assert_eq!(values(&sequence), vec![7]);
    }

    #[test]
    fn test_forward_then_backward_returns_to_start() {
        let mut sequence = create_test_sequence(3);
        for value in 0..11 {
            sequence.push_back(value);
        }
        for start in 0..11 {
            for steps in 1..(11 - start) {
                let origin = cursor_at(&sequence, start);
                let mut cursor = origin;
                for _ in 0..steps {
                    cursor = sequence.next(cursor);
                }
                for _ in 0..steps {
                    cursor = sequence.prev(cursor).unwrap();
                }
                assert_eq!(cursor, origin);
            }
        }
        assert!(sequence.prev(sequence.first()).is_none());
    }

    #[test]
    fn test_handles_survive_random_interleaving() {
        let mut random = XorShift(0x9e37_79b9_7f4a_7c15);
        let mut sequence = create_test_sequence(4);
        let mut live: HashMap<u32, Handle<u32>> = HashMap::new();
        let mut order: Vec<u32> = Vec::new();
        let mut inserted = 0;
        let mut removed = 0;

        for step in 0..2000u32 {
            if order.is_empty() || random.below(3) != 0 {
                let position = random.below(order.len() + 1);
                let mut cursor = cursor_at(&sequence, position);
                let handle = sequence.insert_before(&mut cursor, step);
                assert_eq!(sequence.get(cursor), Some(&step));
                order.insert(position, step);
                live.insert(step, handle);
                inserted += 1;
            } else {
                let position = random.below(order.len());
                let mut cursor = cursor_at(&sequence, position);
                let value = sequence.remove_at(&mut cursor);
                assert_eq!(value, order.remove(position));
                live.remove(&value);
                removed += 1;
                assert_eq!(sequence.get(cursor), order.get(position));
            }
            if step % 97 == 0 {
                for (value, handle) in &live {
                    *sequence.resolve_mut(*handle) = *value;
                }
            }
        }

        assert_eq!(sequence.len(), inserted - removed);
        assert_eq!(values(&sequence), order);
        for (value, handle) in &live {
            assert_eq!(sequence.resolve(*handle), value);
            let cursor = sequence.cursor_of(*handle);
            assert_eq!(sequence.handle_at(cursor), Some(*handle));
        }
    }
}
