//! Stable handles
//!
//! A [`Handle`] indexes an indirection cell holding the current [`Location`]
//! of a record. Whoever moves a record rewrites its cell in the same step, so
//! a handle stays valid across relocation until the record is freed. Handles
//! carry no generation: resolving one after its record is freed is a bug in
//! the caller.

use super::arena::{Arena, NULL_INDEX};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::NonZeroU32;

/// Physical position of a record inside a paged sequence
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub page: u32,
    pub index: u32,
}

impl Location {
    pub const NULL: Location = Location { page: NULL_INDEX, index: 0 };
}

/// Typed stable reference to a record of type `T`
pub struct Handle<T> {
    cell: NonZeroU32,
    _record: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn from_cell(cell: u32) -> Self {
        match NonZeroU32::new(cell) {
            Some(cell) => Self { cell, _record: PhantomData },
            None => unreachable!("cell 0 is the null slot"),
        }
    }

    pub fn index(self) -> u32 {
        self.cell.get()
    }

    /// Rebuilds a handle from an index previously returned by [`index`](Self::index)
    pub fn from_index(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(|cell| Self { cell, _record: PhantomData })
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.cell)
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.cell.get())
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u32::deserialize(deserializer)?;
        Handle::from_index(index).ok_or_else(|| serde::de::Error::custom("handle 0 is null"))
    }
}

/// Pool of indirection cells for one record type
#[derive(Debug, Clone)]
pub struct HandleTable<T> {
    cells: Arena<Location>,
    _record: PhantomData<fn() -> T>,
}

impl<T> HandleTable<T> {
    pub fn new(reserved: usize, commit_step: usize) -> Self {
        Self { cells: Arena::new(reserved, commit_step), _record: PhantomData }
    }

    pub fn issue(&mut self, location: Location) -> Handle<T> {
        Handle::from_cell(self.cells.allocate(location))
    }

    pub fn resolve(&self, handle: Handle<T>) -> Location {
        *self.cells.get(handle.index())
    }

    pub fn relocate(&mut self, handle: Handle<T>, location: Location) {
        *self.cells.get_mut(handle.index()) = location;
    }

    pub fn release(&mut self, handle: Handle<T>) {
        self.cells.free(handle.index());
    }

    pub fn is_live(&self, handle: Handle<T>) -> bool {
        self.cells.contains(handle.index())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
