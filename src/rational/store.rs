//! Long-lived storage for rationals kept inside slices
//!
//! Intermediate rationals are ordinary owned values that die with the scope
//! that computed them. A duration retained by a slice is copied in here
//! instead: limbs of single-limb integers (nearly every duration) go to a
//! pooled arena, longer ones to the heap. Stored values are move-only and
//! must be handed back to [`RationalStore::release`].

use super::fraction::Rational;
use super::integer::Integer;
use crate::config::EngineConfig;
use crate::memory::Arena;

#[derive(Debug)]
pub enum StoredInteger {
    Pooled(u32),
    Heap(Box<[u32]>),
}

#[derive(Debug)]
pub struct StoredRational {
    numerator: StoredInteger,
    denominator: StoredInteger,
}

#[derive(Debug)]
pub struct RationalStore {
    single_limbs: Arena<u32>,
    heap_values: usize,
}

impl RationalStore {
    pub fn new(reserved: usize, commit_step: usize) -> Self {
        Self { single_limbs: Arena::new(reserved, commit_step), heap_values: 0 }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new(config.reserved_slots, config.commit_slots)
    }

    pub fn persist(&mut self, value: &Rational) -> StoredRational {
        StoredRational {
            numerator: self.persist_integer(value.numerator()),
            denominator: self.persist_integer(value.denominator()),
        }
    }

    pub fn load(&self, stored: &StoredRational) -> Rational {
        Rational::new(self.load_integer(&stored.numerator), self.load_integer(&stored.denominator))
    }

    pub fn release(&mut self, stored: StoredRational) {
        self.release_integer(stored.numerator);
        self.release_integer(stored.denominator);
    }

    /// Stores `value` in place of `stored`, releasing the old value
    pub fn replace(&mut self, stored: &mut StoredRational, value: &Rational) {
        let previous = std::mem::replace(stored, self.persist(value));
        self.release(previous);
    }

    /// Number of integers currently held, pooled and heap together
    pub fn live_integers(&self) -> usize {
        self.single_limbs.len() + self.heap_values
    }

    fn persist_integer(&mut self, value: &Integer) -> StoredInteger {
        match value.limbs() {
            [] => StoredInteger::Pooled(self.single_limbs.allocate(0)),
            [limb] => StoredInteger::Pooled(self.single_limbs.allocate(*limb)),
            limbs => {
                self.heap_values += 1;
                StoredInteger::Heap(limbs.into())
            }
        }
    }

    fn load_integer(&self, stored: &StoredInteger) -> Integer {
        match stored {
            StoredInteger::Pooled(index) => Integer::from_u32(*self.single_limbs.get(*index)),
            StoredInteger::Heap(limbs) => Integer::from_limbs(limbs.to_vec()),
        }
    }

    fn release_integer(&mut self, stored: StoredInteger) {
        match stored {
            StoredInteger::Pooled(index) => {
                self.single_limbs.free(index);
            }
            StoredInteger::Heap(_) => self.heap_values -= 1,
        }
    }
}
