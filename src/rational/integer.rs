//! Arbitrary-precision unsigned integers
//!
//! Magnitudes are little-endian `u32` limbs with no trailing zero limbs, so
//! an empty limb vector is zero and two equal values always have equal limbs.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Integer {
    limbs: Vec<u32>,
}

/// Quotient and remainder of [`Integer::divide`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Division {
    pub quotient: Integer,
    pub remainder: Integer,
}

impl Integer {
    pub fn zero() -> Self {
        Self { limbs: Vec::new() }
    }

    pub fn one() -> Self {
        Self::from_u32(1)
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_limbs(vec![value])
    }

    pub fn from_u64(value: u64) -> Self {
        Self::from_limbs(vec![value as u32, (value >> 32) as u32])
    }

    pub fn from_limbs(limbs: Vec<u32>) -> Self {
        let mut integer = Self { limbs };
        integer.trim();
        integer
    }

    /// `2^exponent`
    pub fn power_of_two(exponent: u32) -> Self {
        let mut limbs = vec![0; exponent as usize / 32 + 1];
        limbs[exponent as usize / 32] = 1 << (exponent % 32);
        Self { limbs }
    }

    pub fn limbs(&self) -> &[u32] {
        &self.limbs
    }

    pub fn limb_count(&self) -> usize {
        self.limbs.len()
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.limbs == [1]
    }

    pub fn to_u64(&self) -> Option<u64> {
        match self.limbs[..] {
            [] => Some(0),
            [low] => Some(low as u64),
            [low, high] => Some(low as u64 | (high as u64) << 32),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> f64 {
        self.limbs.iter().rev().fold(0.0, |value, limb| value * 4_294_967_296.0 + *limb as f64)
    }

    pub fn bit_length(&self) -> u32 {
        match self.limbs.last() {
            Some(top) => (self.limbs.len() as u32 - 1) * 32 + (32 - top.leading_zeros()),
            None => 0,
        }
    }

    pub fn is_even(&self) -> bool {
        self.limbs.first().map_or(true, |low| low & 1 == 0)
    }

    fn trim(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    /// Ripple-carry addition
    pub fn add(&self, other: &Integer) -> Integer {
        let (long, short) = if self.limbs.len() >= other.limbs.len() {
            (&self.limbs, &other.limbs)
        } else {
            (&other.limbs, &self.limbs)
        };
        let mut limbs = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u64;
        for (index, limb) in long.iter().enumerate() {
            let sum = *limb as u64 + short.get(index).copied().unwrap_or(0) as u64 + carry;
            limbs.push(sum as u32);
            carry = sum >> 32;
        }
        if carry != 0 {
            limbs.push(carry as u32);
        }
        Integer { limbs }
    }

    /// Adds the two's complement of `other`, sized to `self`, and drops the
    /// carry out. Requires `self >= other`.
    pub fn subtract(&self, other: &Integer) -> Integer {
        debug_assert!(self >= other, "subtraction would underflow");
        let mut limbs = Vec::with_capacity(self.limbs.len());
        let mut carry = 1u64;
        for (index, limb) in self.limbs.iter().enumerate() {
            let complement = !other.limbs.get(index).copied().unwrap_or(0);
            let sum = *limb as u64 + complement as u64 + carry;
            limbs.push(sum as u32);
            carry = sum >> 32;
        }
        Integer::from_limbs(limbs)
    }

    /// Schoolbook multiplication with a 64-bit intermediate per limb pair
    pub fn multiply(&self, other: &Integer) -> Integer {
        if self.is_zero() || other.is_zero() {
            return Integer::zero();
        }
        let mut limbs = vec![0u32; self.limbs.len() + other.limbs.len()];
        for (i, a) in self.limbs.iter().enumerate() {
            let mut carry = 0u64;
            for (j, b) in other.limbs.iter().enumerate() {
                let product = *a as u64 * *b as u64 + limbs[i + j] as u64 + carry;
                limbs[i + j] = product as u32;
                carry = product >> 32;
            }
            limbs[i + other.limbs.len()] = carry as u32;
        }
        Integer::from_limbs(limbs)
    }

    /// Restoring binary long division
    pub fn divide(&self, divisor: &Integer) -> Division {
        debug_assert!(!divisor.is_zero(), "division by zero");
        if self < divisor {
            return Division { quotient: Integer::zero(), remainder: self.clone() };
        }
        let shift = self.bit_length() - divisor.bit_length();
        let mut aligned = divisor.shift_left(shift);
        let mut remainder = self.clone();
        let mut quotient = vec![0u32; shift as usize / 32 + 1];
        for bit in (0..=shift).rev() {
            if remainder >= aligned {
                remainder = remainder.subtract(&aligned);
                quotient[bit as usize / 32] |= 1 << (bit % 32);
            }
            aligned = aligned.halve();
        }
        Division { quotient: Integer::from_limbs(quotient), remainder }
    }

    pub fn shift_left(&self, bits: u32) -> Integer {
        if self.is_zero() {
            return Integer::zero();
        }
        let limb_shift = bits as usize / 32;
        let bit_shift = bits % 32;
        let mut limbs = vec![0u32; limb_shift];
        limbs.reserve(self.limbs.len() + 1);
        let mut carry = 0u32;
        for limb in &self.limbs {
            if bit_shift == 0 {
                limbs.push(*limb);
            } else {
                limbs.push(limb << bit_shift | carry);
                carry = limb >> (32 - bit_shift);
            }
        }
        limbs.push(carry);
        Integer::from_limbs(limbs)
    }

    pub fn double(&self) -> Integer {
        self.shift_left(1)
    }

    pub fn halve(&self) -> Integer {
        let mut limbs = self.limbs.clone();
        let mut carry = 0u32;
        for limb in limbs.iter_mut().rev() {
            let low_bit = *limb & 1;
            *limb = *limb >> 1 | carry << 31;
            carry = low_bit;
        }
        Integer::from_limbs(limbs)
    }

    /// Greatest common divisor by repeated Euclidean division
    pub fn gcd(&self, other: &Integer) -> Integer {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let remainder = a.divide(&b).remainder;
            a = b;
            b = remainder;
        }
        a
    }
}

impl Ord for Integer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl PartialOrd for Integer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u32> for Integer {
    fn from(value: u32) -> Self {
        Integer::from_u32(value)
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Integer::from_u64(value)
    }
}

impl Add for &Integer {
    type Output = Integer;

    fn add(self, other: &Integer) -> Integer {
        Integer::add(self, other)
    }
}

impl Sub for &Integer {
    type Output = Integer;

    fn sub(self, other: &Integer) -> Integer {
        self.subtract(other)
    }
}

impl Mul for &Integer {
    type Output = Integer;

    fn mul(self, other: &Integer) -> Integer {
        self.multiply(other)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let chunk = Integer::from_u32(1_000_000_000);
        let mut chunks = Vec::new();
        let mut rest = self.clone();
        while !rest.is_zero() {
            let division = rest.divide(&chunk);
            chunks.push(division.remainder.to_u64().unwrap_or(0));
            rest = division.quotient;
        }
        let mut chunks = chunks.into_iter().rev();
        if let Some(first) = chunks.next() {
            write!(f, "{}", first)?;
        }
        for chunk in chunks {
            write!(f, "{:09}", chunk)?;
        }
        Ok(())
    }
}
