//! Exact non-negative fractions of [`Integer`]s
//!
//! Musical time is measured in whole notes. Every duration the editor can
//! produce is dyadic, but sums across staves need not stay small, so both
//! terms are arbitrary precision and every result is reduced.

use super::integer::Integer;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// Shortest and longest representable durations, as `log2` of whole notes
pub const MIN_LOG2_DURATION: i8 = -10;
pub const MAX_LOG2_DURATION: i8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: Integer,
    denominator: Integer,
}

impl Rational {
    /// Builds a reduced fraction; the denominator must be nonzero
    pub fn new(numerator: Integer, denominator: Integer) -> Self {
        debug_assert!(!denominator.is_zero(), "zero denominator");
        let mut value = Self { numerator, denominator };
        value.reduce();
        value
    }

    pub fn from_integer(value: Integer) -> Self {
        Self { numerator: value, denominator: Integer::one() }
    }

    pub fn from_ratio(numerator: u64, denominator: u64) -> Self {
        Self::new(Integer::from_u64(numerator), Integer::from_u64(denominator))
    }

    pub fn zero() -> Self {
        Self::from_integer(Integer::zero())
    }

    pub fn one() -> Self {
        Self::from_integer(Integer::one())
    }

    /// `2^exponent` whole notes
    pub fn power_of_two(exponent: i32) -> Self {
        if exponent >= 0 {
            Self::from_integer(Integer::power_of_two(exponent as u32))
        } else {
            Self { numerator: Integer::one(), denominator: Integer::power_of_two(-exponent as u32) }
        }
    }

    pub fn numerator(&self) -> &Integer {
        &self.numerator
    }

    pub fn denominator(&self) -> &Integer {
        &self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    fn reduce(&mut self) {
        let divisor = self.numerator.gcd(&self.denominator);
        if !divisor.is_one() && !divisor.is_zero() {
            self.numerator = self.numerator.divide(&divisor).quotient;
            self.denominator = self.denominator.divide(&divisor).quotient;
        }
    }

    pub fn add(&self, other: &Rational) -> Rational {
        if self.denominator == other.denominator {
            return Rational::new(&self.numerator + &other.numerator, self.denominator.clone());
        }
        Rational::new(
            &(&self.numerator * &other.denominator) + &(&other.numerator * &self.denominator),
            &self.denominator * &other.denominator,
        )
    }

    /// Requires `self >= other`
    pub fn subtract(&self, other: &Rational) -> Rational {
        debug_assert!(self >= other, "rational subtraction would underflow");
        if self.denominator == other.denominator {
            return Rational::new(&self.numerator - &other.numerator, self.denominator.clone());
        }
        Rational::new(
            &(&self.numerator * &other.denominator) - &(&other.numerator * &self.denominator),
            &self.denominator * &other.denominator,
        )
    }

    /// Binary expansion of the quotient, accurate to the `f64` mantissa
    pub fn to_f64(&self) -> f64 {
        let division = self.numerator.divide(&self.denominator);
        let mut value = division.quotient.to_f64();
        let mut remainder = division.remainder;
        let mut place_value = 0.5;
        while !remainder.is_zero() && place_value > f64::EPSILON * value.max(1.0) / 2.0 {
            let step = remainder.double().divide(&self.denominator);
            if !step.quotient.is_zero() {
                value += place_value;
            }
            remainder = step.remainder;
            place_value /= 2.0;
        }
        value
    }
}

/// Exact length of a duration with `log2` whole notes and `dots` augmentation dots
///
/// Each dot adds half of the previous addition, so the length is
/// `2^log2 * (2^(dots + 1) - 1) / 2^dots`.
pub fn whole_notes_long(log2: i8, dots: u8) -> Rational {
    let dotted = Integer::power_of_two(dots as u32 + 1).subtract(&Integer::one());
    if log2 >= 0 {
        Rational::new(dotted.shift_left(log2 as u32), Integer::power_of_two(dots as u32))
    } else {
        Rational::new(dotted, Integer::power_of_two(dots as u32 + (-log2) as u32))
    }
}

impl Ord for Rational {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.denominator == other.denominator {
            return self.numerator.cmp(&other.numerator);
        }
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl PartialOrd for Rational {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for &Rational {
    type Output = Rational;

    fn add(self, other: &Rational) -> Rational {
        Rational::add(self, other)
    }
}

impl Sub for &Rational {
    type Output = Rational;

    fn sub(self, other: &Rational) -> Rational {
        self.subtract(other)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
