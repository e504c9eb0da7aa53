//! Arbitrary-precision decimals and the order-preserving key-space mapper.
//!
//! Non-numeric keys are split by reading a symbol sequence `s0 s1 .. sn` as the
//! fraction `0.s0 s1 .. sn` in base `B`, splitting that interval numerically
//! and reading the cut points back as symbols.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

use crate::Result;
use igloo_common::Error;

/// Magnitudes the store can hold: `1e-130 <= |n| < 1e126`.
const MIN_ADJUSTED_EXPONENT: i64 = -130;
const MAX_ADJUSTED_EXPONENT: i64 = 125;

///
/// KeyDecimal
///
/// Fixed-point decimal: `value == mantissa * 10^-scale`.
/// The mantissa carries the sign. Equality and ordering are by value, so
/// `0.0 == 0`.
///

#[derive(Debug, Clone, Default)]
pub struct KeyDecimal {
    mantissa: BigInt,
    scale: u32,
}

impl KeyDecimal {
    pub fn new(mantissa: impl Into<BigInt>, scale: u32) -> Self {
        Self { mantissa: mantissa.into(), scale }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_u64(n: u64) -> Self {
        Self::new(n, 0)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.is_negative()
    }

    /// Mantissa rescaled to `scale`, which must not be below `self.scale`.
    fn mantissa_at(&self, scale: u32) -> BigInt {
        &self.mantissa * pow10(scale - self.scale)
    }

    /// Multiplies by a small integer; exact.
    pub fn mul_u32(&self, factor: u32) -> Self {
        Self::new(&self.mantissa * BigInt::from(factor), self.scale)
    }

    /// Integer part, truncated toward zero.
    pub fn trunc(&self) -> BigInt {
        &self.mantissa / pow10(self.scale)
    }

    /// Divides by a positive integer.
    ///
    /// The quotient is exact whenever its expansion terminates within
    /// `max_scale` fractional digits (or the dividend's own scale, if larger);
    /// otherwise it is rounded half-up at that scale.
    pub fn div_int(&self, divisor: &BigInt, max_scale: u32) -> Result<Self> {
        if !divisor.is_positive() {
            return Err(Error::Arithmetic(format!("division by non-positive divisor {divisor}")));
        }
        let scale = max_scale.max(self.scale);
        let shifted = self.mantissa_at(scale);
        let mut quotient = &shifted / divisor;
        let remainder = &shifted % divisor;
        if !remainder.is_zero() {
            let doubled: BigInt = remainder.abs() * 2u32;
            if &doubled >= divisor {
                if shifted.is_negative() {
                    quotient -= 1u32;
                } else {
                    quotient += 1u32;
                }
            }
        }
        Ok(Self::new(quotient, scale).normalized())
    }

    /// Drops trailing fractional zeros.
    pub fn normalized(&self) -> Self {
        let ten = BigInt::from(10u32);
        let mut mantissa = self.mantissa.clone();
        let mut scale = self.scale;
        while scale > 0 && (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            scale -= 1;
        }
        Self { mantissa, scale }
    }
}

fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u32), exp as usize)
}

impl PartialEq for KeyDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyDecimal {}

impl PartialOrd for KeyDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        self.mantissa_at(scale).cmp(&other.mantissa_at(scale))
    }
}

impl Add for &KeyDecimal {
    type Output = KeyDecimal;

    fn add(self, rhs: &KeyDecimal) -> KeyDecimal {
        let scale = self.scale.max(rhs.scale);
        KeyDecimal::new(self.mantissa_at(scale) + rhs.mantissa_at(scale), scale)
    }
}

impl Sub for &KeyDecimal {
    type Output = KeyDecimal;

    fn sub(self, rhs: &KeyDecimal) -> KeyDecimal {
        let scale = self.scale.max(rhs.scale);
        KeyDecimal::new(self.mantissa_at(scale) - rhs.mantissa_at(scale), scale)
    }
}

impl FromStr for KeyDecimal {
    type Err = Error;

    /// Accepts `[+-]digits[.digits][(e|E)[+-]digits]`, the store's number syntax.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Parse(format!("invalid number {s:?}"));

        let trimmed = s.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (coefficient, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => {
                let exp = body[idx + 1..].parse::<i64>().map_err(|_| invalid())?;
                (&body[..idx], exp)
            }
            None => (body, 0),
        };
        let (int_part, frac_part) = match coefficient.split_once('.') {
            Some((i, f)) => (i, f),
            None => (coefficient, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{int_part}{frac_part}");
        let scale = (frac_part.len() as i64).checked_sub(exponent).ok_or_else(invalid)?;
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            let scale = scale.clamp(0, -MIN_ADJUSTED_EXPONENT) as u32;
            return Ok(Self::new(0, scale));
        }
        let adjusted = significant.len() as i64 - 1 - scale;
        if !(MIN_ADJUSTED_EXPONENT..=MAX_ADJUSTED_EXPONENT).contains(&adjusted) {
            return Err(Error::Parse(format!("number {s:?} is outside the store's range")));
        }

        let mut mantissa = BigInt::parse_bytes(significant.as_bytes(), 10).ok_or_else(invalid)?;
        if negative {
            mantissa = -mantissa;
        }
        if scale >= 0 {
            let scale = u32::try_from(scale).map_err(|_| invalid())?;
            Ok(Self::new(mantissa, scale))
        } else {
            let shift = u32::try_from(-scale).map_err(|_| invalid())?;
            Ok(Self::new(mantissa * pow10(shift), 0))
        }
    }
}

impl fmt::Display for KeyDecimal {
    /// Plain notation, never exponent form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.abs().to_str_radix(10);
        let sign = if self.mantissa.sign() == Sign::Minus { "-" } else { "" };
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale + 1 - digits.len()))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

///
/// Radix
///
/// Order-preserving mapping between symbol sequences and fractions in `[0, 1)`.
///
/// Only the first `max_symbols` symbols are encoded; longer inputs lose their
/// tail, which bounds the precision needed for the fractions. Decoding stops
/// at the first zero symbol, so sequences with an embedded zero do not
/// round-trip.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Radix {
    base: u32,
    max_symbols: usize,
}

impl Radix {
    /// Base 256 over characters, eight symbols deep.
    pub const TEXT: Radix = Radix { base: 256, max_symbols: 8 };

    /// Base 256 over bytes, sixteen symbols deep.
    pub const BINARY: Radix = Radix { base: 256, max_symbols: 16 };

    /// `base` must divide 256 for encodings to stay exact.
    pub const fn new(base: u32, max_symbols: usize) -> Self {
        Self { base, max_symbols }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    /// Encodes `sum(symbols[i] / base^(i+1))` over the first `max_symbols`.
    ///
    /// Symbols at or above the base saturate to `base - 1`.
    pub fn encode(&self, symbols: &[u32]) -> Result<KeyDecimal> {
        let len = symbols.len().min(self.max_symbols);
        let base = BigInt::from(self.base);
        let top = self.base - 1;

        let numerator = symbols[..len]
            .iter()
            .fold(BigInt::zero(), |acc, &symbol| acc * &base + symbol.min(top));
        let denominator = num_traits::pow(base, len);

        KeyDecimal::new(numerator, 0).div_int(&denominator, self.exact_scale())
    }

    /// Reads symbols back out of a fraction produced by [`Radix::encode`] or
    /// interpolated between two such fractions.
    pub fn decode(&self, value: &KeyDecimal) -> Result<Vec<u32>> {
        if value.is_negative() || value >= &KeyDecimal::from_u64(1) {
            return Err(Error::Arithmetic(format!("{value} is outside the key space [0, 1)")));
        }

        let mut symbols = Vec::with_capacity(self.max_symbols);
        let mut cur = value.normalized();
        while symbols.len() < self.max_symbols {
            cur = cur.mul_u32(self.base);
            let digit = cur.trunc();
            let symbol = digit
                .to_u32()
                .ok_or_else(|| Error::Arithmetic(format!("symbol {digit} overflows")))?;
            if symbol == 0 {
                break;
            }
            cur = &cur - &KeyDecimal::new(digit, 0);
            symbols.push(symbol);
        }
        Ok(symbols)
    }

    /// Fraction digits needed to hold `1 / base^max_symbols` exactly.
    fn exact_scale(&self) -> u32 {
        8 * self.max_symbols as u32
    }
}

/// Length of the longest common prefix of two sequences.
pub fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
