//! # Amount Codec
//!
//! Lossless conversion between the display denomination (`"1.5"` XYM) and
//! atomic units (`1_500_000`). The network only ever sees atomic units; the
//! display form exists for humans.
//!
//! No floating point anywhere near money. Both directions are pure integer
//! and string arithmetic, so `to_atomic(&to_display(x)) == Ok(x)` holds for
//! every `u64`.
//!
//! Parsing is strict. Inputs with more than six fractional digits are
//! rejected instead of truncated, so a user who typed `1.1234567` finds out
//! rather than silently sending `1.123456`.

use thiserror::Error;

use crate::config::{ATOMIC_UNITS_PER_DISPLAY_UNIT, CURRENCY_DIVISIBILITY};

/// Smallest indivisible currency unit.
pub type AtomicAmount = u64;

/// Reasons a display string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount '{0}' has more than one decimal point")]
    MultipleDecimalPoints(String),

    #[error("amount '{0}' contains a non-digit character")]
    InvalidCharacter(String),

    #[error("amount '{0}' is missing digits around the decimal point")]
    MissingDigits(String),

    #[error("amount '{input}' has {digits} fractional digits (max {max})")]
    TooManyDecimals {
        input: String,
        digits: usize,
        max: u32,
    },

    #[error("amount '{0}' exceeds the maximum representable value")]
    Overflow(String),
}

/// Formats an atomic amount in the display denomination.
///
/// Trailing fractional zeros are stripped and the decimal point is dropped
/// entirely for whole amounts: `1_000_000 -> "1"`, `1_500_000 -> "1.5"`,
/// `1 -> "0.000001"`.
pub fn to_display(atomic: AtomicAmount) -> String {
    let whole = atomic / ATOMIC_UNITS_PER_DISPLAY_UNIT;
    let frac = atomic % ATOMIC_UNITS_PER_DISPLAY_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", frac, width = CURRENCY_DIVISIBILITY as usize);
    format!("{}.{}", whole, padded.trim_end_matches('0'))
}

/// Parses a display-denominated decimal string into atomic units.
///
/// Accepts `digits` or `digits.digits` with at most six fractional digits.
/// Signs, whitespace, exponents and separators are all rejected.
pub fn to_atomic(display: &str) -> Result<AtomicAmount, AmountError> {
    if display.is_empty() {
        return Err(AmountError::Empty);
    }

    let mut parts = display.split('.');
    let integer = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(AmountError::MultipleDecimalPoints(display.to_string()));
    }

    if integer.is_empty() || fraction.is_some_and(str::is_empty) {
        return Err(AmountError::MissingDigits(display.to_string()));
    }

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !fraction.map_or(true, all_digits) {
        return Err(AmountError::InvalidCharacter(display.to_string()));
    }

    let overflow = || AmountError::Overflow(display.to_string());
    let whole: u64 = integer.parse().map_err(|_| overflow())?;

    let frac: u64 = match fraction {
        None => 0,
        Some(f) if f.len() > CURRENCY_DIVISIBILITY as usize => {
            return Err(AmountError::TooManyDecimals {
                input: display.to_string(),
                digits: f.len(),
                max: CURRENCY_DIVISIBILITY,
            });
        }
        Some(f) => {
            let padded = format!("{:0<width$}", f, width = CURRENCY_DIVISIBILITY as usize);
            padded.parse().map_err(|_| overflow())?
        }
    };

    whole
        .checked_mul(ATOMIC_UNITS_PER_DISPLAY_UNIT)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(overflow)
}
