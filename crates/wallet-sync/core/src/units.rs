//! Exact conversion between base units (wei, lamports) and display units (ETH, SOL).

use alloy_primitives::{
    U256,
    utils::{ParseUnits, Unit},
};

use crate::error::MalformedEventError;

/// Formats a base unit amount in display units, without trailing fractional zeros.
///
/// ```
/// use alloy_primitives::{U256, utils::Unit};
/// use wallet_sync_core::units::format_units;
///
/// assert_eq!(format_units(U256::from(500_000_000u64), Unit::GWEI), "0.5");
/// assert_eq!(format_units(U256::from(2_000_000_000_000_000_000u128), Unit::ETHER), "2");
/// ```
pub fn format_units(value: U256, unit: Unit) -> String {
    let mut formatted = ParseUnits::U256(value).format_units(unit);
    if formatted.contains('.') {
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.').len();
        formatted.truncate(trimmed);
    }
    formatted
}

/// Parses an amount into base units.
///
/// Integers are base units (`0x` hex is accepted when `allow_hex` is set), decimals are display
/// units and may not carry more fractional digits than the unit has.
pub fn parse_amount(input: &str, unit: Unit, allow_hex: bool) -> Result<U256, MalformedEventError> {
    let s = input.trim();
    if s.starts_with('-') {
        return Err(MalformedEventError::NegativeAmount(input.to_string()))
    }
    let non_numeric = || MalformedEventError::NonNumericAmount(input.to_string());

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if !allow_hex || hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(non_numeric())
        }
        return U256::from_str_radix(hex, 16)
            .map_err(|_| MalformedEventError::AmountOutOfRange(input.to_string()))
    }

    match s.split_once('.') {
        None => {
            if s.is_empty() || !is_digits(s) {
                return Err(non_numeric())
            }
            U256::from_str_radix(s, 10)
                .map_err(|_| MalformedEventError::AmountOutOfRange(input.to_string()))
        }
        Some((int, frac)) => parse_decimal(input, int, frac, unit),
    }
}

/// Parses an amount that is always in display units, e.g. `"1"` is one ETH, not one wei.
///
/// Hex is rejected.
pub fn parse_display_amount(input: &str, unit: Unit) -> Result<U256, MalformedEventError> {
    let s = input.trim();
    if s.starts_with('-') {
        return Err(MalformedEventError::NegativeAmount(input.to_string()))
    }
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    parse_decimal(input, int, frac, unit)
}

fn is_digits(part: &str) -> bool {
    part.bytes().all(|b| b.is_ascii_digit())
}

fn parse_decimal(input: &str, int: &str, frac: &str, unit: Unit) -> Result<U256, MalformedEventError> {
    if (int.is_empty() && frac.is_empty()) || !is_digits(int) || !is_digits(frac) {
        return Err(MalformedEventError::NonNumericAmount(input.to_string()))
    }
    if frac.len() > unit.get() as usize {
        return Err(MalformedEventError::ExcessPrecision { amount: input.to_string(), decimals: unit.get() })
    }
    let int = if int.is_empty() { "0" } else { int };
    let canonical = if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") };
    match ParseUnits::parse_units(&canonical, unit) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(MalformedEventError::NegativeAmount(input.to_string())),
        Err(_) => Err(MalformedEventError::AmountOutOfRange(input.to_string())),
    }
}

/// Normalizes an amount given in either base or display units into display units.
pub fn normalize_amount(input: &str, unit: Unit, allow_hex: bool) -> Result<String, MalformedEventError> {
    parse_amount(input, unit, allow_hex).map(|value| format_units(value, unit))
}
