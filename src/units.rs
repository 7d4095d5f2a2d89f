// src/units.rs
//! Conversion between on-chain token units and decimal display strings.
//!
//! Amounts cross the contract boundary as integers with 18 fractional
//! decimal digits. They stay integers until the last moment; only display
//! aggregates are allowed to go through `f64`.

use crate::error::StakeError;

/// Fractional digits of the staking token (and of the native currency)
pub const TOKEN_DECIMALS: u32 = 18;

const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Parse a decimal string such as `"100"` or `"0.25"` into token units
pub fn parse_units(amount: &str) -> Result<u128, StakeError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(StakeError::InvalidAmount("amount is empty".to_string()));
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(StakeError::InvalidAmount(format!("'{}' is not a number", amount)));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(StakeError::InvalidAmount(format!("'{}' is not a number", amount)));
    }
    if fraction.len() > TOKEN_DECIMALS as usize {
        return Err(StakeError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            amount, TOKEN_DECIMALS
        )));
    }

    let overflow = || StakeError::InvalidAmount(format!("'{}' is too large", amount));

    let whole_units = if whole.is_empty() {
        0u128
    } else {
        whole.parse::<u128>().map_err(|_| overflow())?
    };

    let mut fraction_units = 0u128;
    if !fraction.is_empty() {
        let padded = format!("{:0<width$}", fraction, width = TOKEN_DECIMALS as usize);
        fraction_units = padded.parse::<u128>().map_err(|_| overflow())?;
    }

    whole_units
        .checked_mul(ONE_TOKEN)
        .and_then(|w| w.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// Format token units as a decimal string, always keeping one fractional digit
///
/// `100 * 10^18` becomes `"100.0"`, `15 * 10^17` becomes `"1.5"`.
pub fn format_units(units: u128) -> String {
    let whole = units / ONE_TOKEN;
    let fraction = units % ONE_TOKEN;

    let mut fraction_str = format!("{:018}", fraction);
    while fraction_str.len() > 1 && fraction_str.ends_with('0') {
        fraction_str.pop();
    }

    format!("{}.{}", whole, fraction_str)
}

/// Lossy conversion for display aggregates
pub fn units_to_f64(units: u128) -> f64 {
    units as f64 / ONE_TOKEN as f64
}

/// Parse a display string leniently; anything unparseable counts as zero
pub fn parse_display_amount(amount: &str) -> f64 {
    amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Format a display value with a fixed number of decimals
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}", value, decimals = decimals)
}

/// Format a token amount with its symbol, e.g. `"12.50 SPC"`
pub fn format_token(value: f64, decimals: usize, symbol: &str) -> String {
    format!("{} {}", format_fixed(value, decimals), symbol)
}
