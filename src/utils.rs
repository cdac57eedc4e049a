//! Input validation and amount helpers shared by the bot front-ends.

use std::str::FromStr;

use ethers_core::types::{Address, U256};

use crate::error::BotError;

/// Punctuation stripped from words before they are matched as addresses or numbers.
const WORD_PUNCTUATION: &[char] = &[',', ';', ':', '!', '?', '(', ')', '"', '\''];

/// Returns true iff `s` is "0x" followed by exactly 40 hex digits (either case).
///
/// No checksum verification is done.
pub fn is_valid_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Parses `s` into an [`Address`], failing with `InvalidAddress` unless [`is_valid_address`] holds.
pub fn parse_address(s: &str) -> Result<Address, BotError> {
    if !is_valid_address(s) {
        return Err(BotError::InvalidAddress);
    }
    Address::from_str(s).map_err(|_| BotError::InvalidAddress)
}

/// Address-shaped words of `text`, in order of appearance.
pub fn find_addresses(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|word| word.trim_matches(WORD_PUNCTUATION).trim_end_matches('.'))
        .filter(|word| is_valid_address(word))
        .collect()
}

/// Number-shaped words of `text` (digits with at most one decimal point), in order of appearance.
pub fn find_numbers(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|word| word.trim_matches(WORD_PUNCTUATION))
        .filter(|word| split_decimal(word).is_some())
        .collect()
}

/// Splits a non-negative decimal literal into its whole and fractional digit runs.
fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (whole, frac) = match s.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if digits(whole) && digits(frac) {
        Some((whole, frac))
    } else {
        None
    }
}

/// Converts a user-facing decimal amount to base units (`amount * 10^decimals`).
///
/// Fractional digits beyond `decimals` are truncated. Signs, exponents and
/// anything that is not a plain decimal literal are rejected.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, BotError> {
    let amount = amount.trim();
    let invalid = || BotError::InvalidAmount(amount.to_string());
    let (whole, frac) = split_decimal(amount).ok_or_else(invalid)?;

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    if frac.len() >= decimals {
        digits.push_str(&frac[..decimals]);
    } else {
        digits.push_str(frac);
        digits.extend(std::iter::repeat('0').take(decimals - frac.len()));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| invalid())
}

/// Renders a base-unit amount with `decimals` fractional digits, trailing zeros trimmed.
pub fn format_token_amount(value: U256, decimals: u8) -> String {
    let raw = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return raw;
    }
    let padded = format!("{:0>width$}", raw, width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// `balance / total_supply * 100`, or 0 when the supply is zero.
pub fn percentage_of_supply(balance: U256, total_supply: U256) -> f64 {
    if total_supply.is_zero() {
        return 0.0;
    }
    // percent scaled by 10^4 so four decimals survive integer division
    let scale = U256::from(1_000_000u64);
    let scaled = match balance.checked_mul(scale) {
        Some(numerator) => numerator / total_supply,
        None if total_supply >= scale => balance / (total_supply / scale),
        None => U256::MAX,
    };
    let scaled = if scaled > U256::from(u128::MAX) {
        u128::MAX
    } else {
        scaled.as_u128()
    };
    scaled as f64 / 10_000.0
}
