//! Price string parsing
//!
//! Storefront price fragments are noisy: thousands separators, duplicated
//! visible/offscreen renderings of the same amount, surrounding whitespace.
//! The parser requires the configured currency symbol up front and reads the
//! first amount it can find after it.

use anyhow::{bail, Result};

/// A successfully parsed price.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    /// The raw text as rendered, trimmed
    pub display: String,
    /// Numeric amount
    pub value: f64,
}

/// Parse a rendered price fragment into a positive amount.
pub fn parse_price(raw: &str, currency_symbol: &str) -> Result<ParsedPrice> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("price text is empty");
    }
    if !trimmed.starts_with(currency_symbol) {
        bail!("invalid price format: '{trimmed}' does not start with {currency_symbol}");
    }

    // Duplicated renderings ("$24.99$24.99") collapse to the first amount.
    let rest = &trimmed[currency_symbol.len()..];
    let first_rendering = match rest.find(currency_symbol) {
        Some(position) => &rest[..position],
        None => rest,
    };

    let numeric: String = first_rendering
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let value = match leading_number(&numeric) {
        Some(value) => value,
        None => bail!("no numeric amount in price '{trimmed}'"),
    };
    if value <= 0.0 {
        bail!("invalid price value: '{trimmed}'");
    }

    Ok(ParsedPrice {
        display: trimmed.to_string(),
        value,
    })
}

/// Longest leading number with at most one decimal point, if any.
fn leading_number(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;

    for (index, c) in s.char_indices() {
        if c.is_ascii_digit() {
            seen_digit = true;
            end = index + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = index + 1;
        } else {
            break;
        }
    }

    if !seen_digit {
        return None;
    }
    s[..end].trim_end_matches('.').parse().ok()
}
