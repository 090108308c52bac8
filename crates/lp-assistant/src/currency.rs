//! Normalization of monetary amounts typed by users or echoed by the model.
//!
//! Display strings use the Brazilian format (`R$ 1.234,50`): the period is a
//! thousands separator and the comma is the decimal mark.

use std::sync::LazyLock;

use lp_protocol::MoneyInput;
use regex::Regex;

/// Currency symbol, whitespace and thousands-separator periods.
static RE_NOISE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"R\$|\$|\s|\.").unwrap());

/// Leading decimal number, mirroring a lenient float parse (`"800reais"` → 800).
static RE_LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap());

/// Normalize a monetary input to a non-negative amount.
///
/// Numbers pass through unchanged. Text is stripped of the currency symbol,
/// whitespace and periods, the first comma becomes the decimal point, and the
/// leading number is parsed. Unparseable, negative or non-finite values
/// become zero.
pub fn parse_currency(input: &MoneyInput) -> f64 {
    let value = match input {
        MoneyInput::Number(n) => *n,
        MoneyInput::Text(text) => parse_text(text).unwrap_or(0.0),
    };
    sanitize(value)
}

/// Like [`parse_currency`] for an optional field; absent means zero.
pub fn parse_optional(input: Option<&MoneyInput>) -> f64 {
    input.map(parse_currency).unwrap_or(0.0)
}

fn parse_text(text: &str) -> Option<f64> {
    let stripped = RE_NOISE.replace_all(text, "");
    let normalized = stripped.replacen(',', ".", 1);
    let number = RE_LEADING_NUMBER.find(&normalized)?;
    number.as_str().parse().ok()
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
