//! Formats amounts of money for display.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// The currency every amount is shown in.
pub const CURRENCY_CODE: &str = "CHF";

/// Format `amount` with two decimal places followed by the currency code,
/// e.g. "-12.30 CHF".
pub fn format_currency(amount: f64) -> String {
    static FMT: OnceLock<Formatter> = OnceLock::new();

    let fmt = FMT.get_or_init(|| {
        Formatter::currency("")
            .unwrap_or_else(|_| Formatter::new())
            .precision(Precision::Decimals(2))
    });

    // numfmt switches to scientific notation for tiny numbers, e.g. "4.0e-3".
    let amount = (amount * 100.0).round() / 100.0;

    let sign = if amount < 0.0 { "-" } else { "" };
    let magnitude = if amount == 0.0 {
        // Zero is hardcoded as "0"
        "0".to_owned()
    } else {
        fmt.fmt_string(amount.abs())
    };

    format!("{sign}{} {CURRENCY_CODE}", pad_decimals(magnitude))
}

/// numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3".
fn pad_decimals(mut number: String) -> String {
    match number.find('.') {
        Some(point) => {
            for _ in number.len() - point - 1..2 {
                number.push('0');
            }
        }
        None => number.push_str(".00"),
    }

    number
}
