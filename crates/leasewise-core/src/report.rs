//! Number formatting helpers for rendered reports.
//!
//! Reports are markdown text consumed by the reasoning stages and shown
//! to the user, so currency and counts use human conventions:
//! `$1,234.56` and `3,251`.

/// Format a dollar amount with thousands separators and two decimals.
pub fn usd(value: f64) -> String {
    let negative = value < 0.0;
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let grouped = group_thousands(int_part);
    if negative {
        format!("-${grouped}.{frac_part}")
    } else {
        format!("${grouped}.{frac_part}")
    }
}

/// Format a count with thousands separators.
pub fn count(value: usize) -> String {
    group_thousands(&value.to_string())
}

/// Format a percentage with one decimal place.
pub fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}
