//! Display formatting for KPI values.
//!
//! Ratios arrive as `Option<f64>`; `None` (zero denominator) renders as
//! [`UNDEFINED`].

pub const UNDEFINED: &str = "n/a";
pub const CURRENCY_SYMBOL: &str = "$";

/// Insert `,` every three digits of an unsigned digit string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1234567` → `1,234,567`
pub fn format_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// `1234.5` → `$1,234.50`, `-3.2` → `-$3.20`
pub fn format_currency(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{CURRENCY_SYMBOL}{}.{frac}", group_thousands(whole))
}

pub fn format_currency_opt(v: Option<f64>) -> String {
    v.map(format_currency)
        .unwrap_or_else(|| UNDEFINED.to_string())
}

/// `16.6666` → `16.67%`
pub fn format_percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}%"),
        None => UNDEFINED.to_string(),
    }
}

/// `5.75` → `5.75x`
pub fn format_multiplier(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}x"),
        None => UNDEFINED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_get_thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn currency_has_symbol_and_two_decimals() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(400.0), "$400.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-3.2), "-$3.20");
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency_opt(None), "n/a");
    }

    #[test]
    fn ratios_render_suffixes() {
        assert_eq!(format_percent(Some(5.0)), "5.00%");
        assert_eq!(format_percent(Some(100.0 / 6.0)), "16.67%");
        assert_eq!(format_multiplier(Some(5.75)), "5.75x");
        assert_eq!(format_percent(None), UNDEFINED);
        assert_eq!(format_multiplier(None), UNDEFINED);
    }
}
