use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::stats::StatValue;

/// Signed number with optional thousands separators and magnitude suffix
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<sign>[-+])?(?P<number>[\d,]+\.?\d*)(?P<suffix>k|M|B|T|%)?$")
        .expect("Failed to compile number regex")
});

/// Dates as shown on the statistics page, e.g. `Feb 9, 2024`
static SHORT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][a-z]{2} \d{1,2}, \d{4}$").expect("Failed to compile date regex"));

/// `Mon D, YYYY` to a calendar date
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%b %d, %Y").ok()
}

/// Parse one value cell: number first, then date, otherwise normalized text.
pub fn parse_value(raw: &str) -> StatValue {
    let raw = raw.trim();

    if let Some(caps) = NUMBER.captures(raw) {
        let digits = caps["number"].replace(',', "");
        if let Ok(number) = digits.parse::<f64>() {
            let sign = caps.name("sign").map(|m| m.as_str());
            let suffix = caps.name("suffix").map(|m| m.as_str());
            return StatValue::Number(apply_magnitude(number, sign, suffix));
        }
    }

    if SHORT_DATE.is_match(raw) {
        if let Some(date) = parse_date(raw) {
            return StatValue::Date(date);
        }
    }

    StatValue::Text(normalize_text(raw))
}

fn apply_magnitude(number: f64, sign: Option<&str>, suffix: Option<&str>) -> f64 {
    let number = if sign == Some("-") { -number } else { number };
    match suffix {
        Some("k") => number * 1e3,
        Some("M") => number * 1e6,
        Some("B") => number * 1e9,
        Some("T") => number * 1e12,
        Some("%") => number / 100.0,
        _ => number,
    }
}

/// Lowercase snake-ish key used for labels and free-text values.
///
/// `N/A` becomes empty, `%` becomes `pct`, `S&P` becomes `snp`, and
/// dashes, parentheses and commas are dropped.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("N/A", "")
        .replace('%', "pct")
        .replace(['-', '(', ')', ','], "")
        .replace("S&P", "snp")
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}
