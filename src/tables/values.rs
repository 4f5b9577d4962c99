use chrono::NaiveDate;

// Month-first formats come before day-first, so an ambiguous date like
// "03/04/2023" always resolves as March 4th. Preserved as-is pending a
// locale decision.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Tries the fixed format list in order and returns the first parse
/// that succeeds. Blank input is `None`, not an error.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Strips everything except digits, the decimal point, and sign
/// characters, then converts. A negative value with
/// `allow_negative = false` keeps its magnitude; the sign is dropped,
/// not rejected. Unparseable input is `None`.
pub fn parse_amount(input: &str, allow_negative: bool) -> Option<f64> {
    let cleaned = input
        .trim()
        .chars()
        .filter(|character| {
            character.is_ascii_digit()
                || *character == '.'
                || *character == '-'
                || *character == '+'
        })
        .collect::<String>();

    if cleaned.is_empty() {
        return None;
    }

    let amount = cleaned.parse::<f64>().ok()?;
    if !allow_negative && amount < 0.0 {
        return Some(amount.abs());
    }

    Some(amount)
}
