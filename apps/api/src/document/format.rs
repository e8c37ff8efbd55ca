//! Field formatting shared by every section assembler.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Label used for an open-ended date (current job, ongoing membership).
pub const PRESENT: &str = "Present";

/// Renders a stored date as `MM/YYYY`.
///
/// `None` and blank strings mean "still ongoing" and render as `Present`.
/// A value that cannot be parsed is returned unchanged.
pub fn format_date(value: Option<&str>) -> String {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return PRESENT.to_string();
    };

    match parse_date(raw) {
        Some(date) => format!("{:02}/{:04}", date.month(), date.year()),
        None => {
            tracing::debug!("Unparseable date '{raw}', displaying as-is");
            raw.to_string()
        }
    }
}

/// Builds the `start - end` line shown to the right of an entry title.
///
/// Returns `None` when neither date is set. An entry with a start but no end
/// is ongoing (`01/2020 - Present`); an entry with only an end date shows
/// that date alone.
pub fn format_date_range(start: Option<&str>, end: Option<&str>) -> Option<String> {
    let start = non_blank(start);
    let end = non_blank(end);
    match (start, end) {
        (None, None) => None,
        (None, Some(end)) => Some(format_date(Some(end))),
        (Some(start), end) => Some(format!("{} - {}", format_date(Some(start)), format_date(end))),
    }
}

/// Accepts the handful of shapes the editor and database produce.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    // Month pickers store `YYYY-MM`.
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Reverses HTML entity encoding applied by the editor's form handling.
///
/// Single pass, so `&amp;lt;` becomes `&lt;` and not `<`. Unknown or
/// malformed entities are left untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];

        // Entities are short; a `;` further away than this is not ours.
        let semi = candidate
            .char_indices()
            .take(12)
            .find(|&(_, c)| c == ';')
            .map(|(i, _)| i);

        match semi.and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end))) {
            Some((decoded, end)) => {
                out.push(decoded);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "hellip" => '…',
        "bull" => '•',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "euro" => '€',
        "pound" => '£',
        _ => return None,
    };
    Some(c)
}
