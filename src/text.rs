//! Shared text and date helpers.
//!
//! Field names arrive spelled inconsistently across schema edits and imports
//! (accents, casing, stray whitespace), so every component that matches
//! fields by name goes through [`normalize_field_name`]. Deadline values
//! arrive in mixed formats, so the parser accepts both the display form and
//! the canonical form.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Case-folds, strips diacritics (NFKD, combining marks removed), and
/// collapses runs of whitespace to single spaces.
pub fn normalize_field_name(name: &str) -> String {
    let folded: String = name
        .trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses a date value in either accepted format:
///
/// - `DD/MM/YYYY` (slash form, 4-digit year)
/// - `YYYY-MM-DD`, optionally followed by a time component that is discarded
///
/// Anything else yields `None`; callers treat unparseable values as absent.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.contains('/') {
        let parts: Vec<&str> = value.split('/').collect();
        if parts.len() == 3 && parts[2].len() == 4 {
            let day: u32 = parts[0].parse().ok()?;
            let month: u32 = parts[1].parse().ok()?;
            let year: i32 = parts[2].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        None
    } else if value.contains('-') {
        let head = value.split(' ').next().unwrap_or(value);
        let parts: Vec<&str> = head.split('-').collect();
        if parts.len() == 3 && parts[0].len() == 4 {
            let year: i32 = parts[0].parse().ok()?;
            let month: u32 = parts[1].parse().ok()?;
            let day: u32 = parts[2].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        None
    } else {
        None
    }
}

/// Canonical storage form: `YYYY-MM-DD`.
pub fn canonical_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Presentation form: `DD/MM/YYYY`. Conversion happens only at this edge,
/// never inside the store.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Rewrites a submitted date-column value into canonical form. Slash-form
/// input is rearranged; a trailing time component is dropped. Values that
/// fit neither shape pass through unchanged rather than erroring, matching
/// the store's tolerance for malformed legacy data.
pub fn canonicalize_date_value(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return String::new();
    }
    match parse_flexible_date(value) {
        Some(date) => canonical_date(date),
        None => value.to_string(),
    }
}
