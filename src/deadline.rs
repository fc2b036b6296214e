//! Deadline extraction and urgency classification.
//!
//! Deadline fields are found by name heuristics rather than by declared
//! column type, because legacy sheets rarely tag their deadline columns as
//! dates. The rules are a small declarative table of required tokens over
//! the shared normalized field name. Values that fail every known date
//! format are skipped per field, never aborting the scan.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::store::Store;
use crate::text::{display_date, normalize_field_name, parse_flexible_date};
use crate::types::Row;

/// Alerts are capped; the calendar view is not.
pub const MAX_ALERTS: usize = 15;

/// Deadlines further out than this many days do not alert.
const ALERT_WINDOW_DAYS: i64 = 7;

const EXCERPT_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlineKind {
    /// A completion deadline ("prazo de término" and spelling variants).
    Completion,
    /// A date limit for the audited area to return its answer.
    AreaReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Overdue,
    DueToday,
    Upcoming,
    Future,
}

impl Urgency {
    pub fn from_delta(days: i64) -> Self {
        if days < 0 {
            Urgency::Overdue
        } else if days == 0 {
            Urgency::DueToday
        } else if days <= ALERT_WINDOW_DAYS {
            Urgency::Upcoming
        } else {
            Urgency::Future
        }
    }
}

struct DeadlineRule {
    kind: DeadlineKind,
    /// All tokens must appear in the normalized field name.
    tokens: &'static [&'static str],
}

const DEADLINE_RULES: &[DeadlineRule] = &[
    DeadlineRule {
        kind: DeadlineKind::Completion,
        tokens: &["prazo", "termino"],
    },
    DeadlineRule {
        kind: DeadlineKind::AreaReturn,
        tokens: &["data", "limite", "retorno"],
    },
];

/// Field-name tokens identifying the row's note number, used for the event
/// label.
const NOTE_TOKENS: &[&str] = &["nota"];

/// Field-name token groups tried in order for the event excerpt.
const EXCERPT_TOKEN_GROUPS: &[&[&str]] = &[&["recomendacao"], &["constatacao"]];

fn classify_field(normalized_name: &str) -> Option<DeadlineKind> {
    DEADLINE_RULES
        .iter()
        .find(|rule| rule.tokens.iter().all(|t| normalized_name.contains(t)))
        .map(|rule| rule.kind)
}

/// One matched deadline field of one row. A pure derived view; nothing here
/// is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DeadlineEvent {
    pub sheet: String,
    pub row_id: i64,
    pub kind: DeadlineKind,
    /// `Nota <n>` when the row carries a note number, else `Row #<id>`.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub date: NaiveDate,
    pub display_date: String,
    pub urgency: Urgency,
    /// Whole days between today and the deadline; negative when overdue.
    pub days: i64,
}

fn find_by_tokens<'a>(row: &'a Row, tokens: &[&str]) -> Option<&'a str> {
    row.data
        .iter()
        .find(|(name, value)| {
            let normalized = normalize_field_name(name);
            !value.trim().is_empty() && tokens.iter().all(|t| normalized.contains(t))
        })
        .map(|(_, value)| value.trim())
}

fn row_label(row: &Row) -> String {
    match find_by_tokens(row, NOTE_TOKENS) {
        Some(note) => format!("Nota {note}"),
        None => format!("Row #{}", row.id),
    }
}

fn row_excerpt(row: &Row) -> Option<String> {
    for tokens in EXCERPT_TOKEN_GROUPS {
        if let Some(text) = find_by_tokens(row, tokens) {
            return Some(truncate_excerpt(text));
        }
    }
    None
}

fn truncate_excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_MAX_CHARS {
        return text.to_string();
    }
    let mut excerpt: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

fn events_for_row(row: &Row, today: NaiveDate, events: &mut Vec<DeadlineEvent>) {
    for (field, value) in &row.data {
        if value.trim().is_empty() {
            continue;
        }
        let Some(kind) = classify_field(&normalize_field_name(field)) else {
            continue;
        };
        let Some(date) = parse_flexible_date(value) else {
            tracing::debug!(
                sheet = %row.sheet,
                row_id = row.id,
                field = %field,
                "deadline value matched no known date format, skipping"
            );
            continue;
        };

        let days = (date - today).num_days();
        events.push(DeadlineEvent {
            sheet: row.sheet.clone(),
            row_id: row.id,
            kind,
            label: row_label(row),
            excerpt: row_excerpt(row),
            date,
            display_date: display_date(date),
            urgency: Urgency::from_delta(days),
            days,
        });
    }
}

/// All deadline events of all active sheets, one per matched field per row.
pub fn calendar_events(store: &dyn Store, today: NaiveDate) -> Result<Vec<DeadlineEvent>> {
    let mut events = Vec::new();
    for sheet in store.list_sheets()? {
        if !sheet.active {
            continue;
        }
        for row in store.list_rows(&sheet.name)? {
            events_for_row(&row, today, &mut events);
        }
    }
    Ok(events)
}

/// Urgent subset for notification consumers: deadlines within the alert
/// window (including everything overdue), most urgent first, capped.
pub fn alerts(store: &dyn Store, today: NaiveDate) -> Result<Vec<DeadlineEvent>> {
    let mut events: Vec<DeadlineEvent> = calendar_events(store, today)?
        .into_iter()
        .filter(|e| e.days <= ALERT_WINDOW_DAYS)
        .collect();
    events.sort_by_key(|e| e.days);
    events.truncate(MAX_ALERTS);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::RowData;

    fn row_with(fields: &[(&str, &str)]) -> Row {
        let mut data = RowData::new();
        for (k, v) in fields {
            data.insert(k.to_string(), v.to_string());
        }
        Row {
            id: 7,
            sheet: "audits".to_string(),
            data,
            row_order: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            created_by: None,
            updated_by: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn completion_deadline_matches_with_accents() {
        assert_eq!(
            classify_field(&normalize_field_name("Prazo de Término")),
            Some(DeadlineKind::Completion)
        );
    }

    #[test]
    fn area_return_deadline_matches() {
        assert_eq!(
            classify_field(&normalize_field_name("Data Limite de Retorno da Área")),
            Some(DeadlineKind::AreaReturn)
        );
    }

    #[test]
    fn declared_date_column_without_tokens_does_not_match() {
        assert_eq!(classify_field(&normalize_field_name("Data de Abertura")), None);
    }

    #[test]
    fn overdue_field_classifies_with_negative_delta() {
        let row = row_with(&[("Prazo de Término", "05/06/2025")]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].days, -5);
        assert_eq!(events[0].urgency, Urgency::Overdue);
    }

    #[test]
    fn time_suffix_is_discarded_and_boundary_is_upcoming() {
        let row = row_with(&[("Prazo de Término", "2025-06-17 00:00:00")]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2025, 6, 17).unwrap());
        assert_eq!(events[0].days, 7);
        assert_eq!(events[0].urgency, Urgency::Upcoming);
    }

    #[test]
    fn unparseable_value_is_skipped_without_error() {
        let row = row_with(&[("Prazo de Término", "a combinar")]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn label_prefers_note_number() {
        let row = row_with(&[
            ("Nº Nota Recomendatória", "42/2025"),
            ("Prazo de Término", "11/06/2025"),
        ]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);
        assert_eq!(events[0].label, "Nota 42/2025");
    }

    #[test]
    fn label_falls_back_to_row_id() {
        let row = row_with(&[("Prazo de Término", "11/06/2025")]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);
        assert_eq!(events[0].label, "Row #7");
    }

    #[test]
    fn excerpt_is_truncated_with_ellipsis() {
        let long = "x".repeat(150);
        let row = row_with(&[("Recomendação", &long), ("Prazo de Término", "11/06/2025")]);
        let mut events = Vec::new();
        events_for_row(&row, today(), &mut events);

        let excerpt = events[0].excerpt.as_deref().unwrap();
        assert_eq!(excerpt.chars().count(), 103);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn urgency_boundaries() {
        assert_eq!(Urgency::from_delta(-1), Urgency::Overdue);
        assert_eq!(Urgency::from_delta(0), Urgency::DueToday);
        assert_eq!(Urgency::from_delta(1), Urgency::Upcoming);
        assert_eq!(Urgency::from_delta(7), Urgency::Upcoming);
        assert_eq!(Urgency::from_delta(8), Urgency::Future);
    }
}
