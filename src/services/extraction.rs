use chrono::NaiveDate;

use crate::models::FieldRecord;
use crate::services::dates::{parse_date, parse_time};

/// Pull `Patient:`, `Doctor:`, `Date:` and `Time:` lines out of an assistant
/// reply. Relative dates ("tomorrow", "Friday") resolve against `today`.
pub fn extract_fields(text: &str, today: NaiveDate) -> FieldRecord {
    let mut fields = FieldRecord::default();

    for line in text.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };

        let label = strip_markup(label).to_lowercase();
        let value = strip_markup(value);
        if value.is_empty() || value.eq_ignore_ascii_case("not provided") {
            continue;
        }

        if label.starts_with("patient") {
            fields.patient = Some(value.to_string());
        } else if label.starts_with("doctor") {
            fields.doctor = Some(value.to_string());
        } else if label.starts_with("date") {
            fields.date = parse_date(value, today)
                .map_err(|e| tracing::debug!(error = %e, "dropping date field"))
                .ok();
        } else if label.starts_with("time") {
            fields.time = parse_time(value)
                .map_err(|e| tracing::debug!(error = %e, "dropping time field"))
                .ok();
        }
    }

    fields
}

/// Models like to bold or bullet their labels ("- **Patient:** Alice").
fn strip_markup(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '-' | '_' | '#'))
}
