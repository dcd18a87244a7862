//! Lenient date and time parsing for values the model writes in free text.
//!
//! Accepts ISO and US numeric dates, month names in either order, `today`,
//! `tomorrow`, weekday names, a bare day of the month ("the 5th"), 24h clock
//! times and 12h times with am/pm. `9.30` reads as `9:30`. Words that carry no
//! date or time are skipped.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ExtractionError {
    #[error("unrecognized date: {0}")]
    UnrecognizedDate(String),

    #[error("unrecognized time: {0}")]
    UnrecognizedTime(String),
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

const NUMERIC_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

pub fn parse_date(value: &str, today: NaiveDate) -> Result<NaiveDate, ExtractionError> {
    let cleaned = value.trim().trim_end_matches(['.', ',']);

    if let Some(date) = parse_numeric_date(cleaned) {
        return Ok(date);
    }
    if let Some(dt) = parse_datetime(cleaned) {
        return Ok(dt.date());
    }

    let lower = cleaned.to_lowercase();
    let tokens = tokenize(&lower);

    let mut month = None;
    let mut day = None;
    let mut year = None;
    let mut weekday = None;

    for token in &tokens {
        match token.as_str() {
            "today" => return Ok(today),
            "tomorrow" => return Ok(today + Duration::days(1)),
            _ => {}
        }

        if token.contains(['-', '/']) {
            let head = token.split('t').next().unwrap_or(token.as_str());
            if let Some(date) = parse_numeric_date(head) {
                return Ok(date);
            }
            continue;
        }

        if let Some(m) = month_from_name(token) {
            month.get_or_insert(m);
        } else if let Some(w) = weekday_from_name(token) {
            weekday.get_or_insert(w);
        } else if let Some(n) = strip_ordinal(token).and_then(|d| d.parse::<u32>().ok()) {
            match strip_ordinal(token).map(str::len) {
                Some(4) if (1900..=2100).contains(&n) => {
                    year.get_or_insert(n as i32);
                }
                Some(1 | 2) if (1..=31).contains(&n) => {
                    day.get_or_insert(n);
                }
                _ => {}
            }
        }
    }

    match (month, day, weekday) {
        (Some(m), Some(d), _) => NaiveDate::from_ymd_opt(year.unwrap_or(today.year()), m, d)
            .ok_or_else(|| ExtractionError::UnrecognizedDate(value.to_string())),
        (None, _, Some(w)) => Ok(next_weekday(today, w)),
        (None, Some(d), None) => NaiveDate::from_ymd_opt(today.year(), today.month(), d)
            .ok_or_else(|| ExtractionError::UnrecognizedDate(value.to_string())),
        _ => Err(ExtractionError::UnrecognizedDate(value.to_string())),
    }
}

pub fn parse_time(value: &str) -> Result<NaiveTime, ExtractionError> {
    let cleaned = value.trim().trim_end_matches(['.', ',']);

    if let Some(dt) = parse_datetime(cleaned) {
        return Ok(dt.time());
    }

    let lower = cleaned
        .to_lowercase()
        .replace("a.m", "am")
        .replace("p.m", "pm");
    let tokens = tokenize(&lower);

    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "noon" => return clock_or_err(12, value),
            "midnight" => return clock_or_err(0, value),
            _ => {}
        }

        // 2024-06-01t09:00 keeps only the clock half
        let token = match token.split_once('t') {
            Some((head, tail)) if head.contains('-') => tail,
            _ => token.as_str(),
        };

        let split = token
            .find(|c: char| !(c.is_ascii_digit() || c == ':' || c == '.'))
            .unwrap_or(token.len());
        let (clock, rest) = token.split_at(split);
        if clock.is_empty() {
            continue;
        }
        let clock = clock.replace('.', ":");

        let meridiem = match rest {
            "" => tokens
                .get(i + 1)
                .map(String::as_str)
                .filter(|next| matches!(*next, "am" | "pm")),
            "am" | "pm" => Some(rest),
            _ => continue,
        };

        if let Some(time) = parse_clock(&clock, meridiem) {
            return Ok(time);
        }
    }

    Err(ExtractionError::UnrecognizedTime(value.to_string()))
}

fn clock_or_err(hour: u32, value: &str) -> Result<NaiveTime, ExtractionError> {
    NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| ExtractionError::UnrecognizedTime(value.to_string()))
}

fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    NUMERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim_matches(['.', '(', ')']))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn month_from_name(token: &str) -> Option<u32> {
    if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(token))
        .map(|idx| idx as u32 + 1)
}

fn weekday_from_name(token: &str) -> Option<Weekday> {
    if token.len() < 3 {
        return None;
    }
    [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ]
    .into_iter()
    .find(|(name, _)| name.starts_with(token))
    .map(|(_, w)| w)
}

/// "1st" -> "1". Plain digit runs pass through.
fn strip_ordinal(token: &str) -> Option<&str> {
    let digits = token
        .strip_suffix("st")
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))
        .unwrap_or(token);
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

/// First date on or after `from` that falls on `weekday`.
fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(ahead as i64)
}

fn parse_clock(clock: &str, meridiem: Option<&str>) -> Option<NaiveTime> {
    let parts: Vec<&str> = clock.split(':').collect();
    let (hour, minute, second): (u32, u32, u32) = match parts.as_slice() {
        [h] if meridiem.is_some() => (h.parse::<u32>().ok()?, 0, 0),
        [h, m] if m.len() == 2 => (h.parse().ok()?, m.parse().ok()?, 0),
        [h, m, s] if m.len() == 2 && s.len() == 2 => {
            (h.parse().ok()?, m.parse().ok()?, s.parse().ok()?)
        }
        _ => return None,
    };

    let hour = match meridiem {
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some("pm") if hour < 12 => hour + 12,
        Some("am") if hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}
