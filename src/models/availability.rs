use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// An open (date, time) combination for one doctor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    pub fn parse(date: &str, time: &str) -> anyhow::Result<Self> {
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| anyhow::anyhow!("invalid slot date {date:?}: {e}"))?;
        let time = NaiveTime::parse_from_str(time, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .map_err(|e| anyhow::anyhow!("invalid slot time {time:?}: {e}"))?;
        Ok(Self { date, time })
    }

    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.date_str(), self.time_str())
    }
}
