use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::availability::{DATE_FORMAT, TIME_FORMAT};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub patient: String,
    pub doctor: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Appointment {
    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn time_str(&self) -> String {
        self.time.format(TIME_FORMAT).to_string()
    }
}

impl std::fmt::Display for Appointment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} with {} on {} at {}",
            self.patient,
            self.doctor,
            self.date_str(),
            self.time_str()
        )
    }
}
