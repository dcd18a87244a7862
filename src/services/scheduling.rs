use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{Appointment, Slot};
use crate::services::ai::prompts;

/// Who checks the requested doctor and slot before the store is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Fields accumulate across turns and are checked locally once complete.
    #[default]
    ClientSide,
    /// The model is shown the open slots up front; a complete reply is only
    /// spot-checked against the same table.
    ModelAssisted,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::ClientSide => "client",
            ValidationMode::ModelAssisted => "model",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "model" | "model_assisted" | "model-assisted" => ValidationMode::ModelAssisted,
            _ => ValidationMode::ClientSide,
        }
    }
}

/// Snapshot of the store the driver validates against.
#[derive(Debug, Clone)]
pub struct BookingContext {
    pub mode: ValidationMode,
    pub today: NaiveDate,
    pub roster: Vec<String>,
    /// Open slots per doctor; only doctors with at least one open slot appear.
    pub availability: BTreeMap<String, Vec<Slot>>,
}

impl BookingContext {
    pub fn load(conn: &Connection, mode: ValidationMode, today: NaiveDate) -> AppResult<Self> {
        let roster = queries::list_doctors(conn)?
            .into_iter()
            .map(|d| d.name)
            .collect();

        let mut ctx = Self {
            mode,
            today,
            roster,
            availability: BTreeMap::new(),
        };
        if mode == ValidationMode::ModelAssisted {
            ctx.refresh_availability(conn)?;
        }
        Ok(ctx)
    }

    pub fn refresh_availability(&mut self, conn: &Connection) -> AppResult<()> {
        let mut availability: BTreeMap<String, Vec<Slot>> = BTreeMap::new();
        for (doctor, slot) in queries::list_open_slots_by_doctor(conn)? {
            availability.entry(doctor).or_default().push(slot);
        }
        tracing::debug!(doctors = availability.len(), "availability snapshot refreshed");
        self.availability = availability;
        Ok(())
    }

    /// Doctors the model may offer: those with open slots, in name order.
    pub fn allow_list(&self) -> Vec<&str> {
        self.availability.keys().map(String::as_str).collect()
    }

    pub fn system_prompt(&self) -> String {
        match self.mode {
            ValidationMode::ClientSide => prompts::client_side_prompt(self.today),
            ValidationMode::ModelAssisted => {
                prompts::model_assisted_prompt(self.today, &self.availability)
            }
        }
    }
}

/// Reject the appointment unless its (date, time) is among `open`.
pub fn ensure_slot_open(open: &[Slot], appt: &Appointment) -> AppResult<()> {
    let requested = Slot::new(appt.date, appt.time);
    if open.contains(&requested) {
        Ok(())
    } else {
        Err(AppError::SlotUnavailable {
            doctor: appt.doctor.clone(),
            date: appt.date_str(),
            time: appt.time_str(),
        })
    }
}
