use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{Appointment, Intent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Collecting,
    Acting,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Collecting => "collecting",
            ConversationState::Acting => "acting",
        }
    }
}

/// The four appointment fields, each null until populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FieldRecord {
    pub patient: Option<String>,
    pub doctor: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl FieldRecord {
    pub fn is_empty(&self) -> bool {
        self.patient.is_none() && self.doctor.is_none() && self.date.is_none() && self.time.is_none()
    }

    pub fn is_complete(&self) -> bool {
        self.patient.is_some() && self.doctor.is_some() && self.date.is_some() && self.time.is_some()
    }

    /// Copy fields from `other` into the ones still null here. Fields that
    /// are already set keep their value.
    pub fn fill_missing(&mut self, other: &FieldRecord) {
        if self.patient.is_none() {
            self.patient = other.patient.clone();
        }
        if self.doctor.is_none() {
            self.doctor = other.doctor.clone();
        }
        if self.date.is_none() {
            self.date = other.date;
        }
        if self.time.is_none() {
            self.time = other.time;
        }
    }

    pub fn to_appointment(&self) -> Option<Appointment> {
        Some(Appointment {
            patient: self.patient.clone()?,
            doctor: self.doctor.clone()?,
            date: self.date?,
            time: self.time?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: String,
    pub content: String,
}

/// Everything one console session carries between turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub system_prompt: String,
    pub messages: Vec<ConversationMessage>,
    pub fields: FieldRecord,
    pub intent: Option<Intent>,
    pub state: ConversationState,
}

impl Session {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![],
            fields: FieldRecord::default(),
            intent: None,
            state: ConversationState::Collecting,
        }
    }

    pub fn push(&mut self, role: &str, content: &str) {
        self.messages.push(ConversationMessage {
            role: role.to_string(),
            content: content.to_string(),
        });
    }

    /// Start a fresh action-cycle. The system prompt is kept.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.fields = FieldRecord::default();
        self.intent = None;
        self.state = ConversationState::Collecting;
    }
}
