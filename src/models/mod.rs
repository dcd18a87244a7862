pub mod appointment;
pub mod availability;
pub mod conversation;
pub mod doctor;
pub mod intent;

pub use appointment::Appointment;
pub use availability::{Slot, DATE_FORMAT, TIME_FORMAT};
pub use conversation::{ConversationMessage, ConversationState, FieldRecord, Session};
pub use doctor::Doctor;
pub use intent::{Intent, IntentSignal};
