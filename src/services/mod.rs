pub mod ai;
pub mod conversation;
pub mod dates;
pub mod extraction;
pub mod matcher;
pub mod scheduling;
