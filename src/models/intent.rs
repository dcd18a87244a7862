use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Book,
    Cancel,
}

impl Intent {
    /// Derive the intent signal carried by one user message.
    pub fn detect(input: &str) -> IntentSignal {
        let lower = input.to_lowercase();
        match (lower.contains("book"), lower.contains("cancel")) {
            (true, true) => IntentSignal::Ambiguous,
            (true, false) => IntentSignal::Explicit(Intent::Book),
            (false, true) => IntentSignal::Explicit(Intent::Cancel),
            (false, false) => IntentSignal::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSignal {
    Explicit(Intent),
    Ambiguous,
    None,
}
