#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Doctor '{0}' not found. Please try again with a valid name.")]
    UnknownDoctor(String),

    #[error("No available slot for {doctor} on {date} at {time}.")]
    SlotUnavailable {
        doctor: String,
        date: String,
        time: String,
    },

    #[error("database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("language model error: {0}")]
    ModelService(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Recoverable errors are reported to the user and the conversation
    /// continues; everything else ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::UnknownDoctor(_) | AppError::SlotUnavailable { .. }
        )
    }
}
