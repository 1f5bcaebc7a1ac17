use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Element is not focusable: {0}")]
    NotFocusable(String),

    #[error("Element rejected text delivery: {0}")]
    DeliveryRejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// Errors that only disqualify one search candidate. Everything else ends
    /// the current operation.
    pub fn is_candidate_level(&self) -> bool {
        matches!(
            self,
            AutomationError::NotFound(_)
                | AutomationError::NotFocusable(_)
                | AutomationError::DeliveryRejected(_)
                | AutomationError::Transport(_)
        )
    }
}
