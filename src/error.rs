use serde_json::Value;
use thiserror::Error;

/// Everything that ends a submission without a ticket. `Display` is the
/// verbose text shown in debug mode.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("API Init Error: {0}")]
    CrmUnavailable(String),

    #[error("Account Number is required.")]
    MissingAccountNumber,

    #[error("Please describe your concern.")]
    MissingConcern,

    #[error("Concern must be {max} characters or less.")]
    ConcernTooLong { max: usize },

    #[error("Account number cannot be found.")]
    ClientNotFound,

    #[error("Failed to create ticket. Response: {0}")]
    TicketNotCreated(Value),

    #[error("Error: {0:#}")]
    Remote(anyhow::Error),
}

impl SubmissionError {
    /// The message for the end user. Outside debug mode backend details are
    /// replaced by coarse, fixed messages.
    pub fn user_message(&self, debug: bool) -> String {
        if debug {
            return self.to_string();
        }
        match self {
            SubmissionError::CrmUnavailable(_) => {
                "System temporarily unavailable. Please try again later.".to_string()
            }
            SubmissionError::TicketNotCreated(_) => {
                "Failed to create ticket. Please try again.".to_string()
            }
            SubmissionError::Remote(error) => match RemoteFailure::classify(error) {
                RemoteFailure::NotFound => {
                    "Ticketing system not available. Please contact support.".to_string()
                }
                RemoteFailure::Forbidden => "Permission denied. Please contact support.".to_string(),
                RemoteFailure::Other => "An error occurred. Please try again later.".to_string(),
            },
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteFailure {
    NotFound,
    Forbidden,
    Other,
}

impl RemoteFailure {
    fn classify(error: &anyhow::Error) -> Self {
        let status = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
            .and_then(|cause| cause.status());

        if let Some(status) = status {
            return match status.as_u16() {
                404 => RemoteFailure::NotFound,
                401 | 403 => RemoteFailure::Forbidden,
                _ => RemoteFailure::Other,
            };
        }

        let text = format!("{:#}", error);
        if text.contains("404") {
            RemoteFailure::NotFound
        } else if text.contains("401") || text.contains("403") {
            RemoteFailure::Forbidden
        } else {
            RemoteFailure::Other
        }
    }
}
