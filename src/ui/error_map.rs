use std::time::Duration;

use crate::errors::TicketError;

/// Cloneable error carried by UI messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub message: String,
    pub detail: Option<String>,
}

impl AppError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn timeout(duration: Duration) -> Self {
        AppError::new(format!(
            "The request timed out after {}s",
            duration.as_secs()
        ))
    }
}

impl From<TicketError> for AppError {
    fn from(value: TicketError) -> Self {
        let headline = headline(&value);
        match value {
            TicketError::ProviderMissing => AppError::new(headline),
            other => AppError::new(headline).with_detail(other.to_string()),
        }
    }
}

fn headline(error: &TicketError) -> &'static str {
    match error {
        TicketError::ProviderMissing => {
            "No wallet signer is available. Start the signer daemon and try again."
        }
        TicketError::ConnectionRejected(_) => "The wallet declined the connection request.",
        TicketError::Address(_) => "The contract address is not valid.",
        TicketError::Read(_) => "The contract state could not be read.",
        TicketError::MetadataFetch(_) => "Ticket details could not be loaded.",
        TicketError::Submission(_) => "The transaction was not accepted.",
        TicketError::Subscription(_) => "The confirmation event was not received.",
        TicketError::Config(_) => "The configuration is invalid.",
        TicketError::Io(_) => "A local file could not be accessed.",
    }
}
