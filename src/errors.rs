use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("no wallet provider is available")]
    ProviderMissing,
    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(String),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to read contract state: {0}")]
    Read(String),
    #[error("failed to fetch ticket metadata: {0}")]
    MetadataFetch(String),
    #[error("transaction submission failed: {0}")]
    Submission(String),
    #[error("event subscription failed: {0}")]
    Subscription(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type TicketResult<T> = Result<T, TicketError>;
