//! Error types for the mailsink pipeline.
//!
//! Every failure here is contained within the handling of one inbound
//! message; nothing propagates to the listener or the SMTP caller.

use std::io;

use thiserror::Error;

/// Errors that can occur while processing one accepted message.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The raw bytes could not be parsed as a mail document at all.
    ///
    /// Partial or unusual structure inside a parsable envelope does not
    /// produce this; missing fields are represented as absent instead.
    #[error("Malformed message: {0}")]
    Malformed(#[from] mailparse::MailParseError),

    /// An outbound action failed. The remaining actions for this message
    /// are skipped; any staged file is still cleaned up.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Errors from the outbound collaborators (notification channel, staging).
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The notification request could not be sent or timed out.
    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The notification service answered, but refused the operation.
    #[error("Notification rejected: {0}")]
    Rejected(String),

    /// Writing or removing a staged attachment failed.
    #[error("Staging I/O failed: {0}")]
    Staging(#[from] io::Error),
}
