//! Error types for the record store and the email content engine.
//!
//! Errors are classified by where they stop processing:
//! - Resolution: the recipient's own stakeholder/email is unresolvable.
//!   Fatal for that recipient only, the batch continues.
//! - Validation: malformed compose request, generation does not proceed.
//! - Transport failures live in [`crate::graph::TransportError`] and are
//!   always recovered locally (mailto fallback / manual copy).

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the JSON-file-backed record store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Errors from email generation.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Recipient stakeholder not found: {0}")]
    RecipientNotFound(String),

    #[error("Stakeholder '{0}' has no email address")]
    MissingEmail(String),

    #[error("Invalid request: {0}")]
    Validation(String),
}
