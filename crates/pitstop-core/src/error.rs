// SPDX-FileCopyrightText: 2026 Pitstop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pitstop survey service.

use thiserror::Error;

/// The primary error type used across all Pitstop adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PitstopError {
    /// Configuration errors (invalid TOML, missing credentials, bad cron patterns).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// SMS gateway errors (send rejected, bad credentials, malformed webhook).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generative backend errors (API failure, empty candidate list).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The extraction reply held no parsable JSON object.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// The extraction reply parsed but did not match the survey schema.
    #[error("extraction schema invalid: {0}")]
    ExtractionSchemaInvalid(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PitstopError {
    /// True for the two extraction variants.
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            PitstopError::ExtractionFailed(_) | PitstopError::ExtractionSchemaInvalid(_)
        )
    }
}
