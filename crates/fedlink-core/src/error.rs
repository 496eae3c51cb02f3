// SPDX-FileCopyrightText: 2026 Fedlink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Fedlink federation subsystem.

use thiserror::Error;

/// The primary error type used across all Fedlink traits and core operations.
///
/// Anti-abuse and backpressure decisions (policy rejection, queue overflow) are
/// not errors and never appear here; they are reported as typed outcomes by the
/// engines that make them.
#[derive(Debug, Error)]
pub enum FedlinkError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A referenced contact, queue item or delivery record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// Programmer error, such as an unset identifier passed to a mutation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A remote document or collection could not be fetched or parsed.
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FedlinkError {
    /// Returns true for failures of a remote peer that a retry may resolve.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Timeout { .. })
    }
}
