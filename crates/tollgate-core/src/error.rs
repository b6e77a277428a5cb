// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the Tollgate workspace.

use thiserror::Error;

/// The primary error type used across Tollgate traits and core operations.
#[derive(Debug, Error)]
pub enum TollgateError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Cache or ledger I/O and (de)serialization failures.
    ///
    /// Cache-side storage errors are soft: callers degrade them to a cache
    /// miss. A ledger write failure after a successful generation is logged
    /// and the result is still returned.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The ledger file exists but cannot be read back.
    ///
    /// Raised by every aggregate read on a corrupt ledger. Never downgraded
    /// to an empty history.
    #[error("cost history at {path} is corrupted: {detail}")]
    CorruptHistory { path: String, detail: String },

    /// The estimated call would push today's spend over the daily budget.
    ///
    /// Fatal for the call: the paid backend must not be invoked afterwards.
    #[error(
        "daily budget exceeded: spent ${spent_today:.4} today, this call adds \
         ~${estimated:.4} for a total of ${total:.4}, over the ${limit:.2} \
         limit by ${overage:.4}"
    )]
    BudgetExceeded {
        spent_today: f64,
        estimated: f64,
        total: f64,
        limit: f64,
        overage: f64,
    },

    /// The user declined at the confirmation gate. Fatal for the call.
    #[error("generation cancelled by user")]
    Cancelled,

    /// Backend adapter or generation errors (API failure, token counting).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }
}
