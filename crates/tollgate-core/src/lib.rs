// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Tollgate, a cost guard for metered LLM calls.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Tollgate workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::TollgateError;
pub use traits::{BackendAdapter, Confirmer};
pub use types::{ConfirmRequest, Decision, TokenUsage};
