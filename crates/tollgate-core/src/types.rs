// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the executor and its collaborators.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Token counts reported by the backend for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input (prompt) tokens.
    pub input_tokens: u32,
    /// Number of output (completion) tokens.
    pub output_tokens: u32,
}

/// Outcome of the interactive confirmation gate.
///
/// Exists only within a single executor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum Decision {
    /// Proceed with the model the caller asked for.
    UseOriginal,
    /// Proceed with the router's suggested model.
    UseSuggested,
    /// Abort the call without invoking the backend.
    Cancel,
}

/// Everything the confirmation gate presents to the user.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    /// CLI command that triggered the call (e.g. "commit", "summarize").
    pub command: String,
    /// Counted input tokens (0 when counting failed).
    pub input_tokens: u32,
    /// Configured output-token estimate used for the pre-call cost.
    pub estimated_output_tokens: u32,
    /// Pre-call cost estimate in USD.
    pub estimated_cost_usd: f64,
    /// The model the caller asked for.
    pub original_model: String,
    /// A cheaper/better alternative, when the router found one.
    pub suggested_model: Option<String>,
    /// Message-catalog key explaining the suggestion.
    pub rationale_key: Option<String>,
}
