// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the executor and its external collaborators.
//!
//! The backend adapter wraps whatever client actually talks to the paid API;
//! Tollgate only consumes token counting and identity from it. The confirmer
//! is injected so tests and skip-confirmation mode can substitute a
//! deterministic stub instead of reading real input.

use async_trait::async_trait;

use crate::error::TollgateError;
use crate::types::{ConfirmRequest, Decision};

/// Adapter over the metered generation backend.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Count the tokens in a prompt.
    ///
    /// May hit the network. Callers treat a failure as "unknown" (0 tokens)
    /// rather than aborting.
    async fn count_tokens(&self, prompt: &str) -> Result<u32, TollgateError>;

    /// The model the caller configured for this backend.
    fn model_name(&self) -> String;

    /// Provider identifier used for pricing lookups (e.g. "anthropic").
    fn provider_name(&self) -> String;
}

/// Interactive decision point before an expensive call.
#[async_trait]
pub trait Confirmer: Send + Sync {
    /// Present the request and block until the user answers.
    async fn confirm(&self, request: &ConfirmRequest) -> Result<Decision, TollgateError>;
}
