// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate - a cost guard for developer CLIs calling metered LLM backends.
//!
//! Host CLIs hand their paid calls to [`CostAwareExecutor::wrap_generate`],
//! which caches, prices, routes, budget-checks, and records every attempt.
//! The `tollgate` binary exposes the reporting and cache-maintenance
//! commands on top of the same stores.

pub mod cli;
pub mod confirm;
pub mod executor;
pub mod messages;

pub use confirm::StdinConfirmer;
pub use executor::{CostAwareExecutor, Generation};
pub use messages::{Answer, Lexicon};
