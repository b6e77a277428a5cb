// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Tollgate.
//!
//! TOML config model plus a Figment loader merging compiled defaults, the
//! XDG file hierarchy, and `TOLLGATE_*` environment variables.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{CacheConfig, CostConfig, LedgerConfig, RoutingConfig, TollgateConfig};
