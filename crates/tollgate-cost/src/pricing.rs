// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider/model price tables and cost estimation.
//!
//! Prices are USD per million tokens. Lookups normalize both keys to lower
//! case. `estimate` is lenient: an exact model match wins, otherwise the
//! first registered model name that is a substring of the given identifier
//! is used (dated model ids like `claude-sonnet-4-20250514` match the
//! `claude-sonnet` family entry), otherwise the estimate is zero. `pricing`
//! is the strict counterpart for introspection.

use std::collections::HashMap;

use tollgate_core::TollgateError;

/// Per-model pricing in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingEntry {
    /// Cost per million input tokens.
    pub input_per_mtok: f64,
    /// Cost per million output tokens.
    pub output_per_mtok: f64,
}

/// Mutable registry of pricing entries, ordered by registration per provider.
///
/// Shared-borrow methods read an immutable snapshot; runtime additions go
/// through `add_pricing`.
#[derive(Debug, Clone)]
pub struct PriceBook {
    // Vec preserves registration order: the substring fallback picks the
    // FIRST match, so more specific names must be registered before their
    // prefixes (gpt-4o-mini before gpt-4o).
    providers: HashMap<String, Vec<(String, PricingEntry)>>,
}

impl PriceBook {
    /// An empty price book: every lenient estimate is zero.
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// The built-in price table for the supported provider families.
    pub fn with_defaults() -> Self {
        let mut book = Self::empty();

        book.add_pricing("anthropic", "claude-haiku", PricingEntry {
            input_per_mtok: 0.80,
            output_per_mtok: 4.0,
        });
        book.add_pricing("anthropic", "claude-sonnet", PricingEntry {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        });
        book.add_pricing("anthropic", "claude-opus", PricingEntry {
            input_per_mtok: 15.0,
            output_per_mtok: 75.0,
        });

        book.add_pricing("openai", "gpt-4o-mini", PricingEntry {
            input_per_mtok: 0.15,
            output_per_mtok: 0.60,
        });
        book.add_pricing("openai", "gpt-4o", PricingEntry {
            input_per_mtok: 2.50,
            output_per_mtok: 10.0,
        });

        book.add_pricing("gemini", "gemini-1.5-flash", PricingEntry {
            input_per_mtok: 0.075,
            output_per_mtok: 0.30,
        });
        book.add_pricing("gemini", "gemini-1.5-pro", PricingEntry {
            input_per_mtok: 1.25,
            output_per_mtok: 5.0,
        });

        book
    }

    /// Insert or overwrite a pricing entry at runtime.
    pub fn add_pricing(&mut self, provider: &str, model: &str, entry: PricingEntry) {
        let provider = provider.to_lowercase();
        let model = model.to_lowercase();
        let models = self.providers.entry(provider).or_default();
        match models.iter_mut().find(|(name, _)| *name == model) {
            Some((_, existing)) => *existing = entry,
            None => models.push((model, entry)),
        }
    }

    /// Estimate the cost of a call in USD.
    ///
    /// Returns 0 when the provider is unknown or no model matches. Safe on
    /// arbitrary strings; never panics.
    pub fn estimate(
        &self,
        provider: &str,
        model: &str,
        input_tokens: u32,
        output_tokens: u32,
    ) -> f64 {
        let Some(entry) = self.find(provider, model) else {
            return 0.0;
        };
        (f64::from(input_tokens) / 1_000_000.0) * entry.input_per_mtok
            + (f64::from(output_tokens) / 1_000_000.0) * entry.output_per_mtok
    }

    /// Strict lookup: errors when the provider or exact model key is absent.
    pub fn pricing(&self, provider: &str, model: &str) -> Result<PricingEntry, TollgateError> {
        let provider_key = provider.to_lowercase();
        let model_key = model.to_lowercase();
        self.providers
            .get(&provider_key)
            .and_then(|models| {
                models
                    .iter()
                    .find(|(name, _)| *name == model_key)
                    .map(|(_, entry)| *entry)
            })
            .ok_or_else(|| {
                TollgateError::Internal(format!(
                    "no pricing registered for {provider}/{model}"
                ))
            })
    }

    /// Exact match first, then the first registered model name that is a
    /// substring of the given identifier.
    fn find(&self, provider: &str, model: &str) -> Option<&PricingEntry> {
        let models = self.providers.get(&provider.to_lowercase())?;
        let model = model.to_lowercase();
        if let Some((_, entry)) = models.iter().find(|(name, _)| *name == model) {
            return Some(entry);
        }
        models
            .iter()
            .find(|(name, _)| model.contains(name.as_str()))
            .map(|(_, entry)| entry)
    }
}

impl Default for PriceBook {
    fn default() -> Self {
        Self::with_defaults()
    }
}
