// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message catalog and confirmation lexicon.
//!
//! The rest of the system passes message KEYS around; only this module maps
//! them to user-facing text. An unknown key falls back to itself so a
//! missing entry degrades to something greppable instead of a panic.

use tollgate_core::Decision;

/// Look up the text for a message key.
pub fn text(key: &str) -> &str {
    match key {
        "router.rationale.routine_command" => {
            "a lighter model handles this command well"
        }
        "router.rationale.small_input" => {
            "the input is small enough for a cheaper model"
        }
        "router.rationale.large_context" => {
            "the input is large; a stronger model preserves quality"
        }
        "router.rationale.balanced" => {
            "a mid-tier model balances cost and quality here"
        }
        "confirm.proceed" => "Proceed? [Y/n]",
        "confirm.switch" => "Use the suggested model? [Y/o=keep original/n=cancel]",
        "confirm.cancelled" => "Cancelled.",
        _ => key,
    }
}

/// One classified line of confirmation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    /// The input matched a known token (or was empty).
    Decided(Decision),
    /// The input matched nothing in the lexicon.
    Unrecognized,
}

/// Locale-aware affirmative/negative tokens for the confirmation gate.
#[derive(Debug, Clone)]
pub struct Lexicon {
    affirmative: Vec<String>,
    keep_original: Vec<String>,
    negative: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            affirmative: vec!["y".into(), "yes".into()],
            keep_original: vec!["o".into(), "orig".into(), "original".into()],
            negative: vec!["n".into(), "no".into(), "q".into(), "quit".into()],
        }
    }
}

impl Lexicon {
    /// Build a lexicon from explicit token lists (for other locales).
    pub fn new(
        affirmative: Vec<String>,
        keep_original: Vec<String>,
        negative: Vec<String>,
    ) -> Self {
        Self {
            affirmative,
            keep_original,
            negative,
        }
    }

    /// Classify one line of user input against the lexicon.
    ///
    /// Empty input is affirmative. Affirmative means "take the suggestion"
    /// when one is on the table, otherwise "proceed with the original".
    /// An explicit negative token is a decided `Cancel`; anything else is
    /// `Unrecognized` so callers can tell a decline from noise.
    pub fn classify(&self, input: &str, has_suggestion: bool) -> Answer {
        let token = input.trim().to_lowercase();
        let affirmed = token.is_empty() || self.affirmative.iter().any(|t| *t == token);
        if affirmed {
            return Answer::Decided(if has_suggestion {
                Decision::UseSuggested
            } else {
                Decision::UseOriginal
            });
        }
        if has_suggestion && self.keep_original.iter().any(|t| *t == token) {
            return Answer::Decided(Decision::UseOriginal);
        }
        if self.negative.iter().any(|t| *t == token) {
            return Answer::Decided(Decision::Cancel);
        }
        Answer::Unrecognized
    }

    /// Map one line of user input to a decision.
    ///
    /// Unrecognized input cancels: spending money on an ambiguous answer is
    /// the wrong default.
    pub fn decide(&self, input: &str, has_suggestion: bool) -> Decision {
        match self.classify(input, has_suggestion) {
            Answer::Decided(decision) => decision,
            Answer::Unrecognized => Decision::Cancel,
        }
    }
}
