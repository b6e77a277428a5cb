// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interactive confirmation on standard input.
//!
//! The executor only sees the `Confirmer` trait; this is the production
//! implementation. It blocks on one line of stdin, which is the single
//! suspension point of a whole invocation.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

use tollgate_core::{ConfirmRequest, Confirmer, Decision, TollgateError};

use crate::messages::{self, Answer, Lexicon};

/// Reads the confirmation decision from standard input.
pub struct StdinConfirmer {
    lexicon: Lexicon,
}

impl StdinConfirmer {
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::default(),
        }
    }

    /// Use locale-specific answer tokens.
    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    fn render(request: &ConfirmRequest) -> String {
        let mut out = format!(
            "About to call the paid backend for `{}`:\n  input tokens:  {}\n  output tokens: ~{} (estimate)\n  estimated cost: ${:.4}\n  model: {}\n",
            request.command,
            request.input_tokens,
            request.estimated_output_tokens,
            request.estimated_cost_usd,
            request.original_model,
        );
        if let Some(suggested) = &request.suggested_model {
            out.push_str(&format!("  suggested model: {suggested}"));
            if let Some(key) = &request.rationale_key {
                out.push_str(&format!(" ({})", messages::text(key)));
            }
            out.push('\n');
            out.push_str(messages::text("confirm.switch"));
        } else {
            out.push_str(messages::text("confirm.proceed"));
        }
        out.push(' ');
        out
    }

    /// Read one answer line. A read failure here is not a storage problem;
    /// it means the interactive session itself is broken.
    async fn read_answer<R>(input: R) -> Result<String, TollgateError>
    where
        R: AsyncRead + Unpin,
    {
        let mut line = String::new();
        BufReader::new(input)
            .read_line(&mut line)
            .await
            .map_err(|e| {
                TollgateError::Internal(format!("could not read confirmation answer: {e}"))
            })?;
        Ok(line)
    }
}

impl Default for StdinConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, request: &ConfirmRequest) -> Result<Decision, TollgateError> {
        eprint!("{}", Self::render(request));

        let line = Self::read_answer(tokio::io::stdin()).await?;
        match self.lexicon.classify(&line, request.suggested_model.is_some()) {
            Answer::Decided(decision) => Ok(decision),
            Answer::Unrecognized => {
                warn!(answer = %line.trim(), "unrecognized answer, cancelling");
                Ok(Decision::Cancel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(suggested: Option<&str>) -> ConfirmRequest {
        ConfirmRequest {
            command: "summarize".to_string(),
            input_tokens: 42_000,
            estimated_output_tokens: 500,
            estimated_cost_usd: 0.1335,
            original_model: "claude-sonnet-4-20250514".to_string(),
            suggested_model: suggested.map(str::to_string),
            rationale_key: suggested.map(|_| "router.rationale.large_context".to_string()),
        }
    }

    #[test]
    fn render_shows_counts_cost_and_model() {
        let prompt = StdinConfirmer::render(&request(None));
        assert!(prompt.contains("42000"));
        assert!(prompt.contains("$0.1335"));
        assert!(prompt.contains("claude-sonnet-4-20250514"));
        assert!(prompt.contains("Proceed?"));
    }

    #[test]
    fn render_includes_suggestion_and_rationale() {
        let prompt = StdinConfirmer::render(&request(Some("claude-opus-4-20250514")));
        assert!(prompt.contains("suggested model: claude-opus-4-20250514"));
        assert!(prompt.contains("stronger model"));
        assert!(prompt.contains("keep original"));
    }

    #[tokio::test]
    async fn read_answer_returns_the_line() {
        let line = StdinConfirmer::read_answer(&b"y\n"[..]).await.unwrap();
        assert_eq!(line, "y\n");
    }

    #[tokio::test]
    async fn broken_input_is_an_internal_error_not_storage() {
        struct BrokenInput;

        impl tokio::io::AsyncRead for BrokenInput {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::other("terminal gone")))
            }
        }

        let err = StdinConfirmer::read_answer(BrokenInput).await.unwrap_err();
        match err {
            TollgateError::Internal(message) => assert!(message.contains("terminal gone")),
            other => panic!("expected Internal, got {other:?}"),
        }
    }
}
