//! Positional parse errors.
//!
//! Every failure the lexer or grammar can produce is a [`ParseError`]: a
//! stable user-facing message, a [`ErrorKind`] classification, and — when a
//! specific token is at fault — that token, whose `position` lets a caller
//! re-render the input phrase with the bad word bracketed.

use serde::Serialize;
use thiserror::Error;

use crate::token::Token;

/// Classification of a parse failure.
///
/// The kinds are mutually exclusive. [`ErrorKind::NotFound`] is special: the
/// grammar consumes it internally as "this alternative doesn't apply" and it
/// is never surfaced to the user directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// The token queue ran out before a required token.
    EndOfInput,
    /// An optional alternative's expected token kind was absent (recoverable).
    NotFound,
    /// A token was present but semantically wrong.
    InvalidValue,
    /// A calendar-validity failure (bad month/day combination).
    DateInvalid,
}

/// A structured, positionally annotated parse error.
#[derive(Error, Debug, Clone, Serialize)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub kind: ErrorKind,
    /// The offending token, when one exists.
    pub token: Option<Token>,
}

impl ParseError {
    pub(crate) fn end_of_input(message: &str) -> Self {
        Self {
            message: message.to_string(),
            kind: ErrorKind::EndOfInput,
            token: None,
        }
    }

    pub(crate) fn not_found(token: Token) -> Self {
        Self {
            message: "not found".to_string(),
            kind: ErrorKind::NotFound,
            token: Some(token),
        }
    }

    pub(crate) fn invalid(message: String, token: Option<Token>) -> Self {
        Self {
            message,
            kind: ErrorKind::InvalidValue,
            token,
        }
    }

    pub(crate) fn date_invalid(message: String, token: Option<Token>) -> Self {
        Self {
            message,
            kind: ErrorKind::DateInvalid,
            token,
        }
    }

    /// Re-render the lexed form of `words` with the offending token
    /// bracketed, for user-facing diagnostics:
    ///
    /// ```text
    /// april 5 st 19:00 to [febrewairy] 19 st 7 pm
    /// ```
    ///
    /// Returns `None` when the error carries no token or `words` no longer
    /// lexes.
    pub fn highlight(&self, words: &[&str]) -> Option<String> {
        let offender = self.token.as_ref()?;
        if offender.position == 0 {
            return None;
        }

        let tokens = crate::lexer::lex(words).ok()?;
        let rendered: Vec<String> = tokens
            .iter()
            .map(|tok| {
                if tok.position == offender.position {
                    format!("[{}]", tok.text)
                } else {
                    tok.text.clone()
                }
            })
            .collect();

        Some(rendered.join(" "))
    }
}
