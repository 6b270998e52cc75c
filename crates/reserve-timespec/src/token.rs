//! Lexical tokens, the token queue, and the reserved-word tables.

use std::fmt;

use serde::Serialize;

use crate::error::ParseError;

// ── Token kinds ─────────────────────────────────────────────────────────────

/// The closed set of token classifications.
///
/// The grammar dispatcher matches exhaustively over this enum, so adding a
/// kind is a compile-time-checked decision rather than a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TokenKind {
    #[default]
    Text,
    Number,
    Time,
    Date,
    Plus,
    Now,
    Next,
    From,
    To,
    Until,
    For,
    WeekdayName,
    MonthName,
    Tomorrow,
    Noon,
    Midnight,
    EndOfDay,
    Am,
    Pm,
    RelativeHours,
    RelativeDays,
    RelativeWeeks,
    Ordinal,
}

impl TokenKind {
    /// Short lowercase name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Number => "number",
            TokenKind::Time => "time",
            TokenKind::Date => "date",
            TokenKind::Plus => "plus",
            TokenKind::Now => "now",
            TokenKind::Next => "next",
            TokenKind::From => "from",
            TokenKind::To => "to",
            TokenKind::Until => "until",
            TokenKind::For => "for",
            TokenKind::WeekdayName => "day",
            TokenKind::MonthName => "month",
            TokenKind::Tomorrow => "tomorrow",
            TokenKind::Noon => "noon",
            TokenKind::Midnight => "midnight",
            TokenKind::EndOfDay => "eod",
            TokenKind::Am => "am",
            TokenKind::Pm => "pm",
            TokenKind::RelativeHours => "hour",
            TokenKind::RelativeDays => "day",
            TokenKind::RelativeWeeks => "week",
            TokenKind::Ordinal => "ord",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Tokens ──────────────────────────────────────────────────────────────────

/// An immutable classified lexical unit.
///
/// Once enqueued a token's kind and fields never change; only the queue
/// cursor advances. Numeric fields are populated according to the kind:
/// `num` for `Number`, `hour`/`minute` for `Time`, `year`/`month`/`day` for
/// `Date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// 1-based index in the lexed token stream, assigned at enqueue time.
    pub position: usize,
    pub num: i64,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
}

// ── Reserved words ──────────────────────────────────────────────────────────

/// Reclassification table for whole-word `Text` tokens.
pub(crate) fn keyword_kind(word: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match word {
        "plus" => Plus,
        "for" => For,
        "next" => Next,
        "now" => Now,
        "from" => From,
        "to" => To,
        "until" => Until,
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" | "monday" | "tuesday"
        | "wednesday" | "thursday" | "friday" | "saturday" | "sunday" => WeekdayName,
        "jan" | "feb" | "mar" | "apr" | "may" | "jun" | "jul" | "aug" | "sep" | "oct" | "nov"
        | "dec" | "january" | "february" | "march" | "april" | "june" | "july" | "august"
        | "september" | "october" | "november" | "december" => MonthName,
        "tomorrow" => Tomorrow,
        "noon" => Noon,
        "midnight" => Midnight,
        "eod" => EndOfDay,
        "am" => Am,
        "pm" => Pm,
        "h" | "hour" | "hours" => RelativeHours,
        "d" | "day" | "days" => RelativeDays,
        "w" | "week" | "weeks" => RelativeWeeks,
        "nd" | "rd" | "st" | "th" => Ordinal,
        _ => return None,
    })
}

/// Weekday name to day-of-week number, Sunday = 0.
pub(crate) fn weekday_number(name: &str) -> Option<i64> {
    Some(match name {
        "sunday" | "sun" => 0,
        "monday" | "mon" => 1,
        "tuesday" | "tue" => 2,
        "wednesday" | "wed" => 3,
        "thursday" | "thu" => 4,
        "friday" | "fri" => 5,
        "saturday" | "sat" => 6,
        _ => return None,
    })
}

/// Month name to month number, January = 1.
pub(crate) fn month_number(name: &str) -> Option<i64> {
    Some(match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    })
}

// ── Token queue ─────────────────────────────────────────────────────────────

/// A strictly FIFO cursor over the lexed tokens — the only mutable state the
/// grammar interpreter touches.
#[derive(Debug, Default)]
pub struct TokenQueue {
    tokens: Vec<Token>,
    head: usize,
}

impl TokenQueue {
    /// Append a token, assigning its 1-based position.
    pub(crate) fn push(&mut self, mut tok: Token) {
        tok.position = self.tokens.len() + 1;
        self.tokens.push(tok);
    }

    /// Remove and return the front token.
    pub fn pop(&mut self) -> Result<Token, ParseError> {
        let tok = self
            .tokens
            .get(self.head)
            .cloned()
            .ok_or_else(|| ParseError::end_of_input("end of input"))?;
        self.head += 1;
        Ok(tok)
    }

    /// Look at the front token without consuming it.
    pub fn peek(&self) -> Result<&Token, ParseError> {
        self.tokens
            .get(self.head)
            .ok_or_else(|| ParseError::end_of_input("end of input"))
    }

    /// Pop the front token only if it has the wanted kind. A mismatch leaves
    /// the queue untouched and reports `NotFound` carrying the front token.
    pub fn get(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let front = self.peek()?;
        if front.kind != kind {
            return Err(ParseError::not_found(front.clone()));
        }
        self.pop()
    }

    /// All lexed tokens, regardless of how far the cursor has advanced.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// Tokens remaining in front of the cursor.
    pub fn len(&self) -> usize {
        self.tokens.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
