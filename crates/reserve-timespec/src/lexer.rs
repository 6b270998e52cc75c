//! Phrase lexer.
//!
//! The caller's whitespace-split words are joined with single spaces,
//! lowercased, and scanned rune by rune with exactly one token under
//! construction at a time. A small promotion lattice reclassifies the open
//! token as characters arrive: letters open `Text` and a `-` promotes it to
//! `Date`; digits open `Number`, a `:` promotes to `Time` and a `-` to
//! `Date`. `+` is a token of its own and a space closes whatever is open.
//!
//! Closing a token runs a finalization pass: `Text` is checked against the
//! reserved-word table (with `noon`, `midnight`, and `eod` rewritten to
//! fixed `Time` literals), `Number` parses its value, `Time` splits on `:`,
//! and `Date` must be a calendar-valid `yyyy-mm-dd`.

use crate::calendar::date_valid;
use crate::error::ParseError;
use crate::token::{keyword_kind, Token, TokenKind, TokenQueue};

/// The token under construction. `kind == None` means nothing is open.
#[derive(Default)]
struct Scratch {
    text: String,
    kind: Option<TokenKind>,
}

impl Scratch {
    fn open(kind: TokenKind, c: char) -> Self {
        Self {
            text: c.to_string(),
            kind: Some(kind),
        }
    }

    fn kind_name(&self) -> &'static str {
        self.kind.map_or("none", TokenKind::name)
    }
}

/// Lex a whitespace-split phrase into a token queue.
pub fn lex(words: &[&str]) -> Result<TokenQueue, ParseError> {
    let phrase = words.join(" ").to_lowercase();

    let mut queue = TokenQueue::default();
    let mut cur = Scratch::default();

    for c in phrase.chars() {
        let kept = match cur.kind {
            Some(TokenKind::Text) => {
                if c.is_alphabetic() {
                    cur.text.push(c);
                    true
                } else if c == '-' {
                    // promote to a date token
                    cur.text.push(c);
                    cur.kind = Some(TokenKind::Date);
                    true
                } else {
                    false
                }
            }
            Some(TokenKind::Number) => {
                if c.is_ascii_digit() {
                    cur.text.push(c);
                    true
                } else if c == ':' {
                    // promote to a time token
                    cur.text.push(c);
                    cur.kind = Some(TokenKind::Time);
                    true
                } else if c == '-' {
                    // promote to a date token
                    cur.text.push(c);
                    cur.kind = Some(TokenKind::Date);
                    true
                } else {
                    false
                }
            }
            Some(TokenKind::Date) => {
                if c.is_ascii_digit() || c == '-' {
                    cur.text.push(c);
                    true
                } else {
                    false
                }
            }
            Some(TokenKind::Time) => {
                if c.is_ascii_digit() {
                    cur.text.push(c);
                    true
                } else {
                    false
                }
            }
            _ => false,
        };
        if kept {
            continue;
        }

        let closed_name = cur.kind_name();
        flush(&mut queue, std::mem::take(&mut cur))?;

        match c {
            _ if c.is_alphabetic() => cur = Scratch::open(TokenKind::Text, c),
            _ if c.is_ascii_digit() => cur = Scratch::open(TokenKind::Number, c),
            '+' => cur = Scratch::open(TokenKind::Plus, c),
            ' ' => {}
            _ => {
                return Err(ParseError::invalid(
                    format!("malformed value: type {closed_name}, val \"{c}\""),
                    None,
                ));
            }
        }
    }

    flush(&mut queue, cur)?;

    Ok(queue)
}

/// Close the token under construction, classify it, and enqueue it.
fn flush(queue: &mut TokenQueue, scratch: Scratch) -> Result<(), ParseError> {
    let Some(kind) = scratch.kind else {
        return Ok(());
    };
    queue.push(finish(scratch.text, kind)?);
    Ok(())
}

/// Finalization pass for a closed token.
fn finish(text: String, kind: TokenKind) -> Result<Token, ParseError> {
    let mut tok = Token {
        text,
        kind,
        ..Token::default()
    };

    match tok.kind {
        TokenKind::Text => {
            if let Some(reserved) = keyword_kind(&tok.text) {
                tok.kind = reserved;
                // three reserved words are fixed literal times
                match reserved {
                    TokenKind::Noon => {
                        tok.kind = TokenKind::Time;
                        tok.hour = 12;
                        tok.minute = 0;
                    }
                    TokenKind::Midnight => {
                        tok.kind = TokenKind::Time;
                        tok.hour = 0;
                        tok.minute = 0;
                    }
                    TokenKind::EndOfDay => {
                        tok.kind = TokenKind::Time;
                        tok.hour = 17;
                        tok.minute = 0;
                    }
                    _ => {}
                }
            }
        }
        TokenKind::Number => {
            // a digit run too large for i64 saturates
            tok.num = tok.text.parse().unwrap_or(i64::MAX);
        }
        TokenKind::Time => {
            // built from digits around a single ':'
            let (hour, minute) = tok.text.split_once(':').unwrap_or((tok.text.as_str(), ""));
            tok.hour = hour.parse().unwrap_or(i32::MAX);
            tok.minute = if minute.is_empty() {
                0
            } else {
                minute.parse().unwrap_or(i32::MAX)
            };
        }
        TokenKind::Date => {
            let Some((year, month, day)) = split_iso_date(&tok.text) else {
                return Err(ParseError::invalid(
                    format!("invalid date format [{}]", tok.text),
                    None,
                ));
            };
            tok.year = year;
            tok.month = month;
            tok.day = day;
            if let Err(err) = date_valid(year, month, day) {
                return Err(ParseError::date_invalid(
                    format!("invalid date: [{}] ({err})", tok.text),
                    Some(tok),
                ));
            }
        }
        _ => {}
    }

    Ok(tok)
}

/// Split a strict `yyyy-mm-dd` literal into numeric fields.
fn split_iso_date(s: &str) -> Option<(i32, i32, i32)> {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    Some((digits(s, 0..4)?, digits(s, 5..7)?, digits(s, 8..10)?))
}

fn digits(s: &str, range: std::ops::Range<usize>) -> Option<i32> {
    let part = s.get(range)?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

// ── Tests ───────────────────────────────────────────────────────────────────
