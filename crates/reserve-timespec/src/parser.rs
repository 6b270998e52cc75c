//! The grammar interpreter and the two public entry points.
//!
//! [`parse_range`] resolves a phrase into a `(start, end)` pair and
//! [`parse_duration`] into a single end instant. Both take the caller's
//! `now` explicitly, so resolution is deterministic and testable against a
//! fixed clock, and both are generic over the zone of `now`.
//!
//! The interpreter consumes the token queue front to back. Each leading
//! token kind selects one grammar production; within a range the second
//! timespec resolves relative to the first, except `tomorrow`, which is
//! always relative to `now`.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike};

use crate::calendar::{date_valid, round_to_minute, HourMode, TimeBuilder};
use crate::error::{ErrorKind, ParseError};
use crate::lexer::lex;
use crate::token::{month_number, weekday_number, Token, TokenKind, TokenQueue};

// ── Entry points ────────────────────────────────────────────────────────────

/// Resolve a phrase into a reservation window.
///
/// A lone timespec is a window starting at `now`; `<start> to <end>`,
/// `<start> until <end>`, and `<start> + <duration>` forms produce explicit
/// windows. The end instant is rounded to the minute.
pub fn parse_range<Tz: TimeZone>(
    now: DateTime<Tz>,
    words: &[&str],
) -> Result<(DateTime<Tz>, DateTime<Tz>), ParseError> {
    let mut tokens = lex(words)?;

    let mut lead = tokens.peek().map_err(|_| insufficient())?.kind;
    while lead == TokenKind::From {
        tokens.pop()?;
        lead = tokens.peek().map_err(|_| insufficient())?.kind;
    }
    if matches!(lead, TokenKind::Until | TokenKind::To) {
        tokens.pop()?;
    }

    let first = parse_time_spec(&now, &now, &mut tokens)?.into_datetime();

    if first < now {
        return Err(ParseError::invalid("start is in the past".to_string(), None));
    }

    // a leading separator or plus means the start is now
    if matches!(lead, TokenKind::Plus | TokenKind::Until | TokenKind::To) {
        return Ok((now, first));
    }

    if tokens.is_empty() {
        return Ok((now, first));
    }
    let sep = tokens.peek()?.kind;

    let start = first;

    if !matches!(
        sep,
        TokenKind::Until | TokenKind::To | TokenKind::Plus | TokenKind::For
    ) {
        return Err(ParseError::invalid(
            "missing separator between start and end".to_string(),
            None,
        ));
    }

    // plus and for stay queued; the interpreter dispatches on them
    if !matches!(sep, TokenKind::Plus | TokenKind::For) {
        tokens.pop()?;
    }

    let end = parse_time_spec(&now, &start, &mut tokens)?.into_datetime();

    if let Ok(extra) = tokens.peek() {
        return Err(ParseError::invalid(
            "extra arguments beyond timespec".to_string(),
            Some(extra.clone()),
        ));
    }

    let end = round_to_minute(end)?;

    if end < start {
        return Err(ParseError::invalid("end before start".to_string(), None));
    }

    Ok((start, end))
}

/// Resolve a phrase into a single end instant relative to `now`, for
/// extending an existing reservation.
pub fn parse_duration<Tz: TimeZone>(
    now: DateTime<Tz>,
    words: &[&str],
) -> Result<DateTime<Tz>, ParseError> {
    let mut tokens = lex(words)?;

    let lead = tokens.peek().map_err(|_| insufficient())?.kind;
    if matches!(lead, TokenKind::Until | TokenKind::To) {
        tokens.pop()?;
    }

    let end = parse_time_spec(&now, &now, &mut tokens)?.into_datetime();

    if end < now {
        return Err(ParseError::invalid("start is in the past".to_string(), None));
    }

    Ok(end)
}

fn insufficient() -> ParseError {
    ParseError::end_of_input("insufficient timespec in arguments")
}

// ── Grammar interpreter ─────────────────────────────────────────────────────

fn unknown_value(tok: Token) -> ParseError {
    ParseError::invalid(
        format!("unknown date/time value: \"{}\" ({})", tok.text, tok.kind),
        Some(tok),
    )
}

/// Resolve one timespec from the front of the queue.
///
/// `anchor` supplies the default date and time-of-day fields; it is `now`
/// for a first timespec and the resolved start for a second one. `now` is
/// threaded separately because a trailing `tomorrow` re-anchors to it.
fn parse_time_spec<Tz: TimeZone>(
    now: &DateTime<Tz>,
    anchor: &DateTime<Tz>,
    tokens: &mut TokenQueue,
) -> Result<TimeBuilder<Tz>, ParseError> {
    let mut partial: Option<TimeBuilder<Tz>> = None;

    loop {
        let tok = tokens.pop()?;

        match tok.kind {
            TokenKind::Now => {
                partial = Some(TimeBuilder::new(anchor));
            }

            // tomorrow [<time>]
            TokenKind::Tomorrow => {
                let mut spec = partial.take().unwrap_or_else(|| TimeBuilder::new(now));
                match spec.read_time_of_day(tokens, HourMode::TimeOrNumber) {
                    Ok(()) => {}
                    Err(err) if err.kind == ErrorKind::EndOfInput => {}
                    Err(err) => return Err(err),
                }
                spec.next_day()?;
                return Ok(spec);
            }

            // <weekday> [<time>]
            TokenKind::WeekdayName => {
                let target = weekday_number(&tok.text).ok_or_else(|| unknown_value(tok))?;
                let today = i64::from(anchor.weekday().num_days_from_sunday());
                let target = if target < today { target + 7 } else { target };

                let mut spec = TimeBuilder::new(anchor);
                spec.add_days(target - today)?;

                match spec.read_time_of_day(tokens, HourMode::TimeOrNumber) {
                    Ok(()) => {}
                    Err(err) if err.kind == ErrorKind::EndOfInput => {}
                    Err(err) => return Err(err),
                }
                return Ok(spec);
            }

            // <month> <day>[<ordinal>] <hh:mm> [<year>]
            TokenKind::MonthName => {
                let month = month_number(&tok.text).ok_or_else(|| unknown_value(tok))?;
                let mut year = i64::from(anchor.year());
                if month < i64::from(anchor.month()) {
                    year += 1;
                }

                let day = tokens.get(TokenKind::Number)?;
                if let Err(err) =
                    date_valid(year as i32, month as i32, day.num.clamp(0, 99) as i32)
                {
                    return Err(ParseError::date_invalid(err.message, Some(day)));
                }

                let mut spec = TimeBuilder::from_fields(
                    &anchor.timezone(),
                    year,
                    month,
                    day.num,
                    i64::from(anchor.hour()),
                    i64::from(anchor.minute()),
                )?;

                // consume and discard any ordinal suffix
                let _ = tokens.get(TokenKind::Ordinal);

                spec.read_time_of_day(tokens, HourMode::TimeOnly)?;

                if let Ok(yr) = tokens.get(TokenKind::Number) {
                    if yr.text.len() < 4 {
                        return Err(ParseError::invalid(
                            "year needs to be four digits".to_string(),
                            Some(yr),
                        ));
                    }
                    spec.set_year(yr.num)?;
                }
                return Ok(spec);
            }

            // <date> [<time>]
            TokenKind::Date => {
                let mut spec = TimeBuilder::from_fields(
                    &anchor.timezone(),
                    i64::from(tok.year),
                    i64::from(tok.month),
                    i64::from(tok.day),
                    i64::from(anchor.hour()),
                    i64::from(anchor.minute()),
                )?;
                // a date alone is fine; a following non-time token belongs
                // to the enclosing range grammar
                match spec.read_time_of_day(tokens, HourMode::TimeOrNumber) {
                    Ok(()) => {}
                    Err(err) if err.kind == ErrorKind::EndOfInput => {}
                    Err(err) if err.message.starts_with("expected time") => {}
                    Err(err) => return Err(err),
                }
                return Ok(spec);
            }

            // <time> [am|pm] [tomorrow]
            TokenKind::Time => {
                let mut spec = TimeBuilder::new(anchor);
                spec.set_hour(i64::from(tok.hour))?;
                spec.set_minute(i64::from(tok.minute))?;
                spec.read_am_pm(tokens)?;

                if tokens.get(TokenKind::Tomorrow).is_ok() {
                    rebase_to_tomorrow(&mut spec, now)?;
                }
                return Ok(spec);
            }

            // <number> [am|pm] [tomorrow], or a bare hour count
            TokenKind::Number => {
                let mut spec = TimeBuilder::new(anchor);

                if tokens.is_empty() {
                    spec.add_hours(tok.num)?;
                    return Ok(spec);
                }

                spec.set_hour(tok.num)?;
                spec.set_minute(0)?;
                spec.read_am_pm(tokens)?;

                if tokens.get(TokenKind::Tomorrow).is_ok() {
                    rebase_to_tomorrow(&mut spec, now)?;
                }
                return Ok(spec);
            }

            // [plus|for] <number> [<unit>]
            TokenKind::For | TokenKind::Plus => {
                let mut spec = partial.take().unwrap_or_else(|| TimeBuilder::new(anchor));
                let d = parse_relative_duration(tokens)?;
                spec.add_minutes(d)?;
                return Ok(spec);
            }

            _ => return Err(unknown_value(tok)),
        }
    }
}

/// A trailing `tomorrow` keeps the built time-of-day but re-anchors the
/// date to the day after `now`.
fn rebase_to_tomorrow<Tz: TimeZone>(
    spec: &mut TimeBuilder<Tz>,
    now: &DateTime<Tz>,
) -> Result<(), ParseError> {
    spec.set_year(i64::from(now.year()))?;
    spec.set_month(i64::from(now.month()))?;
    spec.set_day(i64::from(now.day()))?;
    spec.next_day()
}

/// `<number> [<unit>]` where the unit defaults to hours when the queue
/// runs out.
fn parse_relative_duration(tokens: &mut TokenQueue) -> Result<Duration, ParseError> {
    let num = match tokens.get(TokenKind::Number) {
        Ok(num) => num,
        Err(err) if err.kind == ErrorKind::NotFound => {
            return Err(ParseError::invalid(
                "expect numeric value in duration".to_string(),
                err.token,
            ));
        }
        Err(_) => return Err(ParseError::end_of_input("expect duration")),
    };

    let unit = match tokens.pop() {
        Ok(unit) => unit,
        Err(_) => Token {
            text: "hours".to_string(),
            kind: TokenKind::RelativeHours,
            ..Token::default()
        },
    };

    let scale = match unit.kind {
        TokenKind::RelativeHours => 1,
        TokenKind::RelativeDays => 24,
        TokenKind::RelativeWeeks => 24 * 7,
        _ => {
            return Err(ParseError::invalid(
                format!("invalid duration qualifier: {}", unit.text),
                Some(unit),
            ));
        }
    };

    num.num
        .checked_mul(scale)
        .and_then(Duration::try_hours)
        .ok_or_else(|| ParseError::invalid("duration out of range".to_string(), Some(num)))
}

// ── Tests ───────────────────────────────────────────────────────────────────
