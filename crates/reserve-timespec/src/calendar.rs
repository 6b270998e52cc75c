//! Calendar validation, rounding, and the absolute-time builder.
//!
//! Everything here works in the wall-clock of a caller-supplied
//! [`chrono::TimeZone`]. Field arithmetic normalizes the way a calendar
//! does: month 13 rolls into January of the next year, day 0 is the last
//! day of the previous month, hour 24 is midnight of the next day. Rounding
//! always lands reservations on half-hour boundaries.

use chrono::{DateTime, Datelike, Duration, DurationRound, NaiveDate, NaiveTime, TimeZone, Timelike};

use crate::error::ParseError;
use crate::token::{Token, TokenKind, TokenQueue};

// ── Calendar validation ─────────────────────────────────────────────────────

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn has_31_days(month: i32) -> bool {
    matches!(month, 1 | 3 | 5 | 7 | 8 | 10 | 12)
}

/// Check that a year/month/day triple names a real calendar date.
///
/// The message is user-facing; the lexer embeds it in its "invalid date"
/// diagnostic.
pub fn date_valid(year: i32, month: i32, day: i32) -> Result<(), ParseError> {
    let fail = |msg: &str| {
        Err(ParseError::date_invalid(
            msg.to_string(),
            Some(Token {
                year,
                month,
                day,
                ..Token::default()
            }),
        ))
    };

    if month == 0 {
        return fail("month is zero");
    }
    if month > 12 {
        return fail("month too large");
    }
    if day == 0 {
        return fail("day is zero");
    }
    if month == 2 {
        let cap = if is_leap_year(year) { 29 } else { 28 };
        if day > cap {
            return fail("day too large");
        }
    }
    let cap = if has_31_days(month) { 31 } else { 30 };
    if day > cap {
        return fail("day too large");
    }

    Ok(())
}

// ── Field arithmetic ────────────────────────────────────────────────────────

fn out_of_range() -> ParseError {
    ParseError::date_invalid("date out of range".to_string(), None)
}

/// Build a zoned timestamp from loose field values, normalizing overflow.
///
/// Months normalize first (month 0 is December of the previous year), then
/// the day offset and the time of day are applied as whole-day and
/// whole-minute shifts from the first of the month at midnight. Seconds are
/// always zero.
fn from_field_values<Tz: TimeZone>(
    tz: &Tz,
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
) -> Result<DateTime<Tz>, ParseError> {
    let year = year
        .checked_add((month - 1).div_euclid(12))
        .ok_or_else(out_of_range)?;
    let month = (month - 1).rem_euclid(12) + 1;

    let year = i32::try_from(year).map_err(|_| out_of_range())?;
    let first = NaiveDate::from_ymd_opt(year, month as u32, 1).ok_or_else(out_of_range)?;

    let days = day.checked_sub(1).and_then(Duration::try_days).ok_or_else(out_of_range)?;
    let minutes = hour
        .checked_mul(60)
        .and_then(|m| m.checked_add(minute))
        .and_then(Duration::try_minutes)
        .ok_or_else(out_of_range)?;

    let naive = first
        .and_time(NaiveTime::MIN)
        .checked_add_signed(days)
        .and_then(|t| t.checked_add_signed(minutes))
        .ok_or_else(out_of_range)?;

    resolve_local(tz, naive)
}

/// Map a wall-clock time into the zone. An ambiguous time (fall-back
/// overlap) takes its earlier reading; a nonexistent time (spring-forward
/// gap) skips an hour ahead.
fn resolve_local<Tz: TimeZone>(
    tz: &Tz,
    naive: chrono::NaiveDateTime,
) -> Result<DateTime<Tz>, ParseError> {
    if let Some(t) = tz.from_local_datetime(&naive).earliest() {
        return Ok(t);
    }
    let shifted = naive
        .checked_add_signed(Duration::hours(1))
        .ok_or_else(out_of_range)?;
    tz.from_local_datetime(&shifted)
        .earliest()
        .ok_or_else(out_of_range)
}

fn advance<Tz: TimeZone>(t: &DateTime<Tz>, d: Duration) -> Result<DateTime<Tz>, ParseError> {
    t.clone().checked_add_signed(d).ok_or_else(out_of_range)
}

// ── Rounding ────────────────────────────────────────────────────────────────

fn round_to_half_hour<Tz: TimeZone>(t: DateTime<Tz>) -> Result<DateTime<Tz>, ParseError> {
    t.duration_round(Duration::minutes(30))
        .map_err(|_| out_of_range())
}

/// Round to a half-hour boundary with a 14-minute forward bias, so :01
/// through :15 land on :30 rather than snapping back to :00.
pub fn round_up<Tz: TimeZone>(t: DateTime<Tz>) -> Result<DateTime<Tz>, ParseError> {
    round_to_half_hour(advance(&t, Duration::minutes(14))?)
}

pub(crate) fn round_to_minute<Tz: TimeZone>(t: DateTime<Tz>) -> Result<DateTime<Tz>, ParseError> {
    t.duration_round(Duration::minutes(1))
        .map_err(|_| ParseError::date_invalid("timestamp out of range".to_string(), None))
}

// ── Time builder ────────────────────────────────────────────────────────────

/// Whether [`TimeBuilder::read_time_of_day`] accepts a bare hour number in
/// place of an `hh:mm` token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum HourMode {
    TimeOnly,
    TimeOrNumber,
}

/// One absolute timestamp under construction.
///
/// Setters rebuild the timestamp from its wall-clock fields, so an
/// out-of-range field rolls over instead of erroring: setting hour 24 on
/// April 1 yields April 2 at 00:00. Seconds are truncated at construction
/// and stay zero through every mutation.
pub struct TimeBuilder<Tz: TimeZone> {
    time: DateTime<Tz>,
}

impl<Tz: TimeZone> TimeBuilder<Tz> {
    /// Start from an existing timestamp, truncating below the minute.
    pub fn new(base: &DateTime<Tz>) -> Self {
        let trim = Duration::seconds(i64::from(base.second()))
            + Duration::nanoseconds(i64::from(base.nanosecond()));
        let time = base
            .clone()
            .checked_sub_signed(trim)
            .unwrap_or_else(|| base.clone());
        Self { time }
    }

    /// Start from loose field values, normalizing overflow.
    pub fn from_fields(
        tz: &Tz,
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            time: from_field_values(tz, year, month, day, hour, minute)?,
        })
    }

    fn fields(&self) -> (i64, i64, i64, i64, i64) {
        (
            i64::from(self.time.year()),
            i64::from(self.time.month()),
            i64::from(self.time.day()),
            i64::from(self.time.hour()),
            i64::from(self.time.minute()),
        )
    }

    fn rebuild(
        &mut self,
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
    ) -> Result<(), ParseError> {
        self.time = from_field_values(&self.time.timezone(), year, month, day, hour, minute)?;
        Ok(())
    }

    pub fn set_year(&mut self, year: i64) -> Result<(), ParseError> {
        let (_, month, day, hour, minute) = self.fields();
        self.rebuild(year, month, day, hour, minute)
    }

    pub fn set_month(&mut self, month: i64) -> Result<(), ParseError> {
        let (year, _, day, hour, minute) = self.fields();
        self.rebuild(year, month, day, hour, minute)
    }

    pub fn set_day(&mut self, day: i64) -> Result<(), ParseError> {
        let (year, month, _, hour, minute) = self.fields();
        self.rebuild(year, month, day, hour, minute)
    }

    pub fn set_hour(&mut self, hour: i64) -> Result<(), ParseError> {
        let (year, month, day, _, minute) = self.fields();
        self.rebuild(year, month, day, hour, minute)
    }

    pub fn set_minute(&mut self, minute: i64) -> Result<(), ParseError> {
        let (year, month, day, hour, _) = self.fields();
        self.rebuild(year, month, day, hour, minute)
    }

    /// Shift to the same wall-clock time on the next calendar day.
    pub fn next_day(&mut self) -> Result<(), ParseError> {
        self.add_days(1)
    }

    /// Calendar-day shift: the date moves, the time of day stays put.
    pub fn add_days(&mut self, days: i64) -> Result<(), ParseError> {
        let (year, month, day, hour, minute) = self.fields();
        let day = day.checked_add(days).ok_or_else(out_of_range)?;
        self.rebuild(year, month, day, hour, minute)
    }

    /// Calendar-month shift, normalizing day overflow forward.
    pub fn add_months(&mut self, months: i64) -> Result<(), ParseError> {
        let (year, month, day, hour, minute) = self.fields();
        let month = month.checked_add(months).ok_or_else(out_of_range)?;
        self.rebuild(year, month, day, hour, minute)
    }

    /// Add a minute-granularity duration and round to the half hour. If the
    /// nearest boundary undershoots the requested duration, round the
    /// unrounded sum up instead so the caller never gets less time than
    /// asked for.
    pub fn add_minutes(&mut self, d: Duration) -> Result<(), ParseError> {
        let naive = advance(&self.time, d)?;
        let rounded = round_to_half_hour(naive.clone())?;
        self.time = if rounded.clone().signed_duration_since(&self.time) < d {
            round_up(naive)?
        } else {
            rounded
        };
        Ok(())
    }

    /// Add whole hours, then round up to the half hour. If the elapsed
    /// delta comes up short of the nominal duration the duration is applied
    /// a second time before rounding.
    pub fn add_hours(&mut self, hours: i64) -> Result<(), ParseError> {
        let d = Duration::try_hours(hours).ok_or_else(|| {
            ParseError::date_invalid("duration out of range".to_string(), None)
        })?;
        let stepped = advance(&self.time, d)?;
        let stepped = if stepped.clone().signed_duration_since(&self.time) < d {
            advance(&stepped, d)?
        } else {
            stepped
        };
        self.time = round_up(stepped)?;
        Ok(())
    }

    /// Consume an optional `am`/`pm` token. `pm` shifts the built time
    /// forward twelve hours and rejects hours already in the afternoon.
    pub fn read_am_pm(&mut self, tokens: &mut TokenQueue) -> Result<(), ParseError> {
        if tokens.get(TokenKind::Am).is_ok() {
            return Ok(());
        }
        if let Ok(tok) = tokens.get(TokenKind::Pm) {
            if self.time.hour() >= 12 {
                return Err(ParseError::invalid(
                    format!(
                        "time out of range: {:02}:{:02}PM",
                        self.time.hour(),
                        self.time.minute()
                    ),
                    Some(tok),
                ));
            }
            self.time = advance(&self.time, Duration::hours(12))?;
        }
        Ok(())
    }

    /// Consume a time-of-day from the queue onto the built date: an `hh:mm`
    /// token, or in [`HourMode::TimeOrNumber`] a bare hour number, followed
    /// by an optional am/pm suffix.
    pub fn read_time_of_day(
        &mut self,
        tokens: &mut TokenQueue,
        mode: HourMode,
    ) -> Result<(), ParseError> {
        let next = tokens.peek()?.clone();

        match next.kind {
            TokenKind::Time => {
                tokens.pop()?;
                self.set_hour(i64::from(next.hour))?;
                self.set_minute(i64::from(next.minute))?;
            }
            TokenKind::Number if mode == HourMode::TimeOrNumber => {
                tokens.pop()?;
                self.set_hour(next.num)?;
                self.set_minute(0)?;
            }
            _ => {
                return Err(ParseError::invalid(
                    format!("expected time, got \"{}\"", next.text),
                    Some(next),
                ));
            }
        }

        self.read_am_pm(tokens)
    }

    pub fn into_datetime(self) -> DateTime<Tz> {
        self.time
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;
    use proptest::prelude::*;

    fn nyc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<chrono_tz::Tz> {
        New_York.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    // ── leap year tests ──

    #[test]
    fn test_leap_year() {
        for (year, leap) in [(2016, true), (1900, false), (1700, false), (2000, true), (2015, false)] {
            assert_eq!(is_leap_year(year), leap, "{year}");
        }
    }

    // ── date validation tests ──

    #[test]
    fn test_date_valid() {
        let cases = [
            (2016, 2, 28, true),
            (2016, 2, 29, true),
            (2016, 2, 30, false),
            (1700, 2, 28, true),
            (1700, 2, 29, false),
            (1700, 2, 30, false),
            (2000, 2, 28, true),
            (2000, 2, 29, true),
            (2000, 2, 30, false),
            (2015, 2, 28, true),
            (2015, 2, 29, false),
            (2015, 2, 30, false),
            (2015, 1, 31, true),
            (2015, 1, 32, false),
            (2015, 4, 30, true),
            (2015, 4, 31, false),
            (2015, 0, 1, false),
            (2015, 14, 1, false),
            (2015, 4, 0, false),
        ];
        for (year, month, day, valid) in cases {
            assert_eq!(
                date_valid(year, month, day).is_ok(),
                valid,
                "{year}-{month}-{day}"
            );
        }
    }

    #[test]
    fn test_date_valid_messages() {
        assert_eq!(date_valid(2015, 0, 1).unwrap_err().to_string(), "month is zero");
        assert_eq!(date_valid(2015, 14, 1).unwrap_err().to_string(), "month too large");
        assert_eq!(date_valid(2015, 4, 0).unwrap_err().to_string(), "day is zero");
        assert_eq!(date_valid(2015, 2, 29).unwrap_err().to_string(), "day too large");
    }

    proptest! {
        // agree with the chrono calendar over a wide field range
        #[test]
        fn date_valid_matches_chrono(y in 1500i32..2600, m in 0i32..15, d in 0i32..40) {
            let chrono_ok = m > 0 && d > 0
                && NaiveDate::from_ymd_opt(y, m as u32, d as u32).is_some();
            prop_assert_eq!(date_valid(y, m, d).is_ok(), chrono_ok);
        }
    }

    // ── normalization tests ──

    #[test]
    fn test_field_overflow_normalizes() {
        let t = TimeBuilder::from_fields(&New_York, 2017, 13, 1, 0, 0)
            .unwrap()
            .into_datetime();
        assert_eq!(t, nyc(2018, 1, 1, 0, 0));

        let t = TimeBuilder::from_fields(&New_York, 2017, 3, 0, 12, 0)
            .unwrap()
            .into_datetime();
        assert_eq!(t, nyc(2017, 2, 28, 12, 0));

        let t = TimeBuilder::from_fields(&New_York, 2017, 4, 1, 24, 0)
            .unwrap()
            .into_datetime();
        assert_eq!(t, nyc(2017, 4, 2, 0, 0));

        let t = TimeBuilder::from_fields(&New_York, 2017, 4, 1, 0, 90)
            .unwrap()
            .into_datetime();
        assert_eq!(t, nyc(2017, 4, 1, 1, 30));
    }

    #[test]
    fn test_setters_roll_over() {
        // setting hour 24 rolls the date forward
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 23, 47));
        b.set_hour(24).unwrap();
        b.set_minute(0).unwrap();
        assert_eq!(b.into_datetime(), nyc(2017, 4, 2, 0, 0));
    }

    #[test]
    fn test_new_truncates_seconds() {
        let base = New_York.with_ymd_and_hms(2017, 4, 1, 23, 47, 33).unwrap();
        let b = TimeBuilder::new(&base);
        assert_eq!(b.into_datetime(), nyc(2017, 4, 1, 23, 47));
    }

    #[test]
    fn test_spring_forward_gap_skips_ahead() {
        // 2017-03-12 02:30 does not exist in New York
        let t = TimeBuilder::from_fields(&New_York, 2017, 3, 12, 2, 30)
            .unwrap()
            .into_datetime();
        assert_eq!(t, nyc(2017, 3, 12, 3, 30));
    }

    // ── rounding tests ──

    #[test]
    fn test_round_up() {
        assert_eq!(round_up(nyc(2017, 4, 1, 10, 1)).unwrap(), nyc(2017, 4, 1, 10, 30));
        assert_eq!(round_up(nyc(2017, 4, 1, 10, 16)).unwrap(), nyc(2017, 4, 1, 10, 30));
        assert_eq!(round_up(nyc(2017, 4, 1, 10, 17)).unwrap(), nyc(2017, 4, 1, 10, 30));
        assert_eq!(round_up(nyc(2017, 4, 1, 13, 58)).unwrap(), nyc(2017, 4, 1, 14, 0));
        assert_eq!(round_up(nyc(2017, 4, 1, 10, 0)).unwrap(), nyc(2017, 4, 1, 10, 0));
    }

    #[test]
    fn test_add_hours_rounds_up() {
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 7, 58));
        b.add_hours(6).unwrap();
        assert_eq!(b.into_datetime(), nyc(2017, 4, 1, 14, 0));
    }

    #[test]
    fn test_add_minutes_rounds_to_half_hour() {
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 23, 58));
        b.add_minutes(Duration::hours(1)).unwrap();
        assert_eq!(b.into_datetime(), nyc(2017, 4, 2, 1, 0));
    }

    #[test]
    fn test_add_minutes_never_undershoots() {
        // 09:36 + 15h = 00:36; the nearest half hour (00:30) is less than
        // 15 hours out, so the sum rounds up to 01:00 instead
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 9, 36));
        b.add_minutes(Duration::hours(15)).unwrap();
        assert_eq!(b.into_datetime(), nyc(2017, 4, 2, 1, 0));
    }

    // ── am/pm tests ──

    #[test]
    fn test_pm_rejects_afternoon_hours() {
        let mut tokens = crate::lexer::lex(&["15pm"]).unwrap();
        tokens.pop().unwrap(); // the number
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 15, 0));
        let err = b.read_am_pm(&mut tokens).unwrap_err();
        assert_eq!(err.to_string(), "time out of range: 15:00PM");
    }

    #[test]
    fn test_pm_shifts_morning_hours() {
        let mut tokens = crate::lexer::lex(&["4:30pm"]).unwrap();
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 0, 0));
        b.read_time_of_day(&mut tokens, HourMode::TimeOnly).unwrap();
        assert_eq!(b.into_datetime(), nyc(2017, 4, 1, 16, 30));
    }

    #[test]
    fn test_time_only_mode_rejects_bare_number() {
        let mut tokens = crate::lexer::lex(&["9", "am"]).unwrap();
        let mut b = TimeBuilder::new(&nyc(2017, 4, 1, 0, 0));
        let err = b.read_time_of_day(&mut tokens, HourMode::TimeOnly).unwrap_err();
        assert_eq!(err.to_string(), "expected time, got \"9\"");
    }
}
