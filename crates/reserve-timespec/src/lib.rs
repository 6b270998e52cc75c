//! # reserve-timespec
//!
//! Natural-language time and date-range interpretation for the reservation
//! client.
//!
//! Phrases a person would type at a prompt resolve to absolute instants in
//! the caller's timezone, relative to a caller-supplied `now`:
//!
//! ```text
//! plus:         'plus' | '+' | 'for'
//! duration:     number [ 'hours' | 'days' | 'weeks' ]
//! time:         hh:mm [ am | pm ] | number [ am | pm ]
//! date:         yyyy-mm-dd
//! longdate:     month number [ ordinal ] hh:mm [ yyyy ]
//! dayspec:      dayname [ time ]
//! tomorrow:     time 'tomorrow' | 'tomorrow' time
//! timespec:     time | date [ time ] | longdate | dayspec | tomorrow
//!
//! range:        [ 'from' ] timespec [ ( 'to' | 'until' ) timespec
//!                                   | plus duration ]
//! ```
//!
//! `noon`, `midnight`, and `eod` are fixed times (12:00, 00:00, 17:00), and
//! `tomorrow` is always relative to `now` even when the rest of a second
//! timespec resolves relative to the start. Durations round to half-hour
//! boundaries, never below the requested length.
//!
//! Resolution is deterministic: the same `now` and the same words always
//! produce the same instants or the same error.
//!
//! ## Modules
//!
//! - [`lexer`] — character-class scanner: words → classified token queue
//! - [`token`] — token kinds, reserved words, the FIFO token queue
//! - [`calendar`] — date validation, rounding, the absolute-time builder
//! - [`parser`] — the grammar interpreter and the public entry points
//! - [`error`] — positional parse errors
//!
//! ```
//! use chrono::TimeZone;
//! use chrono_tz::America::New_York;
//!
//! let now = New_York.with_ymd_and_hms(2017, 4, 1, 8, 0, 0).unwrap();
//! let (start, end) =
//!     reserve_timespec::parse_range(now, &["noon", "tomorrow", "+", "5", "hours"]).unwrap();
//! assert_eq!(start.to_string(), "2017-04-02 12:00:00 EDT");
//! assert_eq!(end.to_string(), "2017-04-02 17:00:00 EDT");
//! ```

pub mod calendar;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use calendar::{date_valid, is_leap_year, round_up, HourMode, TimeBuilder};
pub use error::{ErrorKind, ParseError};
pub use lexer::lex;
pub use parser::{parse_duration, parse_range};
pub use token::{Token, TokenKind, TokenQueue};
