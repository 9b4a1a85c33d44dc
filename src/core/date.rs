// src/core/date.rs — Calendar date parsing/formatting (DD.MM.YYYY)

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

/// The one textual date pattern accepted and emitted everywhere.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid date '{input}', expected DD.MM.YYYY")]
pub struct DateError {
    pub input: String,
}

/// Parse `DD.MM.YYYY`. Surrounding whitespace is ignored; anything else
/// (single-digit day, two-digit year, other separators) is rejected.
pub fn parse_date(text: &str) -> Result<NaiveDate, DateError> {
    let trimmed = text.trim();
    let err = || DateError {
        input: trimmed.to_string(),
    };

    let bytes = trimmed.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[2] == b'.'
        && bytes[5] == b'.'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
    if !shape_ok {
        return Err(err());
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| err())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the trailing one-year window that ends on `calc` (inclusive).
///
/// `calc - 1 year` on 29 February rolls forward to 1 March, then one day is
/// added, so the window never reaches back past the same calendar day.
pub fn window_start(calc: NaiveDate) -> Option<NaiveDate> {
    let year_ago = NaiveDate::from_ymd_opt(calc.year() - 1, calc.month(), calc.day())
        .or_else(|| NaiveDate::from_ymd_opt(calc.year() - 1, 3, 1))?;
    year_ago.checked_add_signed(Duration::days(1))
}

/// Inclusive number of days in `[from, to]`; zero when the range is inverted.
pub fn inclusive_days(from: NaiveDate, to: NaiveDate) -> i64 {
    if from > to {
        0
    } else {
        (to - from).num_days() + 1
    }
}

pub fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.succ_opt()
}

pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}
