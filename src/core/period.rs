// src/core/period.rs — Stay periods and the chronology-preserving collection
//
// Every insertion goes through `PeriodData::insert_checked`; boundary edits
// are checked first (`entry_change` / `exit_change`) so the caller can offer
// explicit remedies instead of silently reordering.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::country::{self, UNKNOWN_COUNTRY, UNKNOWN_MARKER};
use super::date::{format_date, next_day, previous_day, DATE_FORMAT};

/// One contiguous stay. `entry` may be absent only on the first period,
/// `exit` only on the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(
        rename = "in",
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_date"
    )]
    pub entry: Option<NaiveDate>,
    #[serde(
        rename = "out",
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_date"
    )]
    pub exit: Option<NaiveDate>,
    pub country: String,
}

impl Period {
    pub fn new(entry: Option<NaiveDate>, exit: Option<NaiveDate>, country: impl Into<String>) -> Self {
        Self {
            entry,
            exit,
            country: country.into(),
        }
    }

    /// A synthesized `unknown` period covering `[from, to]`.
    pub fn gap(from: NaiveDate, to: NaiveDate) -> Self {
        Self::new(Some(from), Some(to), UNKNOWN_COUNTRY)
    }

    pub fn is_unknown(&self) -> bool {
        country::is_unknown(&self.country)
    }
}

/// A user's ordered periods plus the calculation date (`None` = today).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodData {
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_date")]
    pub current: Option<NaiveDate>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period #{position} does not exist (have {len})")]
    OutOfRange { position: usize, len: usize },

    #[error("country name is empty")]
    EmptyCountry,

    #[error("entry {} is after exit {}", .entry.format(DATE_FORMAT), .exit.format(DATE_FORMAT))]
    Inverted { entry: NaiveDate, exit: NaiveDate },

    #[error("period #{position} breaks chronology at {}", .boundary.format(DATE_FORMAT))]
    Chronology { position: usize, boundary: NaiveDate },

    #[error("period #{position} must have an entry date")]
    MissingEntry { position: usize },

    #[error("period #{position} must have an exit date")]
    MissingExit { position: usize },

    #[error("first period already starts without an entry date")]
    UnboundedStart,

    #[error("no gap before period #{position}")]
    NoGap { position: usize },
}

/// Result of checking a proposed boundary edit against the neighbour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCheck {
    /// Same value as stored.
    Unchanged,
    /// Abuts or leaves no multi-day hole; safe to commit.
    Clear,
    /// Overlaps the neighbour, whose facing boundary is `neighbor`.
    Overlap { neighbor: NaiveDate },
    /// Leaves the uncovered range `[from, to]` next to the neighbour.
    Gap { from: NaiveDate, to: NaiveDate },
}

impl PeriodData {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Period> {
        self.periods.get(index)
    }

    /// The as-of date for reports and open-ended periods.
    pub fn calc_date(&self, today: NaiveDate) -> NaiveDate {
        self.current.unwrap_or(today)
    }

    /// Convert a 1-based position typed by the user into an index.
    pub fn index_of(&self, position: usize) -> Result<usize, PeriodError> {
        if position == 0 || position > self.len() {
            return Err(PeriodError::OutOfRange {
                position,
                len: self.len(),
            });
        }
        Ok(position - 1)
    }

    fn check_index(&self, index: usize) -> Result<(), PeriodError> {
        if index >= self.len() {
            return Err(PeriodError::OutOfRange {
                position: index + 1,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Insert `period` at `at` after checking it against both neighbours.
    /// This is the only place the collection grows.
    pub fn insert_checked(
        &mut self,
        at: usize,
        period: Period,
        calc: NaiveDate,
    ) -> Result<(), PeriodError> {
        if at > self.len() {
            return Err(PeriodError::OutOfRange {
                position: at + 1,
                len: self.len(),
            });
        }
        if period.country.trim().is_empty() {
            return Err(PeriodError::EmptyCountry);
        }
        if let (Some(entry), Some(exit)) = (period.entry, period.exit) {
            if entry > exit {
                return Err(PeriodError::Inverted { entry, exit });
            }
        }

        let position = at + 1;

        // An open-ended predecessor is closed the day before the new entry.
        let mut close_prev = None;
        if at > 0 {
            let prev = &self.periods[at - 1];
            let prev_end = prev.exit.unwrap_or(calc);
            let entry = period.entry.ok_or(PeriodError::MissingEntry { position })?;
            if entry < prev_end {
                return Err(PeriodError::Chronology {
                    position,
                    boundary: prev_end,
                });
            }
            if prev.exit.is_none() {
                let closed = previous_day(entry)
                    .filter(|day| prev.entry.map_or(true, |start| start <= *day))
                    .ok_or(PeriodError::Chronology {
                        position,
                        boundary: prev.entry.unwrap_or(entry),
                    })?;
                close_prev = Some(closed);
            }
        }

        if let Some(next) = self.periods.get(at) {
            let next_entry = next.entry.ok_or(PeriodError::UnboundedStart)?;
            let exit = period.exit.ok_or(PeriodError::MissingExit { position })?;
            if exit > next_entry {
                return Err(PeriodError::Chronology {
                    position,
                    boundary: next_entry,
                });
            }
        }

        if let Some(closed) = close_prev {
            self.periods[at - 1].exit = Some(closed);
        }
        self.periods.insert(at, period);
        Ok(())
    }

    /// Add a period after the last one (open end allowed).
    pub fn append(&mut self, period: Period, calc: NaiveDate) -> Result<(), PeriodError> {
        let at = self.len();
        self.insert_checked(at, period, calc)
    }

    /// Add the earliest known period (open start allowed).
    pub fn prepend(&mut self, period: Period, calc: NaiveDate) -> Result<(), PeriodError> {
        self.insert_checked(0, period, calc)
    }

    /// Remove by 1-based position; later positions shift down by one.
    pub fn remove(&mut self, position: usize) -> Result<Period, PeriodError> {
        let index = self.index_of(position)?;
        Ok(self.periods.remove(index))
    }

    /// Check a proposed new entry date for the period at `index`.
    pub fn entry_change(&self, index: usize, new_in: NaiveDate) -> Result<BoundaryCheck, PeriodError> {
        self.check_index(index)?;
        let current = &self.periods[index];
        if current.entry == Some(new_in) {
            return Ok(BoundaryCheck::Unchanged);
        }
        if let Some(exit) = current.exit {
            if new_in > exit {
                return Err(PeriodError::Inverted {
                    entry: new_in,
                    exit,
                });
            }
        }

        let prev_out = index
            .checked_sub(1)
            .and_then(|i| self.periods.get(i))
            .and_then(|p| p.exit);
        let Some(prev_out) = prev_out else {
            return Ok(BoundaryCheck::Clear);
        };

        if new_in < prev_out {
            return Ok(BoundaryCheck::Overlap { neighbor: prev_out });
        }
        match (next_day(prev_out), previous_day(new_in)) {
            (Some(from), Some(to)) if from <= to => Ok(BoundaryCheck::Gap { from, to }),
            _ => Ok(BoundaryCheck::Clear),
        }
    }

    /// Check a proposed new exit date for the period at `index`.
    pub fn exit_change(&self, index: usize, new_out: NaiveDate) -> Result<BoundaryCheck, PeriodError> {
        self.check_index(index)?;
        let current = &self.periods[index];
        if current.exit == Some(new_out) {
            return Ok(BoundaryCheck::Unchanged);
        }
        if let Some(entry) = current.entry {
            if new_out < entry {
                return Err(PeriodError::Inverted {
                    entry,
                    exit: new_out,
                });
            }
        }

        let Some(next_in) = self.periods.get(index + 1).and_then(|p| p.entry) else {
            return Ok(BoundaryCheck::Clear);
        };

        if new_out > next_in {
            return Ok(BoundaryCheck::Overlap { neighbor: next_in });
        }
        match (next_day(new_out), previous_day(next_in)) {
            (Some(from), Some(to)) if from <= to => Ok(BoundaryCheck::Gap { from, to }),
            _ => Ok(BoundaryCheck::Clear),
        }
    }

    pub fn set_entry(&mut self, index: usize, date: NaiveDate) -> Result<(), PeriodError> {
        self.check_index(index)?;
        self.periods[index].entry = Some(date);
        Ok(())
    }

    pub fn set_exit(&mut self, index: usize, date: NaiveDate) -> Result<(), PeriodError> {
        self.check_index(index)?;
        self.periods[index].exit = Some(date);
        Ok(())
    }

    pub fn set_country(&mut self, index: usize, name: &str) -> Result<(), PeriodError> {
        self.check_index(index)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(PeriodError::EmptyCountry);
        }
        self.periods[index].country = name.to_string();
        Ok(())
    }

    /// Move the previous period's exit so it ends the day before `new_in`,
    /// then set `new_in` on the period at `index`. Both or neither change.
    pub fn shift_previous_exit(&mut self, index: usize, new_in: NaiveDate) -> Result<(), PeriodError> {
        self.check_index(index)?;
        let prev_index = index
            .checked_sub(1)
            .ok_or(PeriodError::OutOfRange { position: 0, len: self.len() })?;
        let prev_exit = previous_day(new_in).ok_or(PeriodError::Chronology {
            position: index,
            boundary: new_in,
        })?;
        if let Some(prev_entry) = self.periods[prev_index].entry {
            if prev_entry > prev_exit {
                return Err(PeriodError::Inverted {
                    entry: prev_entry,
                    exit: prev_exit,
                });
            }
        }
        self.periods[prev_index].exit = Some(prev_exit);
        self.periods[index].entry = Some(new_in);
        Ok(())
    }

    /// Move the next period's entry to the day after `new_out`, then set
    /// `new_out` on the period at `index`. Both or neither change.
    pub fn shift_next_entry(&mut self, index: usize, new_out: NaiveDate) -> Result<(), PeriodError> {
        self.check_index(index)?;
        let next_index = index + 1;
        self.check_index(next_index)?;
        let next_entry = next_day(new_out).ok_or(PeriodError::Chronology {
            position: next_index + 1,
            boundary: new_out,
        })?;
        if let Some(next_exit) = self.periods[next_index].exit {
            if next_entry > next_exit {
                return Err(PeriodError::Inverted {
                    entry: next_entry,
                    exit: next_exit,
                });
            }
        }
        self.periods[next_index].entry = Some(next_entry);
        self.periods[index].exit = Some(new_out);
        Ok(())
    }

    /// Materialize the hole between the previous period and `new_in` as an
    /// `unknown` period, then set `new_in` on the edited period.
    /// Returns the edited period's new index (shifted by one).
    pub fn insert_gap_before(
        &mut self,
        index: usize,
        new_in: NaiveDate,
        calc: NaiveDate,
    ) -> Result<usize, PeriodError> {
        let (from, to) = match self.entry_change(index, new_in)? {
            BoundaryCheck::Gap { from, to } => (from, to),
            _ => return Err(PeriodError::NoGap { position: index + 1 }),
        };

        let old_entry = self.periods[index].entry;
        self.periods[index].entry = Some(new_in);
        if let Err(e) = self.insert_checked(index, Period::gap(from, to), calc) {
            self.periods[index].entry = old_entry;
            return Err(e);
        }
        Ok(index + 1)
    }

    /// Human-readable numbered list of all periods.
    pub fn render_list(&self, today: NaiveDate) -> String {
        let calc = format_date(self.calc_date(today));
        let mut out = String::from("📋 Список периодов:\n\n");
        for (i, p) in self.periods.iter().enumerate() {
            let entry = p.entry.map(format_date).unwrap_or_else(|| "—".to_string());
            let exit = p
                .exit
                .map(format_date)
                .unwrap_or_else(|| format!("по {calc}"));
            let flag = if p.is_unknown() {
                format!("{UNKNOWN_MARKER} ")
            } else {
                country::flag_for(&p.country)
                    .map(|f| format!("{f} "))
                    .unwrap_or_default()
            };
            let _ = writeln!(out, "{}. {} — {} ({}{})", i + 1, entry, exit, flag, p.country);
        }
        out
    }
}

/// Serde adapter for optional `DD.MM.YYYY` strings; empty string reads as `None`.
pub(crate) mod opt_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::core::date::{format_date, parse_date};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&format_date(*date)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => parse_date(text).map(Some).map_err(de::Error::custom),
        }
    }
}

/// Serde adapter for a required `DD.MM.YYYY` string.
pub(crate) mod date_str {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::core::date::{format_date, parse_date};

    pub fn serialize<S: Serializer>(value: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_date(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse_date(&raw).map_err(de::Error::custom)
    }
}
