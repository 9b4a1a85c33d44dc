// src/core/report.rs — Trailing-year day accounting and residency verdict
//
// Pure: depends only on the period list and the calculation date.

use std::fmt::Write as _;

use chrono::NaiveDate;
use thiserror::Error;

use super::country::{self, UNKNOWN_COUNTRY, UNKNOWN_MARKER};
use super::date::{format_date, inclusive_days, next_day, previous_day, window_start};
use super::period::{Period, PeriodData};

/// Days in the window needed to be declared resident.
pub const RESIDENCY_THRESHOLD_DAYS: i64 = 183;

pub const NO_DATA_TEXT: &str = "Нет данных для анализа за указанный период.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("period #{position} is out of chronological order")]
    OutOfOrder { position: usize },

    #[error("period #{position} has no entry date")]
    MissingEntry { position: usize },

    #[error("calculation date is out of the supported range")]
    DateRange,
}

impl ReportError {
    /// The fixed text shown to the user instead of a report.
    pub fn user_text(&self) -> String {
        match self {
            ReportError::OutOfOrder { position } => {
                format!("Ошибка: периоды не в хронологическом порядке (период {position})")
            }
            ReportError::MissingEntry { position } => {
                format!("Ошибка: у периода {position} не указана дата въезда")
            }
            ReportError::DateRange => "Ошибка: дата расчёта вне допустимого диапазона".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryDays {
    pub country: String,
    pub days: i64,
}

impl CountryDays {
    pub fn is_unknown(&self) -> bool {
        country::is_unknown(&self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub window_start: NaiveDate,
    pub calc_date: NaiveDate,
    /// Descending by days; equal counts keep first-seen order.
    pub totals: Vec<CountryDays>,
}

/// Insertion-ordered accumulator so ties stay deterministic.
#[derive(Default)]
struct Tally(Vec<CountryDays>);

impl Tally {
    fn add(&mut self, country: &str, days: i64) {
        if days <= 0 {
            return;
        }
        match self.0.iter_mut().find(|c| c.country == country) {
            Some(entry) => entry.days += days,
            None => self.0.push(CountryDays {
                country: country.to_string(),
                days,
            }),
        }
    }
}

impl Report {
    pub fn compute(periods: &[Period], calc: NaiveDate) -> Result<Self, ReportError> {
        let start = window_start(calc).ok_or(ReportError::DateRange)?;
        let mut tally = Tally::default();
        let mut previous_out: Option<NaiveDate> = None;

        for (i, period) in periods.iter().enumerate() {
            let position = i + 1;
            let out = period.exit.unwrap_or(calc);

            let entry = match period.entry {
                Some(entry) => entry,
                None if i == 0 => {
                    if out < start {
                        continue;
                    }
                    start
                }
                None => return Err(ReportError::MissingEntry { position }),
            };

            if let Some(prev_out) = previous_out {
                if entry < prev_out {
                    return Err(ReportError::OutOfOrder { position });
                }
                if let (Some(gap_from), Some(gap_to)) = (next_day(prev_out), previous_day(entry)) {
                    let from = gap_from.max(start);
                    let to = gap_to.min(calc);
                    tally.add(UNKNOWN_COUNTRY, inclusive_days(from, to));
                }
            }

            // Unclipped, so the next gap is measured from the real boundary.
            previous_out = Some(out);

            if out < start {
                continue;
            }
            tally.add(&period.country, inclusive_days(entry.max(start), out.min(calc)));
        }

        let mut totals = tally.0;
        totals.sort_by(|a, b| b.days.cmp(&a.days));

        Ok(Self {
            window_start: start,
            calc_date: calc,
            totals,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn total_days(&self) -> i64 {
        self.totals.iter().map(|c| c.days).sum()
    }

    pub fn days_for(&self, country: &str) -> i64 {
        self.totals
            .iter()
            .find(|c| c.country == country)
            .map(|c| c.days)
            .unwrap_or(0)
    }

    /// Real country with the most days.
    pub fn leader(&self) -> Option<&CountryDays> {
        self.totals.iter().find(|c| !c.is_unknown())
    }

    /// The leader, if it reached the threshold.
    pub fn resident(&self) -> Option<&CountryDays> {
        self.leader()
            .filter(|c| c.days >= RESIDENCY_THRESHOLD_DAYS)
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_DATA_TEXT.to_string();
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "Анализ за период: {} — {}\n",
            format_date(self.window_start),
            format_date(self.calc_date)
        );

        for entry in &self.totals {
            if entry.is_unknown() {
                let _ = writeln!(out, "{UNKNOWN_MARKER} Неизвестно где: {} дней", entry.days);
            } else {
                let _ = writeln!(out, "{}{}: {} дней", flag_prefix(&entry.country), entry.country, entry.days);
            }
        }

        out.push('\n');
        match (self.resident(), self.leader()) {
            (Some(resident), _) => {
                let _ = writeln!(
                    out,
                    "✅ Налоговый резидент: {}{} ({} дней)",
                    flag_prefix(&resident.country),
                    resident.country,
                    resident.days
                );
            }
            (None, Some(leader)) => {
                let _ = writeln!(
                    out,
                    "⚠️ Нет страны с >={RESIDENCY_THRESHOLD_DAYS} днями. Больше всего в: {} ({} дней)",
                    leader.country, leader.days
                );
            }
            (None, None) => {
                let _ = writeln!(out, "⚠️ Нет страны с >={RESIDENCY_THRESHOLD_DAYS} днями.");
            }
        }
        out
    }
}

fn flag_prefix(country_name: &str) -> String {
    country::flag_for(country_name)
        .map(|f| format!("{f} "))
        .unwrap_or_default()
}

/// Report text for `data`, computed as of its calculation date (or `today`).
/// Validation failures come back as the fixed error text.
pub fn build_report(data: &PeriodData, today: NaiveDate) -> String {
    match Report::compute(&data.periods, data.calc_date(today)) {
        Ok(report) => report.render(),
        Err(e) => {
            tracing::debug!("report rejected: {e}");
            e.user_text()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::date::parse_date;
    use pretty_assertions::assert_eq;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn p(entry: Option<&str>, exit: Option<&str>, country: &str) -> Period {
        Period::new(entry.map(d), exit.map(d), country)
    }

    #[test]
    fn test_build_report_simple() {
        let data = PeriodData {
            current: Some(d("31.12.2023")),
            periods: vec![p(Some("01.01.2023"), Some("31.12.2023"), "Россия")],
        };
        let expected = "Анализ за период: 01.01.2023 — 31.12.2023\n\n🇷🇺 Россия: 365 дней\n\n✅ Налоговый резидент: 🇷🇺 Россия (365 дней)\n";
        assert_eq!(build_report(&data, d("01.01.2030")), expected);
    }

    #[test]
    fn test_single_day_counts_once() {
        let report = Report::compute(&[p(Some("05.05.2023"), Some("05.05.2023"), "Грузия")], d("31.12.2023")).unwrap();
        assert_eq!(report.days_for("Грузия"), 1);
    }

    #[test]
    fn test_open_start_anchored_at_window_start() {
        let report = Report::compute(&[p(None, Some("10.01.2023"), "Россия")], d("31.12.2023")).unwrap();
        assert_eq!(report.days_for("Россия"), 10);
    }

    #[test]
    fn test_open_start_before_window_is_skipped_without_gap() {
        let periods = vec![
            p(None, Some("01.06.2022"), "Россия"),
            p(Some("01.03.2023"), Some("31.12.2023"), "Грузия"),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        assert_eq!(report.days_for("Россия"), 0);
        assert_eq!(report.days_for(UNKNOWN_COUNTRY), 0);
        assert_eq!(report.days_for("Грузия"), 306);
    }

    #[test]
    fn test_open_end_runs_to_calc_date() {
        let report = Report::compute(&[p(Some("01.12.2023"), None, "Турция")], d("10.12.2023")).unwrap();
        assert_eq!(report.days_for("Турция"), 10);
    }

    #[test]
    fn test_gap_counted_as_unknown() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.01.2023"), "Россия"),
            p(Some("21.01.2023"), Some("31.12.2023"), "Грузия"),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        assert_eq!(report.days_for(UNKNOWN_COUNTRY), 10);
        assert_eq!(report.total_days(), 365);
    }

    #[test]
    fn test_gap_clipped_to_window() {
        let periods = vec![
            p(Some("01.01.2022"), Some("10.01.2022"), "Россия"),
            p(Some("01.07.2023"), Some("31.12.2023"), "Грузия"),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        // 01.01.2023..30.06.2023
        assert_eq!(report.days_for(UNKNOWN_COUNTRY), 181);
        assert_eq!(report.days_for("Россия"), 0);
    }

    #[test]
    fn test_out_of_order_names_position() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.02.2023"), "Россия"),
            p(Some("01.02.2023"), Some("31.12.2023"), "Грузия"),
        ];
        let data = PeriodData {
            periods,
            current: Some(d("31.12.2023")),
        };
        assert_eq!(
            build_report(&data, d("31.12.2023")),
            "Ошибка: периоды не в хронологическом порядке (период 2)"
        );
    }

    #[test]
    fn test_missing_entry_after_first() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.01.2023"), "Россия"),
            p(None, Some("31.12.2023"), "Грузия"),
        ];
        assert_eq!(
            Report::compute(&periods, d("31.12.2023")),
            Err(ReportError::MissingEntry { position: 2 })
        );
    }

    #[test]
    fn test_no_data_text() {
        let data = PeriodData {
            periods: vec![p(Some("01.01.2020"), Some("01.02.2020"), "Россия")],
            current: Some(d("31.12.2023")),
        };
        assert_eq!(build_report(&data, d("31.12.2023")), NO_DATA_TEXT);
    }

    #[test]
    fn test_below_threshold_names_leader() {
        let periods = vec![
            p(Some("01.01.2023"), Some("30.06.2023"), "Россия"),
            p(Some("01.08.2023"), Some("31.12.2023"), "Грузия"),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        assert!(report.resident().is_none());
        assert_eq!(report.days_for(UNKNOWN_COUNTRY), 31);
        let text = report.render();
        assert!(text.ends_with("⚠️ Нет страны с >=183 днями. Больше всего в: Россия (181 дней)\n"), "{text}");
    }

    #[test]
    fn test_resident_skips_unknown_leader() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.01.2023"), "Россия"),
            p(Some("01.12.2023"), Some("31.12.2023"), "Россия"),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        assert_eq!(report.totals[0].country, UNKNOWN_COUNTRY);
        assert_eq!(report.leader().map(|c| c.country.as_str()), Some("Россия"));
        assert!(report.render().contains("🕳 Неизвестно где: 324 дней"));
    }

    #[test]
    fn test_only_unknown_has_no_qualifying_country() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.01.2023"), UNKNOWN_COUNTRY),
        ];
        let report = Report::compute(&periods, d("31.12.2023")).unwrap();
        assert!(report.render().ends_with("⚠️ Нет страны с >=183 днями.\n"));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let periods = vec![
            p(Some("01.01.2023"), Some("10.01.2023"), "Сербия"),
            p(Some("11.01.2023"), Some("20.01.2023"), "Армения"),
        ];
        let report = Report::compute(&periods, d("20.01.2023")).unwrap();
        assert_eq!(report.totals[0].country, "Сербия");
        assert_eq!(report.totals[1].country, "Армения");
    }

    #[test]
    fn test_unregistered_country_has_no_flag() {
        let report = Report::compute(&[p(Some("01.01.2023"), Some("31.12.2023"), "Атлантида")], d("31.12.2023")).unwrap();
        let text = report.render();
        assert!(text.contains("\nАтлантида: 365 дней\n"));
        assert!(text.contains("✅ Налоговый резидент: Атлантида (365 дней)"));
    }
}
