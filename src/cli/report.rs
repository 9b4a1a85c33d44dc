// src/cli/report.rs — Offline report for a periods file

use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::core::date::parse_date;
use crate::core::{build_report, PeriodData};
use crate::infra::errors::TaxResError;

/// Report text for the periods in `file`, as of `date` (or the file's
/// `current`, or today).
pub fn run_report(file: &Path, date: Option<&str>) -> Result<String, TaxResError> {
    render_report(file, date, Local::now().date_naive())
}

pub fn render_report(file: &Path, date: Option<&str>, today: NaiveDate) -> Result<String, TaxResError> {
    let content = std::fs::read_to_string(file)?;
    let mut data: PeriodData = serde_json::from_str(content.trim_start_matches('\u{feff}'))?;
    if let Some(date) = date {
        data.current = Some(parse_date(date)?);
    }
    Ok(build_report(&data, today))
}
