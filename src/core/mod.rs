// src/core/mod.rs — Residency engine: dates, countries, periods, reports

pub mod country;
pub mod date;
pub mod period;
pub mod report;

pub use period::{BoundaryCheck, Period, PeriodData, PeriodError};
pub use report::{build_report, Report, ReportError};
