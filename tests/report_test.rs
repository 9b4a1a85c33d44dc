// tests/report_test.rs — Residency report properties over whole period lists

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use taxres::core::date::{inclusive_days, parse_date, window_start};
use taxres::core::report::RESIDENCY_THRESHOLD_DAYS;
use taxres::core::{build_report, Period, PeriodData, Report, ReportError};

fn d(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

fn p(entry: Option<&str>, exit: Option<&str>, country: &str) -> Period {
    Period::new(entry.map(d), exit.map(d), country)
}

/// Abutting stays across 2022-2024 with one open-ended tail.
fn travel_log() -> Vec<Period> {
    vec![
        p(None, Some("14.02.2022"), "Россия"),
        p(Some("15.02.2022"), Some("30.09.2022"), "Армения"),
        p(Some("01.10.2022"), Some("31.05.2023"), "Грузия"),
        p(Some("01.06.2023"), Some("15.08.2023"), "Турция"),
        p(Some("16.08.2023"), Some("31.03.2024"), "Сербия"),
        p(Some("01.04.2024"), None, "Черногория"),
    ]
}

#[test]
fn test_totals_cover_whole_window_when_contiguous() {
    let periods = travel_log();
    let mut calc = d("01.03.2023");
    while calc <= d("30.06.2024") {
        let report = Report::compute(&periods, calc).unwrap();
        let start = window_start(calc).unwrap();
        assert_eq!(
            report.total_days(),
            inclusive_days(start, calc),
            "calc {calc}"
        );
        assert_eq!(report.days_for("unknown"), 0);
        calc = calc + chrono::Duration::days(17);
    }
}

#[test]
fn test_window_is_one_year_back() {
    let report = Report::compute(&travel_log(), d("31.12.2023")).unwrap();
    assert_eq!(report.window_start, d("01.01.2023"));
    assert_eq!(report.calc_date, d("31.12.2023"));
    assert_eq!(report.total_days(), 365);
    assert_eq!(report.days_for("Грузия"), 151);
    assert_eq!(report.days_for("Турция"), 76);
    assert_eq!(report.days_for("Сербия"), 138);
    assert_eq!(report.days_for("Армения"), 0);
}

#[test]
fn test_totals_sorted_descending() {
    let report = Report::compute(&travel_log(), d("31.12.2023")).unwrap();
    let days: Vec<i64> = report.totals.iter().map(|c| c.days).collect();
    let mut sorted = days.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(days, sorted);
    assert_eq!(report.totals[0].country, "Грузия");
}

#[test]
fn test_threshold_boundary() {
    // 183 days: 01.01.2023..02.07.2023
    let at = vec![p(Some("01.01.2023"), Some("02.07.2023"), "Грузия")];
    let report = Report::compute(&at, d("31.12.2023")).unwrap();
    assert_eq!(report.days_for("Грузия"), RESIDENCY_THRESHOLD_DAYS);
    assert_eq!(report.resident().unwrap().country, "Грузия");

    let below = vec![p(Some("01.01.2023"), Some("01.07.2023"), "Грузия")];
    let report = Report::compute(&below, d("31.12.2023")).unwrap();
    assert_eq!(report.days_for("Грузия"), 182);
    assert!(report.resident().is_none());
    assert_eq!(report.leader().unwrap().country, "Грузия");
}

#[test]
fn test_gaps_become_unknown() {
    let periods = vec![
        p(Some("01.01.2023"), Some("31.03.2023"), "Россия"),
        p(Some("11.04.2023"), None, "Грузия"),
    ];
    let report = Report::compute(&periods, d("31.12.2023")).unwrap();
    assert_eq!(report.days_for("unknown"), 10);
    assert_eq!(report.total_days(), 365);
}

#[test]
fn test_out_of_order_is_rejected() {
    let periods = vec![
        p(Some("01.06.2023"), Some("30.06.2023"), "Грузия"),
        p(Some("01.03.2023"), Some("31.03.2023"), "Россия"),
    ];
    assert_eq!(
        Report::compute(&periods, d("31.12.2023")),
        Err(ReportError::OutOfOrder { position: 2 })
    );
    let data = PeriodData {
        periods,
        current: Some(d("31.12.2023")),
    };
    assert_eq!(
        build_report(&data, d("01.01.2030")),
        "Ошибка: периоды не в хронологическом порядке (период 2)"
    );
}

#[test]
fn test_out_of_order_reports_offending_position() {
    let log = travel_log();
    for k in 1..log.len() {
        let mut periods = log.clone();
        let prev_exit = periods[k - 1].exit.unwrap();
        periods[k].entry = Some(prev_exit - chrono::Duration::days(1));
        assert_eq!(
            Report::compute(&periods, d("30.06.2024")),
            Err(ReportError::OutOfOrder { position: k + 1 }),
            "period {}",
            k + 1
        );
    }
}

#[test]
fn test_report_text_is_pure() {
    let data = PeriodData {
        periods: travel_log(),
        current: Some(d("31.12.2023")),
    };
    let first = build_report(&data, d("01.01.2025"));
    let second = build_report(&data, d("05.05.2026"));
    assert_eq!(first, second);
    assert!(first.contains("⚠️ Нет страны с >=183 днями. Больше всего в: Грузия (151 дней)"));
}
