//! End-to-end enrichment through the library API
//!
//! Statements are generated with rust_xlsxwriter, processed with an
//! in-memory rate source and read back with calamine.


use calamine::{Data, Reader};
use chrono::NaiveDate;
use fxstatement::config::Config;
use fxstatement::enrich::SheetOutcome;
use fxstatement::pipeline::{process_all, process_file};
use fxstatement::rates::{RateSeries, RateSource, SeriesSource};
use fxstatement::summary::{NOT_AVAILABLE, SUMMARY_SHEET};
use fxstatement::workbook::read_statement;
use std::sync::Arc;
use tempfile::TempDir;
use workbook_helpers::{
    fixture_rates, formula_at, open_output, value_at, write_rates_file, write_statement_fixture,
    Fixture,
};

fn test_config(dir: &TempDir) -> Config {
    Config {
        input_dir: dir.path().join("input"),
        output_dir: dir.path().join("output"),
        ..Config::default()
    }
}

fn source() -> SeriesSource {
    SeriesSource::new(RateSeries::new(fixture_rates()))
}

#[tokio::test]
async fn statement_is_enriched_and_summarized() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let input = config.input_dir.join("etoro-2022.xlsx");
    write_statement_fixture(&input, Fixture::default());

    let report = process_file(&input, &config, &source()).await;
    assert!(report.succeeded(), "{:?}", report.error);
    assert!(report.summary_unavailable.is_empty());
    assert_eq!(
        report.rate_range,
        Some((
            NaiveDate::from_ymd_opt(2021, 12, 27).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 12).unwrap()
        ))
    );
    assert_eq!(
        report.sheets[0],
        SheetOutcome::Enriched {
            sheet: "Account Activity".to_string(),
            rows: 2,
            skipped_rows: 1,
            columns: vec!["Exchange Rate".to_string(), "Amount (HUF)".to_string()],
        }
    );

    let output = report.output.unwrap();
    assert_eq!(output, config.output_dir.join("etoro-2022.xlsx"));
    let mut workbook = open_output(&output);
    assert_eq!(
        workbook.sheet_names(),
        vec![
            "Account Activity",
            "Closed Positions",
            "Dividends",
            "Notes",
            SUMMARY_SHEET
        ]
    );

    // Account activity: E and F appended after Details
    assert_eq!(
        value_at(&mut workbook, "Account Activity", (0, 4)),
        Some(Data::String("Exchange Rate".to_string()))
    );
    assert_eq!(
        value_at(&mut workbook, "Account Activity", (1, 4)),
        Some(Data::Float(360.5))
    );
    assert_eq!(
        formula_at(&mut workbook, "Account Activity", (1, 5)).as_deref(),
        Some("B2*E2")
    );
    assert_eq!(formula_at(&mut workbook, "Account Activity", (2, 5)), None);
    assert_eq!(
        value_at(&mut workbook, "Account Activity", (3, 4)),
        Some(Data::Float(356.0))
    );

    // Closed positions: open rate I, at open J, close rate K, at close L, profit M
    assert_eq!(
        value_at(&mut workbook, "Closed Positions", (1, 8)),
        Some(Data::Float(361.0))
    );
    assert_eq!(
        value_at(&mut workbook, "Closed Positions", (1, 10)),
        Some(Data::Float(357.75))
    );
    assert_eq!(
        formula_at(&mut workbook, "Closed Positions", (1, 9)).as_deref(),
        Some("C2*I2")
    );
    assert_eq!(
        formula_at(&mut workbook, "Closed Positions", (1, 11)).as_deref(),
        Some("(C2-G2)*K2")
    );
    assert_eq!(
        formula_at(&mut workbook, "Closed Positions", (1, 12)).as_deref(),
        Some("J2-L2")
    );

    // Dividends: the payment date is a real date cell
    assert_eq!(
        value_at(&mut workbook, "Dividends", (1, 4)),
        Some(Data::Float(358.25))
    );
    assert_eq!(
        formula_at(&mut workbook, "Dividends", (1, 6)).as_deref(),
        Some("D2*E2")
    );

    // Input formulas survive
    assert_eq!(formula_at(&mut workbook, "Notes", (0, 1)).as_deref(), Some("1+1"));

    assert_eq!(
        formula_at(&mut workbook, SUMMARY_SHEET, (2, 1)).as_deref(),
        Some("SUMIF('Closed Positions'!H:H,\"ETF\",'Closed Positions'!G:G)")
    );
    assert_eq!(
        formula_at(&mut workbook, SUMMARY_SHEET, (1, 2)).as_deref(),
        Some("SUMIF('Closed Positions'!H:H,\"Stocks\",'Closed Positions'!M:M)")
    );
    assert_eq!(
        formula_at(&mut workbook, SUMMARY_SHEET, (8, 1)).as_deref(),
        Some("SUM(Dividends!C:C)")
    );
}

#[tokio::test]
async fn missing_profit_column_skips_only_closed_positions() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let input = config.input_dir.join("no-profit.xlsx");
    write_statement_fixture(
        &input,
        Fixture {
            with_profit: false,
            ..Fixture::default()
        },
    );

    let report = process_file(&input, &config, &source()).await;
    assert!(report.succeeded(), "{:?}", report.error);
    match &report.sheets[1] {
        SheetOutcome::Skipped { sheet, reason } => {
            assert_eq!(sheet, "Closed Positions");
            assert!(reason.contains("Profit(USD)"), "{}", reason);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(report.sheets[0], SheetOutcome::Enriched { .. }));
    assert!(matches!(report.sheets[2], SheetOutcome::Enriched { .. }));
    assert_eq!(report.summary_unavailable, vec!["Closed Positions".to_string()]);

    let output = report.output.unwrap();
    let statement = read_statement(&output).unwrap();
    let positions = statement.sheet("Closed Positions").unwrap();
    assert_eq!(positions.bound().to_string(), "A1:H2");

    let mut workbook = open_output(&output);
    for row in 1..=5 {
        assert_eq!(
            value_at(&mut workbook, SUMMARY_SHEET, (row, 1)),
            Some(Data::String(NOT_AVAILABLE.to_string()))
        );
    }
    assert_eq!(
        formula_at(&mut workbook, "Account Activity", (1, 5)).as_deref(),
        Some("B2*E2")
    );
}

#[tokio::test]
async fn absent_dividends_sheet_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let input = config.input_dir.join("no-dividends.xlsx");
    write_statement_fixture(
        &input,
        Fixture {
            with_dividends: false,
            ..Fixture::default()
        },
    );

    let report = process_file(&input, &config, &source()).await;
    assert!(report.succeeded(), "{:?}", report.error);
    assert_eq!(
        report.sheets[2],
        SheetOutcome::Absent {
            sheet: "Dividends".to_string()
        }
    );
    assert_eq!(report.summary_unavailable, vec!["Dividends".to_string()]);
}

#[tokio::test]
async fn failing_file_does_not_stop_the_others() {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(&dir));
    std::fs::create_dir_all(&config.input_dir).unwrap();
    let good = config.input_dir.join("good.xlsx");
    let broken = config.input_dir.join("broken.xlsx");
    write_statement_fixture(&good, Fixture::default());
    std::fs::write(&broken, b"not a zip archive").unwrap();

    let reports = process_all(vec![good.clone(), broken.clone()], config.clone(), Arc::new(source())).await;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].input, broken);
    assert!(!reports[0].succeeded());
    assert_eq!(reports[1].input, good);
    assert!(reports[1].succeeded());
    assert!(config.output_dir.join("good.xlsx").exists());
    assert!(!config.output_dir.join("broken.xlsx").exists());
}

#[tokio::test]
async fn rates_file_feeds_the_series_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rates.json");
    write_rates_file(&path, &fixture_rates());

    let source = SeriesSource::from_json_file(&path).unwrap();
    let series = source
        .fetch_rates(
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(series.len(), 3);
    assert_eq!(series.first_date(), NaiveDate::from_ymd_opt(2022, 1, 3));
}
