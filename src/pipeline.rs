//! Per-file processing: read, fetch rates, enrich, summarize, write.
//!
//! Files are independent. Each one runs as its own task and a failure is
//! recorded in that file's report without affecting the others.

use anyhow::{anyhow, Context, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::enrich::{transaction_date_range, ColumnLabels, SheetOutcome, StatementEnricher};
use crate::rates::{RateSeries, RateSource};
use crate::summary::SummaryBuilder;
use crate::workbook::{read_statement, write_statement};

/// Outcome of processing one input file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub sheets: Vec<SheetOutcome>,
    /// Date range requested from the rate source
    pub rate_range: Option<(NaiveDate, NaiveDate)>,
    /// Summary sections rendered as `n/a`
    pub summary_unavailable: Vec<String>,
    pub error: Option<String>,
}

impl FileReport {
    fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: None,
            sheets: Vec::new(),
            rate_range: None,
            summary_unavailable: Vec::new(),
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Process one statement file end to end
pub async fn process_file<S>(path: &Path, config: &Config, source: &S) -> FileReport
where
    S: RateSource + Sync,
{
    let mut report = FileReport::new(path);
    if let Err(e) = run(path, config, source, &mut report).await {
        warn!("Failed to process {}: {:#}", path.display(), e);
        report.error = Some(format!("{:#}", e));
    }
    report
}

async fn run<S>(path: &Path, config: &Config, source: &S, report: &mut FileReport) -> Result<()>
where
    S: RateSource + Sync,
{
    let input = path.to_path_buf();
    let mut statement = tokio::task::spawn_blocking(move || read_statement(&input))
        .await
        .map_err(|err| anyhow!("Failed to read {}: {}", path.display(), err))??;

    let rates = match transaction_date_range(&statement)? {
        Some((first, last)) => {
            let from = first
                .checked_sub_days(Days::new(config.lookback_days.into()))
                .unwrap_or(NaiveDate::MIN);
            report.rate_range = Some((from, last));
            source
                .fetch_rates(from, last)
                .await
                .with_context(|| format!("Fetching rates for {}", path.display()))?
        }
        None => {
            info!("No dated rows in {}, skipping rate fetch", path.display());
            RateSeries::default()
        }
    };

    let labels = ColumnLabels::new(&config.source_currency, &config.target_currency);
    report.sheets = StatementEnricher::new(&rates, &labels)
        .enrich(&mut statement)
        .with_context(|| format!("Enriching {}", path.display()))?;
    report.summary_unavailable = SummaryBuilder::new(&labels)
        .attach(&mut statement)
        .with_context(|| format!("Building summary for {}", path.display()))?;

    let output_dir = config.output_dir.clone();
    let suffix = config.output_suffix.clone();
    let output = tokio::task::spawn_blocking(move || write_statement(&statement, &output_dir, &suffix))
        .await
        .map_err(|err| anyhow!("Failed to write {}: {}", path.display(), err))??;
    report.output = Some(output);
    Ok(())
}

/// Process files concurrently, one task per file
///
/// Reports come back sorted by input path.
pub async fn process_all<S>(files: Vec<PathBuf>, config: Arc<Config>, source: Arc<S>) -> Vec<FileReport>
where
    S: RateSource + Send + Sync + 'static,
{
    let mut tasks = JoinSet::new();
    for path in &files {
        let config = Arc::clone(&config);
        let source = Arc::clone(&source);
        let path = path.clone();
        tasks.spawn(async move { process_file(&path, &config, source.as_ref()).await });
    }

    let mut reports = Vec::with_capacity(files.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => error!("File task failed: {}", e),
        }
    }

    // A task that panicked leaves no report behind
    for path in files {
        if !reports.iter().any(|r| r.input == path) {
            let mut report = FileReport::new(&path);
            report.error = Some("processing task failed".to_string());
            reports.push(report);
        }
    }

    reports.sort_by(|a, b| a.input.cmp(&b.input));
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{ACTIVITY_SHEET, DIVIDENDS_SHEET};
    use crate::rates::{RateSample, SeriesSource};
    use rust_decimal_macros::dec;
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn write_activity(path: &Path, date: &str) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(ACTIVITY_SHEET).unwrap();
        for (col, header) in ["Date", "Amount", "Type"].iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_string(1, 0, date).unwrap();
        worksheet.write_number(1, 1, 250.0).unwrap();
        worksheet.write_string(1, 2, "Deposit").unwrap();
        workbook.save(path).unwrap();
    }

    fn config(dir: &TempDir) -> Config {
        Config {
            input_dir: dir.path().join("input"),
            output_dir: dir.path().join("output"),
            output_suffix: "_huf".to_string(),
            ..Config::default()
        }
    }

    fn source() -> SeriesSource {
        SeriesSource::new(RateSeries::new(vec![
            RateSample::new(NaiveDate::from_ymd_opt(2022, 2, 28).unwrap(), dec!(330.5)),
            RateSample::new(NaiveDate::from_ymd_opt(2022, 3, 2).unwrap(), dec!(341.0)),
        ]))
    }

    #[tokio::test]
    async fn test_process_file_writes_enriched_copy() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::create_dir_all(&config.input_dir).unwrap();
        let input = config.input_dir.join("march.xlsx");
        write_activity(&input, "02/03/2022 12:00");

        let report = process_file(&input, &config, &source()).await;
        assert!(report.succeeded(), "{:?}", report.error);
        assert_eq!(
            report.output.as_deref(),
            Some(config.output_dir.join("march_huf.xlsx").as_path())
        );
        assert_eq!(
            report.rate_range,
            Some((
                NaiveDate::from_ymd_opt(2022, 2, 23).unwrap(),
                NaiveDate::from_ymd_opt(2022, 3, 2).unwrap()
            ))
        );
        assert!(matches!(report.sheets[0], SheetOutcome::Enriched { rows: 1, .. }));
    }

    #[tokio::test]
    async fn test_unparseable_date_in_skipped_sheet_does_not_fail_file() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        std::fs::create_dir_all(&config.input_dir).unwrap();
        let input = config.input_dir.join("pending.xlsx");

        let mut workbook = Workbook::new();
        let activity = workbook.add_worksheet();
        activity.set_name(ACTIVITY_SHEET).unwrap();
        activity.write_string(0, 0, "Date").unwrap();
        activity.write_string(0, 1, "Amount").unwrap();
        activity.write_string(1, 0, "02/03/2022 12:00").unwrap();
        activity.write_number(1, 1, 250.0).unwrap();
        let dividends = workbook.add_worksheet();
        dividends.set_name(DIVIDENDS_SHEET).unwrap();
        dividends.write_string(0, 0, "Date of Payment").unwrap();
        dividends.write_string(0, 1, "Net Dividend Received").unwrap();
        dividends.write_string(1, 0, "pending").unwrap();
        dividends.write_number(1, 1, 0.85).unwrap();
        workbook.save(&input).unwrap();

        let report = process_file(&input, &config, &source()).await;
        assert!(report.succeeded(), "{:?}", report.error);
        assert_eq!(
            report.rate_range,
            Some((
                NaiveDate::from_ymd_opt(2022, 2, 23).unwrap(),
                NaiveDate::from_ymd_opt(2022, 3, 2).unwrap()
            ))
        );
        assert!(matches!(report.sheets[0], SheetOutcome::Enriched { rows: 1, .. }));
        assert!(matches!(&report.sheets[2], SheetOutcome::Skipped { sheet, .. } if sheet == DIVIDENDS_SHEET));
        assert!(report.output.unwrap().exists());
    }

    #[tokio::test]
    async fn test_rate_gap_fails_only_that_file() {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(config(&dir));
        std::fs::create_dir_all(&config.input_dir).unwrap();
        let good = config.input_dir.join("a.xlsx");
        let bad = config.input_dir.join("b.xlsx");
        write_activity(&good, "01/03/2022 12:00");
        write_activity(&bad, "01/01/2021 12:00");

        let reports = process_all(vec![bad.clone(), good.clone()], config.clone(), Arc::new(source())).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].input, good);
        assert!(reports[0].succeeded());
        assert_eq!(reports[1].input, bad);
        assert!(!reports[1].succeeded());
        assert!(reports[1].output.is_none());
        assert!(!config.output_dir.join("b_huf.xlsx").exists());
    }
}
