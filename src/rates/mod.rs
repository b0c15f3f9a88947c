//! Historical exchange-rate series and the sources that provide them.

pub mod dates;
pub mod mnb;

pub use dates::{date_from_cell, normalize_date};
pub use mnb::MnbClient;

use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

use crate::error::EnrichError;

/// One published rate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSample {
    pub date: NaiveDate,
    pub rate: Decimal,
}

impl RateSample {
    pub fn new(date: NaiveDate, rate: Decimal) -> Self {
        Self { date, rate }
    }
}

/// Rate samples sorted by date, answering "rate in effect on D" queries
///
/// Markets do not publish on weekends and holidays, so the effective rate
/// for a date is carried forward from the latest sample on or before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateSeries {
    samples: Vec<RateSample>,
}

impl RateSeries {
    pub fn new(mut samples: Vec<RateSample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self { samples }
    }

    /// Rate of the latest sample dated on or before `date`
    pub fn effective_rate(&self, date: NaiveDate) -> Result<Decimal, EnrichError> {
        let after = self.samples.partition_point(|s| s.date <= date);
        if after == 0 {
            return Err(EnrichError::NoRateAvailable(date));
        }
        Ok(self.samples[after - 1].rate)
    }

    pub fn samples(&self) -> &[RateSample] {
        &self.samples
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.samples.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.samples.last().map(|s| s.date)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Anything that can provide a rate series for a date range
pub trait RateSource {
    fn fetch_rates(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<RateSeries, EnrichError>> + Send;
}

/// Rate source backed by an already-loaded series
#[derive(Debug, Clone, Default)]
pub struct SeriesSource {
    series: RateSeries,
}

impl SeriesSource {
    pub fn new(series: RateSeries) -> Self {
        Self { series }
    }

    /// Load the JSON written by `fxstatement rates --json`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Reading rates file: {}", path.display()))?;
        let samples: Vec<RateSample> = serde_json::from_str(&raw)
            .with_context(|| format!("Parsing rates JSON in {}", path.display()))?;
        Ok(Self::new(RateSeries::new(samples)))
    }
}

impl RateSource for SeriesSource {
    async fn fetch_rates(&self, from: NaiveDate, to: NaiveDate) -> Result<RateSeries, EnrichError> {
        let samples: Vec<RateSample> = self
            .series
            .samples()
            .iter()
            .filter(|s| s.date >= from && s.date <= to)
            .cloned()
            .collect();
        if samples.is_empty() {
            return Err(EnrichError::RateFetchFailed(format!(
                "no rates between {} and {}",
                from, to
            )));
        }
        Ok(RateSeries::new(samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_samples() -> RateSeries {
        RateSeries::new(vec![
            RateSample::new(ymd(2022, 1, 3), dec!(300.0)),
            RateSample::new(ymd(2022, 1, 10), dec!(310.0)),
        ])
    }

    #[test]
    fn test_rate_carries_forward_between_samples() {
        let series = two_samples();
        assert_eq!(series.effective_rate(ymd(2022, 1, 5)).unwrap(), dec!(300.0));
        assert_eq!(series.effective_rate(ymd(2022, 1, 3)).unwrap(), dec!(300.0));
        assert_eq!(series.effective_rate(ymd(2022, 1, 10)).unwrap(), dec!(310.0));
        assert_eq!(series.effective_rate(ymd(2022, 3, 1)).unwrap(), dec!(310.0));
    }

    #[test]
    fn test_date_before_first_sample_has_no_rate() {
        let series = two_samples();
        assert_eq!(
            series.effective_rate(ymd(2022, 1, 2)),
            Err(EnrichError::NoRateAvailable(ymd(2022, 1, 2)))
        );
    }

    #[test]
    fn test_empty_series_has_no_rate() {
        let series = RateSeries::default();
        assert!(matches!(
            series.effective_rate(ymd(2022, 1, 5)),
            Err(EnrichError::NoRateAvailable(_))
        ));
    }

    #[test]
    fn test_unsorted_samples_are_sorted() {
        let series = RateSeries::new(vec![
            RateSample::new(ymd(2022, 1, 10), dec!(310.0)),
            RateSample::new(ymd(2022, 1, 3), dec!(300.0)),
            RateSample::new(ymd(2022, 1, 7), dec!(305.5)),
        ]);
        assert_eq!(series.first_date(), Some(ymd(2022, 1, 3)));
        assert_eq!(series.last_date(), Some(ymd(2022, 1, 10)));
        assert_eq!(series.effective_rate(ymd(2022, 1, 8)).unwrap(), dec!(305.5));
    }

    #[test]
    fn test_latest_sample_wins_for_every_day() {
        let series = RateSeries::new(
            (0..30)
                .step_by(3)
                .map(|offset| {
                    RateSample::new(
                        ymd(2022, 1, 1) + chrono::Duration::days(offset),
                        Decimal::from(300 + offset),
                    )
                })
                .collect(),
        );
        for offset in 0..40 {
            let day = ymd(2022, 1, 1) + chrono::Duration::days(offset);
            let expected = series
                .samples()
                .iter()
                .filter(|s| s.date <= day)
                .last()
                .map(|s| s.rate);
            assert_eq!(series.effective_rate(day).ok(), expected, "day {}", day);
        }
    }

    #[tokio::test]
    async fn test_series_source_filters_range() {
        let source = SeriesSource::new(two_samples());
        let series = source.fetch_rates(ymd(2022, 1, 1), ymd(2022, 1, 5)).await.unwrap();
        assert_eq!(series.len(), 1);

        let err = source
            .fetch_rates(ymd(2023, 1, 1), ymd(2023, 2, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::RateFetchFailed(_)));
    }

    #[test]
    fn test_series_source_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.json");
        std::fs::write(
            &path,
            r#"[{"date":"2022-01-10","rate":"310.0"},{"date":"2022-01-03","rate":"300.0"}]"#,
        )
        .unwrap();
        let source = SeriesSource::from_json_file(&path).unwrap();
        assert_eq!(source.series, two_samples());
    }
}
