// Client for the Magyar Nemzeti Bank exchange-rate table
//
// The MNB publishes official HUF rates as an HTML table. One GET returns
// every published day in the requested range; the first cell of each row is
// a Hungarian long date ("2022. január 3., hétfő"), the second the rate with
// a decimal comma ("386,45").

use chrono::NaiveDate;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{RateSample, RateSeries, RateSource};
use crate::error::EnrichError;

pub const MNB_RATE_TABLE_URL: &str = "https://www.mnb.hu/arfolyam-tablazat";

const HUNGARIAN_MONTHS: [&str; 12] = [
    "január",
    "február",
    "március",
    "április",
    "május",
    "június",
    "július",
    "augusztus",
    "szeptember",
    "október",
    "november",
    "december",
];

/// Scraper for the MNB historical rate table
pub struct MnbClient {
    client: Client,
    base_url: String,
    currency: String,
}

impl MnbClient {
    pub fn new(base_url: &str, currency: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; fxstatement/0.1)")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            currency: currency.to_uppercase(),
        })
    }

    /// Table URL for a date range (dates formatted as `YYYY.MM.DD.`)
    pub fn request_url(&self, from: NaiveDate, to: NaiveDate) -> Result<Url, EnrichError> {
        let from = from.format("%Y.%m.%d.").to_string();
        let to = to.format("%Y.%m.%d.").to_string();
        Url::parse_with_params(
            &self.base_url,
            &[
                ("deviza", "rbCurrencySelect"),
                ("devizaSelected", self.currency.as_str()),
                ("datefrom", from.as_str()),
                ("datetill", to.as_str()),
                ("order", "1"),
            ],
        )
        .map_err(|e| EnrichError::RateFetchFailed(format!("invalid rate table URL: {}", e)))
    }
}

impl RateSource for MnbClient {
    async fn fetch_rates(&self, from: NaiveDate, to: NaiveDate) -> Result<RateSeries, EnrichError> {
        let url = self.request_url(from, to)?;
        info!("Fetching {} rates from {} to {}", self.currency, from, to);
        debug!("Rate table URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EnrichError::RateFetchFailed(format!("request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| EnrichError::RateFetchFailed(format!("error status: {}", e)))?;

        let html = response
            .text()
            .await
            .map_err(|e| EnrichError::RateFetchFailed(format!("failed to read body: {}", e)))?;

        let samples = parse_rate_table(&html)?;
        info!("Parsed {} {} rate(s)", samples.len(), self.currency);
        Ok(RateSeries::new(samples))
    }
}

/// Extract (date, rate) rows from the rate table HTML
///
/// Rows without a rate (days the bank did not publish) are skipped. A table
/// with no usable rows is an error.
pub fn parse_rate_table(html: &str) -> Result<Vec<RateSample>, EnrichError> {
    let document = Html::parse_document(html);
    let row_sel = selector("tbody > tr")?;
    let cell_sel = selector("td")?;

    let mut samples = Vec::new();
    for row in document.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| cell.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .collect();

        let (date_text, rate_text) = match (cells.first(), cells.get(1)) {
            (Some(date), Some(rate)) => (date, rate),
            _ => continue,
        };

        let rate = match parse_rate(rate_text)? {
            Some(rate) => rate,
            None => {
                debug!("No rate published for '{}'", date_text);
                continue;
            }
        };
        let date = parse_hungarian_date(date_text)?;
        samples.push(RateSample::new(date, rate));
    }

    if samples.is_empty() {
        warn!("Rate table contained no usable rows");
        return Err(EnrichError::RateFetchFailed(
            "rate table contained no rates".to_string(),
        ));
    }
    Ok(samples)
}

fn selector(css: &str) -> Result<Selector, EnrichError> {
    Selector::parse(css)
        .map_err(|e| EnrichError::RateFetchFailed(format!("bad selector {}: {}", css, e)))
}

/// Parse `2022. január 3., hétfő` (or `2022.01.03.`) into a date
fn parse_hungarian_date(text: &str) -> Result<NaiveDate, EnrichError> {
    let invalid = || EnrichError::RateFetchFailed(format!("unrecognised rate date '{}'", text));
    let date_part = text.split(',').next().unwrap_or(text).trim();

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y.%m.%d.") {
        return Ok(date);
    }

    let tokens: Vec<&str> = date_part.split_whitespace().collect();
    let [year, month, day] = tokens.as_slice() else {
        return Err(invalid());
    };

    let year: i32 = year.trim_end_matches('.').parse().map_err(|_| invalid())?;
    let month_name = month.to_lowercase();
    let month = HUNGARIAN_MONTHS
        .iter()
        .position(|m| *m == month_name)
        .ok_or_else(invalid)? as u32
        + 1;
    let day: u32 = day.trim_end_matches('.').parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse a decimal-comma rate; an empty cell is `None`
fn parse_rate(text: &str) -> Result<Option<Decimal>, EnrichError> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replace(',', ".");
    if normalized.is_empty() || normalized == "-" {
        return Ok(None);
    }
    Decimal::from_str(&normalized)
        .map(Some)
        .map_err(|_| EnrichError::RateFetchFailed(format!("unrecognised rate '{}'", text)))
}
