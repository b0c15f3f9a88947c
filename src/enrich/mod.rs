//! Statement enrichment: appends exchange rates and converted amounts.
//!
//! Every subject sheet goes through the same steps. Required columns are
//! resolved before anything is written, so a sheet that lacks one is left
//! exactly as it was read. Columns are then appended, each dated row gets a
//! literal rate and formula conversions, and the header index is refreshed.

pub mod columns;

mod activity;
mod dividends;
mod positions;

pub use columns::{ColumnLabels, ACTIVITY_SHEET, CLOSED_POSITIONS_SHEET, DIVIDENDS_SHEET};

use chrono::NaiveDate;
use itertools::{Itertools, MinMaxResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::EnrichError;
use crate::rates::{date_from_cell, RateSeries};
use crate::sheet::{Cell, CellAddress, CellValue, Sheet, Statement};

/// The broker sheets that receive converted columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Activity,
    ClosedPositions,
    Dividends,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [
        SheetKind::Activity,
        SheetKind::ClosedPositions,
        SheetKind::Dividends,
    ];

    pub fn sheet_name(&self) -> &'static str {
        match self {
            SheetKind::Activity => ACTIVITY_SHEET,
            SheetKind::ClosedPositions => CLOSED_POSITIONS_SHEET,
            SheetKind::Dividends => DIVIDENDS_SHEET,
        }
    }

    fn date_columns(&self) -> &'static [&'static [&'static str]] {
        match self {
            SheetKind::Activity => &[columns::ACTIVITY_DATE],
            SheetKind::ClosedPositions => {
                &[columns::POSITION_OPEN_DATE, columns::POSITION_CLOSE_DATE]
            }
            SheetKind::Dividends => &[columns::DIVIDEND_DATE],
        }
    }

    /// Header alias lists that must all resolve before the sheet is enriched
    fn required_columns(&self) -> &'static [&'static [&'static str]] {
        match self {
            SheetKind::Activity => &[columns::ACTIVITY_DATE, columns::ACTIVITY_AMOUNT],
            SheetKind::ClosedPositions => &[
                columns::POSITION_AMOUNT,
                columns::POSITION_OPEN_DATE,
                columns::POSITION_CLOSE_DATE,
                columns::POSITION_PROFIT,
            ],
            SheetKind::Dividends => &[
                columns::DIVIDEND_DATE,
                columns::DIVIDEND_RECEIVED,
                columns::DIVIDEND_WITHHELD,
            ],
        }
    }

    /// Whether enrichment would skip this sheet for a missing column
    fn will_skip(&self, sheet: &Sheet) -> Result<bool, EnrichError> {
        for aliases in self.required_columns() {
            if sheet.optional_column(aliases)?.is_none() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// What happened to one subject sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetOutcome {
    Enriched {
        sheet: String,
        rows: usize,
        skipped_rows: usize,
        columns: Vec<String>,
    },
    Skipped {
        sheet: String,
        reason: String,
    },
    Absent {
        sheet: String,
    },
}

impl SheetOutcome {
    pub fn sheet(&self) -> &str {
        match self {
            SheetOutcome::Enriched { sheet, .. }
            | SheetOutcome::Skipped { sheet, .. }
            | SheetOutcome::Absent { sheet } => sheet,
        }
    }
}

/// Row counts for one enriched sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowStats {
    pub enriched: usize,
    pub skipped: usize,
}

/// Enriches the subject sheets of a statement against one rate series
pub struct StatementEnricher<'a> {
    rates: &'a RateSeries,
    labels: &'a ColumnLabels,
}

impl<'a> StatementEnricher<'a> {
    pub fn new(rates: &'a RateSeries, labels: &'a ColumnLabels) -> Self {
        Self { rates, labels }
    }

    /// Enrich every subject sheet present in the statement
    ///
    /// A sheet missing a required column is reported as skipped and left
    /// untouched. Any other error aborts the whole statement.
    pub fn enrich(&self, statement: &mut Statement) -> Result<Vec<SheetOutcome>, EnrichError> {
        let mut outcomes = Vec::new();

        for kind in SheetKind::ALL {
            let name = kind.sheet_name();
            let Some(sheet) = statement.sheet_mut(name) else {
                info!("Sheet '{}' not present, nothing to enrich", name);
                outcomes.push(SheetOutcome::Absent {
                    sheet: name.to_string(),
                });
                continue;
            };

            match self.enrich_sheet(kind, sheet) {
                Ok((stats, columns)) => {
                    info!(
                        "Enriched '{}': {} row(s), {} skipped",
                        name, stats.enriched, stats.skipped
                    );
                    outcomes.push(SheetOutcome::Enriched {
                        sheet: name.to_string(),
                        rows: stats.enriched,
                        skipped_rows: stats.skipped,
                        columns,
                    });
                }
                Err(e) if e.is_sheet_local() => {
                    warn!("Skipping sheet '{}': {}", name, e);
                    outcomes.push(SheetOutcome::Skipped {
                        sheet: name.to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcomes)
    }

    /// Enrich a single sheet and refresh its header index
    pub fn enrich_sheet(
        &self,
        kind: SheetKind,
        sheet: &mut Sheet,
    ) -> Result<(RowStats, Vec<String>), EnrichError> {
        let (stats, columns) = match kind {
            SheetKind::Activity => activity::enrich(sheet, self.rates, self.labels)?,
            SheetKind::ClosedPositions => positions::enrich(sheet, self.rates, self.labels)?,
            SheetKind::Dividends => dividends::enrich(sheet, self.rates, self.labels)?,
        };
        sheet.refresh_index();
        Ok((stats, columns))
    }
}

/// Earliest and latest transaction date across all subject sheets
///
/// Only sheets that enrichment will actually process contribute. A sheet
/// missing a required column is ignored here, whatever its dates hold; it
/// surfaces as skipped during enrichment.
pub fn transaction_date_range(
    statement: &Statement,
) -> Result<Option<(NaiveDate, NaiveDate)>, EnrichError> {
    let mut dates = Vec::new();

    for kind in SheetKind::ALL {
        let Some(sheet) = statement.sheet(kind.sheet_name()) else {
            continue;
        };
        if kind.will_skip(sheet)? {
            debug!("'{}' lacks a required column, not used for the date range", sheet.name());
            continue;
        }
        for aliases in kind.date_columns() {
            let col = sheet.column(aliases)?;
            for row in sheet.bound().data_rows() {
                if let Some(date) = row_date(sheet, col, row)? {
                    dates.push(date);
                }
            }
        }
    }

    Ok(match dates.into_iter().minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(date) => Some((date, date)),
        MinMaxResult::MinMax(first, last) => Some((first, last)),
    })
}

/// Normalized date in a row, or `None` when the cell is empty
pub(crate) fn row_date(sheet: &Sheet, col: u32, row: u32) -> Result<Option<NaiveDate>, EnrichError> {
    let address = CellAddress::new(col, row);
    match sheet.cell(address) {
        None => Ok(None),
        Some(Cell::Literal(value)) => date_from_cell(value),
        Some(Cell::Formula(formula)) => Err(EnrichError::InvalidDate(format!(
            "{} holds formula {}",
            address, formula
        ))),
    }
}

/// Check that an amount cell can take part in arithmetic
///
/// Empty cells count as zero, like in a spreadsheet. Text that is not
/// blank would make the conversion formula evaluate to an error.
pub(crate) fn check_amount(sheet: &Sheet, col: u32, row: u32) -> Result<(), EnrichError> {
    let address = CellAddress::new(col, row);
    match sheet.cell(address) {
        None | Some(Cell::Formula(_)) => Ok(()),
        Some(Cell::Literal(CellValue::Number(_))) => Ok(()),
        Some(Cell::Literal(value)) if value.is_blank() => Ok(()),
        Some(Cell::Literal(_)) => Err(EnrichError::InvalidAmount(format!(
            "{}!{}",
            sheet.name(),
            address
        ))),
    }
}

/// Rate as a literal numeric cell value
pub(crate) fn rate_value(rate: Decimal) -> Result<CellValue, EnrichError> {
    rate.to_f64()
        .map(CellValue::Number)
        .ok_or_else(|| EnrichError::InvalidAmount(rate.to_string()))
}

pub(crate) fn log_skipped_row(sheet: &Sheet, row: u32) {
    debug!("'{}' row {} has no date, skipping", sheet.name(), row + 1);
}
