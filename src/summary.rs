//! The `Tax Summary` sheet appended after enrichment.
//!
//! Every number on the sheet is a formula over the enriched sheets. Columns
//! are looked up by header name, so the summary follows whatever layout the
//! broker exported. A section whose source sheet is absent or lacks a column
//! shows `n/a` instead of a value.

use tracing::{debug, info};

use crate::enrich::columns::{self, ColumnLabels};
use crate::enrich::{ACTIVITY_SHEET, CLOSED_POSITIONS_SHEET, DIVIDENDS_SHEET};
use crate::error::EnrichError;
use crate::sheet::{Bound, Cell, CellAddress, Formula, Grid, Reference, Sheet, Statement};

pub const SUMMARY_SHEET: &str = "Tax Summary";
pub const NOT_AVAILABLE: &str = "n/a";

pub const POSITION_TYPES: [&str; 4] = ["Stocks", "ETF", "Crypto", "CFD"];
pub const DEPOSIT_TYPE: &str = "Deposit";
pub const WITHDRAWAL_TYPE: &str = "Withdraw Request";

/// Rows of the summary sheet, three cells wide
#[derive(Default)]
struct Layout {
    rows: Vec<[Option<Cell>; 3]>,
    unavailable: Vec<String>,
}

impl Layout {
    fn next_row(&self) -> u32 {
        self.rows.len() as u32
    }

    fn header(&mut self, title: &str, source: String, target: String) {
        self.rows.push([
            Some(Cell::text(title)),
            Some(Cell::text(source)),
            Some(Cell::text(target)),
        ]);
    }

    fn values(&mut self, label: &str, values: Option<[Formula; 2]>) {
        let [source, target] = match values {
            Some([source, target]) => [Cell::Formula(source), Cell::Formula(target)],
            None => [Cell::text(NOT_AVAILABLE), Cell::text(NOT_AVAILABLE)],
        };
        self.rows.push([Some(Cell::text(label)), Some(source), Some(target)]);
    }

    fn blank(&mut self) {
        self.rows.push([None, None, None]);
    }

    fn into_sheet(self) -> Result<(Sheet, Vec<String>), EnrichError> {
        let last_row = self.rows.len().saturating_sub(1) as u32;
        let bound = Bound::new(CellAddress::new(0, 0), CellAddress::new(2, last_row))?;
        let mut grid = Grid::new(bound);
        for (row, cells) in self.rows.into_iter().enumerate() {
            for (col, cell) in cells.into_iter().enumerate() {
                if let Some(cell) = cell {
                    grid.set(CellAddress::new(col as u32, row as u32), cell)?;
                }
            }
        }
        Ok((Sheet::new(SUMMARY_SHEET, grid), self.unavailable))
    }
}

/// Builds the summary sheet from a statement whose subject sheets are indexed
pub struct SummaryBuilder<'a> {
    labels: &'a ColumnLabels,
}

impl<'a> SummaryBuilder<'a> {
    pub fn new(labels: &'a ColumnLabels) -> Self {
        Self { labels }
    }

    /// Build the summary and add it to the statement
    ///
    /// Returns the names of the sections rendered as `n/a`. An existing
    /// sheet named `Tax Summary` is replaced.
    pub fn attach(&self, statement: &mut Statement) -> Result<Vec<String>, EnrichError> {
        let (sheet, unavailable) = self.build(statement)?;
        statement.push_sheet(sheet);
        info!(
            "Added '{}' to '{}' ({} section(s) unavailable)",
            SUMMARY_SHEET,
            statement.name(),
            unavailable.len()
        );
        Ok(unavailable)
    }

    /// Build the summary sheet without touching the statement
    pub fn build(&self, statement: &Statement) -> Result<(Sheet, Vec<String>), EnrichError> {
        let mut layout = Layout::default();

        self.closed_positions(statement, &mut layout)?;
        layout.blank();
        self.dividends(statement, &mut layout)?;
        layout.blank();
        self.account_activity(statement, &mut layout)?;

        layout.into_sheet()
    }

    fn amount_headers(&self) -> (String, String) {
        (
            format!("Amount ({})", self.labels.source()),
            format!("Amount ({})", self.labels.target()),
        )
    }

    fn closed_positions(&self, statement: &Statement, layout: &mut Layout) -> Result<(), EnrichError> {
        let converted = self.labels.converted_profit();
        let converted_alias = [converted.as_str()];
        let wanted: [&[&str]; 3] = [columns::POSITION_TYPE, columns::POSITION_PROFIT, &converted_alias];
        let cols = section_columns(statement, CLOSED_POSITIONS_SHEET, &wanted)?;

        layout.header(
            CLOSED_POSITIONS_SHEET,
            format!("Profit ({})", self.labels.source()),
            converted.clone(),
        );

        let first = layout.next_row();
        for kind in POSITION_TYPES {
            let values = match &cols {
                Some(c) => Some(sum_if_pair(CLOSED_POSITIONS_SHEET, c[0], kind, [c[1], c[2]])?),
                None => None,
            };
            layout.values(kind, values);
        }
        let last = layout.next_row() - 1;

        let total = match &cols {
            Some(_) => Some([
                Formula::sum_cells(CellAddress::new(1, first), CellAddress::new(1, last))?,
                Formula::sum_cells(CellAddress::new(2, first), CellAddress::new(2, last))?,
            ]),
            None => None,
        };
        layout.values("Total", total);

        if cols.is_none() {
            layout.unavailable.push(CLOSED_POSITIONS_SHEET.to_string());
        }
        Ok(())
    }

    fn dividends(&self, statement: &Statement, layout: &mut Layout) -> Result<(), EnrichError> {
        let converted_received = self.labels.converted_dividend();
        let converted_withheld = self.labels.converted_withholding();
        let received_alias = [converted_received.as_str()];
        let withheld_alias = [converted_withheld.as_str()];
        let wanted: [&[&str]; 4] = [
            columns::DIVIDEND_RECEIVED,
            &received_alias,
            columns::DIVIDEND_WITHHELD,
            &withheld_alias,
        ];
        let cols = section_columns(statement, DIVIDENDS_SHEET, &wanted)?;

        let (source, target) = self.amount_headers();
        layout.header(DIVIDENDS_SHEET, source, target);

        for (label, pair) in [("Net dividend received", 0), ("Withholding tax", 2)] {
            let values = match &cols {
                Some(c) => Some([
                    Formula::sum(Reference::column_on(DIVIDENDS_SHEET, c[pair]))?,
                    Formula::sum(Reference::column_on(DIVIDENDS_SHEET, c[pair + 1]))?,
                ]),
                None => None,
            };
            layout.values(label, values);
        }

        if cols.is_none() {
            layout.unavailable.push(DIVIDENDS_SHEET.to_string());
        }
        Ok(())
    }

    fn account_activity(&self, statement: &Statement, layout: &mut Layout) -> Result<(), EnrichError> {
        let converted = self.labels.converted_amount();
        let converted_alias = [converted.as_str()];
        let wanted: [&[&str]; 3] = [columns::ACTIVITY_TYPE, columns::ACTIVITY_AMOUNT, &converted_alias];
        let cols = section_columns(statement, ACTIVITY_SHEET, &wanted)?;

        let (source, target) = self.amount_headers();
        layout.header(ACTIVITY_SHEET, source, target);

        for (label, kind) in [("Deposits", DEPOSIT_TYPE), ("Withdrawals", WITHDRAWAL_TYPE)] {
            let values = match &cols {
                Some(c) => Some(sum_if_pair(ACTIVITY_SHEET, c[0], kind, [c[1], c[2]])?),
                None => None,
            };
            layout.values(label, values);
        }

        if cols.is_none() {
            layout.unavailable.push(ACTIVITY_SHEET.to_string());
        }
        Ok(())
    }
}

/// Columns of a section's source sheet, or `None` when the section can't be computed
///
/// A dirty header index is an error rather than an unavailable section.
fn section_columns(
    statement: &Statement,
    sheet_name: &str,
    wanted: &[&[&str]],
) -> Result<Option<Vec<u32>>, EnrichError> {
    let Some(sheet) = statement.sheet(sheet_name) else {
        debug!("Summary: sheet '{}' absent", sheet_name);
        return Ok(None);
    };

    let mut cols = Vec::with_capacity(wanted.len());
    for aliases in wanted {
        match sheet.column(aliases) {
            Ok(col) => cols.push(col),
            Err(e) if e.is_sheet_local() => {
                debug!("Summary: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Some(cols))
}

fn sum_if_pair(
    sheet: &str,
    criteria_col: u32,
    criterion: &str,
    sum_cols: [u32; 2],
) -> Result<[Formula; 2], EnrichError> {
    let criteria = Reference::column_on(sheet, criteria_col);
    Ok([
        Formula::sum_if(criteria.clone(), criterion, Reference::column_on(sheet, sum_cols[0]))?,
        Formula::sum_if(criteria, criterion, Reference::column_on(sheet, sum_cols[1]))?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::tests::sheet_from_rows;
    use crate::enrich::StatementEnricher;
    use crate::rates::{RateSample, RateSeries};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rates() -> RateSeries {
        RateSeries::new(vec![RateSample::new(
            NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            dec!(360.0),
        )])
    }

    fn statement() -> Statement {
        let mut statement = Statement::new("statement");
        statement.push_sheet(sheet_from_rows(
            ACTIVITY_SHEET,
            &[
                vec![Cell::text("Date"), Cell::text("Amount"), Cell::text("Type")],
                vec![Cell::text("04/01/2022 10:00"), Cell::number(500.0), Cell::text("Deposit")],
            ],
        ));
        statement.push_sheet(sheet_from_rows(
            CLOSED_POSITIONS_SHEET,
            &[
                vec![
                    Cell::text("Amount"),
                    Cell::text("Open Date"),
                    Cell::text("Close Date"),
                    Cell::text("Profit(USD)"),
                    Cell::text("Type"),
                ],
                vec![
                    Cell::number(100.0),
                    Cell::text("05/01/2022 09:00"),
                    Cell::text("06/01/2022 09:00"),
                    Cell::number(4.0),
                    Cell::text("Stocks"),
                ],
            ],
        ));
        statement
    }

    fn expression(sheet: &Sheet, col: u32, row: u32) -> String {
        match sheet.cell(CellAddress::new(col, row)) {
            Some(Cell::Formula(f)) => f.expression().to_string(),
            Some(Cell::Literal(v)) => v.as_text(),
            None => String::new(),
        }
    }

    #[test]
    fn test_summary_references_columns_by_name() {
        let labels = ColumnLabels::default();
        let rates = rates();
        let mut statement = statement();
        StatementEnricher::new(&rates, &labels)
            .enrich(&mut statement)
            .unwrap();

        let unavailable = SummaryBuilder::new(&labels).attach(&mut statement).unwrap();
        assert_eq!(unavailable, vec![DIVIDENDS_SHEET.to_string()]);

        let summary = statement.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(expression(summary, 0, 0), "Closed Positions");
        assert_eq!(expression(summary, 2, 0), "Profit (HUF)");
        // Profit(USD) is column D, Profit (HUF) is the last appended column J
        assert_eq!(
            expression(summary, 1, 1),
            "SUMIF('Closed Positions'!E:E,\"Stocks\",'Closed Positions'!D:D)"
        );
        assert_eq!(
            expression(summary, 2, 1),
            "SUMIF('Closed Positions'!E:E,\"Stocks\",'Closed Positions'!J:J)"
        );
        assert_eq!(expression(summary, 0, 5), "Total");
        assert_eq!(expression(summary, 1, 5), "SUM(B2:B5)");

        assert_eq!(expression(summary, 0, 7), "Dividends");
        assert_eq!(expression(summary, 1, 8), NOT_AVAILABLE);
        assert_eq!(expression(summary, 2, 9), NOT_AVAILABLE);

        assert_eq!(expression(summary, 0, 12), "Deposits");
        assert_eq!(
            expression(summary, 2, 12),
            "SUMIF('Account Activity'!C:C,\"Deposit\",'Account Activity'!E:E)"
        );
        assert_eq!(
            expression(summary, 1, 13),
            "SUMIF('Account Activity'!C:C,\"Withdraw Request\",'Account Activity'!B:B)"
        );
        assert_eq!(summary.bound().to_string(), "A1:C14");
    }

    #[test]
    fn test_unenriched_positions_render_not_available() {
        let labels = ColumnLabels::default();
        let statement = statement();

        let (summary, unavailable) = SummaryBuilder::new(&labels).build(&statement).unwrap();
        assert!(unavailable.contains(&CLOSED_POSITIONS_SHEET.to_string()));
        for row in 1..=5 {
            assert_eq!(expression(&summary, 1, row), NOT_AVAILABLE);
            assert_eq!(expression(&summary, 2, row), NOT_AVAILABLE);
        }
    }

    #[test]
    fn test_dirty_sheet_fails_with_stale_index() {
        let labels = ColumnLabels::default();
        let mut statement = statement();
        statement
            .sheet_mut(ACTIVITY_SHEET)
            .unwrap()
            .set_cell(CellAddress::new(0, 0), Cell::text("When"))
            .unwrap();

        let err = SummaryBuilder::new(&labels).build(&statement).unwrap_err();
        assert_eq!(err, EnrichError::StaleIndex(ACTIVITY_SHEET.to_string()));
    }
}
