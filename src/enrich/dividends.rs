use crate::error::EnrichError;
use crate::rates::RateSeries;
use crate::sheet::mutator::{append_columns, write_formula, write_literal};
use crate::sheet::{CellAddress, Formula, Reference, Sheet};

use super::columns::{self, ColumnLabels};
use super::{check_amount, log_skipped_row, rate_value, row_date, RowStats};

/// Dividends: rate on the payment date, converted net amount and withholding
pub(super) fn enrich(
    sheet: &mut Sheet,
    rates: &RateSeries,
    labels: &ColumnLabels,
) -> Result<(RowStats, Vec<String>), EnrichError> {
    let date_col = sheet.column(columns::DIVIDEND_DATE)?;
    let received_col = sheet.column(columns::DIVIDEND_RECEIVED)?;
    let withheld_col = sheet.column(columns::DIVIDEND_WITHHELD)?;

    let appended = vec![
        labels.exchange_rate(),
        labels.converted_dividend(),
        labels.converted_withholding(),
    ];
    let rate_col = append_columns(sheet, &appended)?;

    let mut stats = RowStats::default();
    for row in sheet.bound().data_rows() {
        let Some(date) = row_date(sheet, date_col, row)? else {
            log_skipped_row(sheet, row);
            stats.skipped += 1;
            continue;
        };
        check_amount(sheet, received_col, row)?;
        check_amount(sheet, withheld_col, row)?;

        let rate_cell = CellAddress::new(rate_col, row);
        write_literal(sheet, rate_cell, rate_value(rates.effective_rate(date)?)?)?;

        for (offset, source_col) in [received_col, withheld_col].into_iter().enumerate() {
            write_formula(
                sheet,
                CellAddress::new(rate_col + 1 + offset as u32, row),
                Formula::product(
                    Reference::cell(CellAddress::new(source_col, row)),
                    Reference::cell(rate_cell),
                )?,
            )?;
        }
        stats.enriched += 1;
    }

    Ok((stats, appended))
}
