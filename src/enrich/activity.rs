use crate::error::EnrichError;
use crate::rates::RateSeries;
use crate::sheet::mutator::{append_columns, write_formula, write_literal};
use crate::sheet::{CellAddress, Formula, Reference, Sheet};

use super::columns::{self, ColumnLabels};
use super::{check_amount, log_skipped_row, rate_value, row_date, RowStats};

/// Account activity: rate on the activity date and the converted amount
pub(super) fn enrich(
    sheet: &mut Sheet,
    rates: &RateSeries,
    labels: &ColumnLabels,
) -> Result<(RowStats, Vec<String>), EnrichError> {
    let date_col = sheet.column(columns::ACTIVITY_DATE)?;
    let amount_col = sheet.column(columns::ACTIVITY_AMOUNT)?;

    let appended = vec![labels.exchange_rate(), labels.converted_amount()];
    let rate_col = append_columns(sheet, &appended)?;
    let converted_col = rate_col + 1;

    let mut stats = RowStats::default();
    for row in sheet.bound().data_rows() {
        let Some(date) = row_date(sheet, date_col, row)? else {
            log_skipped_row(sheet, row);
            stats.skipped += 1;
            continue;
        };
        check_amount(sheet, amount_col, row)?;

        let rate_cell = CellAddress::new(rate_col, row);
        write_literal(sheet, rate_cell, rate_value(rates.effective_rate(date)?)?)?;
        write_formula(
            sheet,
            CellAddress::new(converted_col, row),
            Formula::product(
                Reference::cell(CellAddress::new(amount_col, row)),
                Reference::cell(rate_cell),
            )?,
        )?;
        stats.enriched += 1;
    }

    Ok((stats, appended))
}
