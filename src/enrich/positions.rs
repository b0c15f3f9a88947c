use crate::error::EnrichError;
use crate::rates::RateSeries;
use crate::sheet::mutator::{append_columns, write_formula, write_literal};
use crate::sheet::{CellAddress, Formula, Reference, Sheet};

use super::columns::{self, ColumnLabels};
use super::{check_amount, log_skipped_row, rate_value, row_date, RowStats};

/// Closed positions: rates at open and close, converted amounts and profit
///
/// Per row, with `amount` and `profit` in the source currency:
/// - at open: `amount * open_rate`
/// - at close: `(amount - profit) * close_rate`
/// - profit: `at_open - at_close`
pub(super) fn enrich(
    sheet: &mut Sheet,
    rates: &RateSeries,
    labels: &ColumnLabels,
) -> Result<(RowStats, Vec<String>), EnrichError> {
    let amount_col = sheet.column(columns::POSITION_AMOUNT)?;
    let open_date_col = sheet.column(columns::POSITION_OPEN_DATE)?;
    let close_date_col = sheet.column(columns::POSITION_CLOSE_DATE)?;
    let profit_col = sheet.column(columns::POSITION_PROFIT)?;

    let appended = vec![
        labels.open_rate(),
        labels.converted_at_open(),
        labels.close_rate(),
        labels.converted_at_close(),
        labels.converted_profit(),
    ];
    let open_rate_col = append_columns(sheet, &appended)?;
    let at_open_col = open_rate_col + 1;
    let close_rate_col = open_rate_col + 2;
    let at_close_col = open_rate_col + 3;
    let profit_out_col = open_rate_col + 4;

    let mut stats = RowStats::default();
    for row in sheet.bound().data_rows() {
        let open_date = row_date(sheet, open_date_col, row)?;
        let close_date = row_date(sheet, close_date_col, row)?;
        let (Some(open_date), Some(close_date)) = (open_date, close_date) else {
            log_skipped_row(sheet, row);
            stats.skipped += 1;
            continue;
        };
        check_amount(sheet, amount_col, row)?;
        check_amount(sheet, profit_col, row)?;

        let at = |col: u32| Reference::cell(CellAddress::new(col, row));

        write_literal(
            sheet,
            CellAddress::new(open_rate_col, row),
            rate_value(rates.effective_rate(open_date)?)?,
        )?;
        write_formula(
            sheet,
            CellAddress::new(at_open_col, row),
            Formula::product(at(amount_col), at(open_rate_col))?,
        )?;
        write_literal(
            sheet,
            CellAddress::new(close_rate_col, row),
            rate_value(rates.effective_rate(close_date)?)?,
        )?;
        write_formula(
            sheet,
            CellAddress::new(at_close_col, row),
            Formula::scaled_difference(at(amount_col), at(profit_col), at(close_rate_col))?,
        )?;
        write_formula(
            sheet,
            CellAddress::new(profit_out_col, row),
            Formula::difference(at(at_open_col), at(at_close_col))?,
        )?;
        stats.enriched += 1;
    }

    Ok((stats, appended))
}
