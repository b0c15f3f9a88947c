use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Formula as XlsxFormula, Workbook, Worksheet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::sheet::{Cell, CellValue, Sheet, Statement};

const DATE_TIME_FORMAT: &str = "dd/mm/yyyy hh:mm";

/// `<output_dir>/<statement name><suffix>.xlsx`
pub fn output_path(statement: &Statement, output_dir: &Path, suffix: &str) -> PathBuf {
    output_dir.join(format!("{}{}.xlsx", statement.name(), suffix))
}

/// Write all sheets of a statement to a new workbook
///
/// The output directory is created when missing. Returns the written path.
pub fn write_statement(statement: &Statement, output_dir: &Path, suffix: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let date_format = Format::new().set_num_format(DATE_TIME_FORMAT);
    let mut workbook = Workbook::new();

    for sheet in statement.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet.name())
            .with_context(|| format!("Invalid sheet name '{}'", sheet.name()))?;
        write_sheet(worksheet, sheet, &date_format)
            .with_context(|| format!("Failed to write sheet '{}'", sheet.name()))?;
    }

    let path = output_path(statement, output_dir, suffix);
    workbook
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    info!("Wrote {}", path.display());
    Ok(path)
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, date_format: &Format) -> Result<()> {
    for (address, cell) in sheet.grid().cells() {
        let row = address.row;
        let col = u16::try_from(address.col)
            .with_context(|| format!("Column {} out of range", address.col))?;

        match cell {
            Cell::Literal(CellValue::Text(text)) => {
                worksheet.write_string(row, col, text.as_str())?;
            }
            Cell::Literal(CellValue::Number(number)) => {
                worksheet.write_number(row, col, *number)?;
            }
            Cell::Literal(CellValue::Bool(value)) => {
                worksheet.write_boolean(row, col, *value)?;
            }
            Cell::Literal(CellValue::DateTime(serial)) => {
                worksheet.write_number_with_format(row, col, *serial, date_format)?;
            }
            Cell::Formula(formula) => {
                let mut output = XlsxFormula::new(formula.expression());
                if let Some(value) = formula.cached() {
                    output = output.set_result(value.as_text());
                }
                worksheet.write_formula(row, col, output)?;
            }
        }
    }
    Ok(())
}
