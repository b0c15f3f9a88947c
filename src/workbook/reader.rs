use anyhow::{Context, Result};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::sheet::{Bound, Cell, CellAddress, CellValue, Formula, Grid, Sheet, Statement};

/// `*.xlsx` files in a directory, sorted by path
///
/// Office lock files (`~$name.xlsx`) are skipped.
pub fn list_input_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with("~$") {
            debug!("Skipping lock file {}", name);
            continue;
        }
        let is_xlsx = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
        if is_xlsx {
            files.push(path);
        }
    }

    files.sort();
    info!("Found {} input file(s) in {}", files.len(), dir.display());
    Ok(files)
}

/// Read every sheet of a workbook into a statement
///
/// Cell values come from the cached values; cells that hold a formula are
/// kept as formulas so they survive the round trip.
pub fn read_statement<P: AsRef<Path>>(path: P) -> Result<Statement> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file {}", path.display()))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "statement".to_string());
    let mut statement = Statement::new(name);

    for sheet_name in workbook.sheet_names().to_vec() {
        let values = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet '{}'", sheet_name))?;
        let formulas = match workbook.worksheet_formula(&sheet_name) {
            Ok(formulas) => Some(formulas),
            Err(e) => {
                warn!("Could not read formulas of sheet '{}': {}", sheet_name, e);
                None
            }
        };

        let sheet = build_sheet(&sheet_name, &values, formulas.as_ref())
            .with_context(|| format!("Invalid layout in sheet '{}'", sheet_name))?;
        debug!(
            "Read sheet '{}' with bound {} ({} cells)",
            sheet_name,
            sheet.bound(),
            sheet.grid().len()
        );
        statement.push_sheet(sheet);
    }

    info!(
        "Read {} sheet(s) from {}",
        statement.sheets().len(),
        path.display()
    );
    Ok(statement)
}

fn build_sheet(name: &str, values: &Range<Data>, formulas: Option<&Range<String>>) -> Result<Sheet> {
    let bound = declared_bound(values, formulas)?;
    let mut grid = Grid::new(bound);

    if let Some((start_row, start_col)) = values.start() {
        for (row, col, data) in values.used_cells() {
            let Some(value) = cell_value(data) else {
                continue;
            };
            let address = CellAddress::new(start_col + col as u32, start_row + row as u32);
            grid.set(address, Cell::Literal(value))?;
        }
    }

    if let Some((formulas, (start_row, start_col))) =
        formulas.and_then(|f| f.start().map(|start| (f, start)))
    {
        for (row, col, expression) in formulas.used_cells() {
            if expression.trim().is_empty() {
                continue;
            }
            let address = CellAddress::new(start_col + col as u32, start_row + row as u32);
            let formula = match grid.get(address) {
                Some(Cell::Literal(value)) => Formula::raw(expression.as_str()).with_cached(value.clone()),
                _ => Formula::raw(expression.as_str()),
            };
            grid.set(address, Cell::Formula(formula))?;
        }
    }

    Ok(Sheet::new(name, grid))
}

/// Smallest bound covering both the value and formula ranges
///
/// An empty sheet gets the single cell `A1`.
fn declared_bound(values: &Range<Data>, formulas: Option<&Range<String>>) -> Result<Bound> {
    let corners = [values.start(), values.end()]
        .into_iter()
        .chain(formulas.into_iter().flat_map(|f| [f.start(), f.end()]))
        .flatten();

    let (mut min_row, mut min_col, mut max_row, mut max_col) = (u32::MAX, u32::MAX, 0, 0);
    let mut any = false;
    for (row, col) in corners {
        any = true;
        min_row = min_row.min(row);
        min_col = min_col.min(col);
        max_row = max_row.max(row);
        max_col = max_col.max(col);
    }

    if !any {
        return Ok(Bound::single(CellAddress::new(0, 0)));
    }
    Ok(Bound::new(
        CellAddress::new(min_col, min_row),
        CellAddress::new(max_col, max_row),
    )?)
}

fn cell_value(data: &Data) -> Option<CellValue> {
    match data {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(CellValue::DateTime(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}
