//! Cell values and formula expressions.

use std::fmt;

use super::address::{column_letters, CellAddress};
use crate::error::EnrichError;

/// Literal cell content
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet date-time serial (days since 1899-12-30)
    DateTime(f64),
}

impl CellValue {
    /// Text representation used for headers and date parsing
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) | CellValue::DateTime(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string().to_uppercase(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

/// A written cell: either a literal value or a formula
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Literal(CellValue),
    Formula(Formula),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Literal(CellValue::Text(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Cell::Literal(CellValue::Number(value))
    }

    pub fn literal(&self) -> Option<&CellValue> {
        match self {
            Cell::Literal(value) => Some(value),
            Cell::Formula(_) => None,
        }
    }

    pub fn formula(&self) -> Option<&Formula> {
        match self {
            Cell::Formula(formula) => Some(formula),
            Cell::Literal(_) => None,
        }
    }
}

/// Something a formula can point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A single cell, optionally on another sheet
    Cell {
        sheet: Option<String>,
        address: CellAddress,
    },
    /// A whole column, optionally on another sheet (`'Sheet'!C:C`)
    Column { sheet: Option<String>, col: u32 },
}

impl Reference {
    pub fn cell(address: CellAddress) -> Self {
        Reference::Cell {
            sheet: None,
            address,
        }
    }

    pub fn column_on(sheet: &str, col: u32) -> Self {
        Reference::Column {
            sheet: Some(sheet.to_string()),
            col,
        }
    }

    /// Render the reference as formula text
    pub fn to_formula_text(&self) -> Result<String, EnrichError> {
        match self {
            Reference::Cell { sheet, address } => {
                Ok(format!("{}{}", sheet_prefix(sheet.as_deref()), address.to_a1()?))
            }
            Reference::Column { sheet, col } => {
                let letters = column_letters(*col)?;
                Ok(format!("{}{}:{}", sheet_prefix(sheet.as_deref()), letters, letters))
            }
        }
    }
}

fn sheet_prefix(sheet: Option<&str>) -> String {
    match sheet {
        Some(name) => format!("{}!", quote_sheet_name(name)),
        None => String::new(),
    }
}

/// Quote a sheet name for use in a formula when it is not a bare identifier
pub fn quote_sheet_name(name: &str) -> String {
    let bare = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if bare {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn quote_string_literal(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Formula expression together with the references it was built from
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    expression: String,
    references: Vec<Reference>,
    /// Last computed value, when read from a saved workbook
    cached: Option<CellValue>,
}

impl Formula {
    /// Wrap an expression read from an existing workbook
    pub fn raw(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let expression = expression
            .strip_prefix('=')
            .map(str::to_string)
            .unwrap_or(expression);
        Self {
            expression,
            references: Vec::new(),
            cached: None,
        }
    }

    pub fn with_cached(mut self, value: CellValue) -> Self {
        self.cached = Some(value);
        self
    }

    /// `lhs*rhs`
    pub fn product(lhs: Reference, rhs: Reference) -> Result<Self, EnrichError> {
        let expression = format!("{}*{}", lhs.to_formula_text()?, rhs.to_formula_text()?);
        Ok(Self {
            expression,
            references: vec![lhs, rhs],
            cached: None,
        })
    }

    /// `lhs-rhs`
    pub fn difference(lhs: Reference, rhs: Reference) -> Result<Self, EnrichError> {
        let expression = format!("{}-{}", lhs.to_formula_text()?, rhs.to_formula_text()?);
        Ok(Self {
            expression,
            references: vec![lhs, rhs],
            cached: None,
        })
    }

    /// `(minuend-subtrahend)*factor`
    pub fn scaled_difference(
        minuend: Reference,
        subtrahend: Reference,
        factor: Reference,
    ) -> Result<Self, EnrichError> {
        let expression = format!(
            "({}-{})*{}",
            minuend.to_formula_text()?,
            subtrahend.to_formula_text()?,
            factor.to_formula_text()?
        );
        Ok(Self {
            expression,
            references: vec![minuend, subtrahend, factor],
            cached: None,
        })
    }

    /// `SUM(range)`
    pub fn sum(range: Reference) -> Result<Self, EnrichError> {
        let expression = format!("SUM({})", range.to_formula_text()?);
        Ok(Self {
            expression,
            references: vec![range],
            cached: None,
        })
    }

    /// `SUMIF(criteria_range,"criterion",sum_range)`
    pub fn sum_if(
        criteria_range: Reference,
        criterion: &str,
        sum_range: Reference,
    ) -> Result<Self, EnrichError> {
        let expression = format!(
            "SUMIF({},{},{})",
            criteria_range.to_formula_text()?,
            quote_string_literal(criterion),
            sum_range.to_formula_text()?
        );
        Ok(Self {
            expression,
            references: vec![criteria_range, sum_range],
            cached: None,
        })
    }

    /// `SUM(first:last)` over cells of the same sheet
    pub fn sum_cells(first: CellAddress, last: CellAddress) -> Result<Self, EnrichError> {
        let expression = format!("SUM({}:{})", first.to_a1()?, last.to_a1()?);
        Ok(Self {
            expression,
            references: vec![Reference::cell(first), Reference::cell(last)],
            cached: None,
        })
    }

    /// Expression text without the leading `=`
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn cached(&self) -> Option<&CellValue> {
        self.cached.as_ref()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}", self.expression)
    }
}
