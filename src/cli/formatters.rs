//! Terminal and JSON rendering for command results

use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use fxstatement::enrich::SheetOutcome;
use fxstatement::pipeline::FileReport;
use fxstatement::rates::RateSeries;
use fxstatement::sheet::{column_letters, Statement};

/// Per-file, per-sheet table of an enrichment run
pub fn format_run_report(reports: &[FileReport]) -> String {
    #[derive(Tabled)]
    struct SheetRow {
        #[tabled(rename = "File")]
        file: String,
        #[tabled(rename = "Sheet")]
        sheet: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Rows")]
        rows: String,
        #[tabled(rename = "Detail")]
        detail: String,
    }

    let mut output = String::new();
    let mut rows = Vec::new();

    for report in reports {
        let file = report
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| report.input.display().to_string());

        for outcome in &report.sheets {
            let (status, count, detail) = match outcome {
                SheetOutcome::Enriched {
                    rows,
                    skipped_rows,
                    ..
                } => (
                    "enriched".green().to_string(),
                    rows.to_string(),
                    if *skipped_rows > 0 {
                        format!("{} row(s) without date", skipped_rows)
                    } else {
                        String::new()
                    },
                ),
                SheetOutcome::Skipped { reason, .. } => {
                    ("skipped".yellow().to_string(), "-".to_string(), reason.clone())
                }
                SheetOutcome::Absent { .. } => {
                    ("absent".dimmed().to_string(), "-".to_string(), String::new())
                }
            };
            rows.push(SheetRow {
                file: file.clone(),
                sheet: outcome.sheet().to_string(),
                status,
                rows: count,
                detail,
            });
        }
    }

    if !rows.is_empty() {
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
            .to_string();
        output.push_str(&table);
        output.push('\n');
    }

    for report in reports {
        match (&report.output, &report.error) {
            (_, Some(error)) => output.push_str(&format!(
                "{} {}: {}\n",
                "✗".red().bold(),
                report.input.display(),
                error
            )),
            (Some(path), None) => {
                output.push_str(&format!("{} {}\n", "✓".green().bold(), path.display()));
                if !report.summary_unavailable.is_empty() {
                    output.push_str(&format!(
                        "  {} summary shows n/a for: {}\n",
                        "ℹ".blue().bold(),
                        report.summary_unavailable.join(", ")
                    ));
                }
            }
            (None, None) => {}
        }
    }

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    output.push_str(&format!(
        "\n{} file(s) processed, {} failed\n",
        reports.len(),
        if failed > 0 {
            failed.to_string().red().bold().to_string()
        } else {
            failed.to_string()
        }
    ));
    output
}

/// Rate series as a two-column table
pub fn format_rates_table(series: &RateSeries, currency: &str) -> String {
    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Rate")]
        rate: String,
    }

    let rows: Vec<RateRow> = series
        .samples()
        .iter()
        .map(|s| RateRow {
            date: s.date.format("%Y-%m-%d").to_string(),
            rate: s.rate.to_string(),
        })
        .collect();

    let mut output = format!(
        "\n{} {} rate(s) for {}\n\n",
        "💱".cyan().bold(),
        series.len(),
        currency.to_uppercase().yellow()
    );
    output.push_str(
        &Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
            .to_string(),
    );
    output.push('\n');
    output
}

#[derive(Debug, Serialize)]
pub struct InspectedSheet {
    pub name: String,
    pub bound: String,
    pub cells: usize,
    pub headers: Vec<InspectedHeader>,
    pub duplicate_headers: Vec<InspectedHeader>,
}

#[derive(Debug, Serialize)]
pub struct InspectedHeader {
    pub label: String,
    pub column: String,
}

/// Sheets with their bound and header index, in workbook order
pub fn inspect_statement(statement: &Statement) -> anyhow::Result<Vec<InspectedSheet>> {
    let header = |label: &str, col: u32| -> anyhow::Result<InspectedHeader> {
        Ok(InspectedHeader {
            label: label.to_string(),
            column: column_letters(col)?,
        })
    };

    statement
        .sheets()
        .iter()
        .map(|sheet| -> anyhow::Result<InspectedSheet> {
            let index = sheet.headers()?;
            Ok(InspectedSheet {
                name: sheet.name().to_string(),
                bound: sheet.bound().to_string(),
                cells: sheet.grid().len(),
                headers: index
                    .labels()
                    .into_iter()
                    .map(|(label, col)| header(label, col))
                    .collect::<anyhow::Result<_>>()?,
                duplicate_headers: index
                    .duplicates()
                    .iter()
                    .map(|(label, col)| header(label, *col))
                    .collect::<anyhow::Result<_>>()?,
            })
        })
        .collect()
}

pub fn format_inspect(file: &str, sheets: &[InspectedSheet]) -> String {
    let mut output = format!(
        "{} Inspecting file: {}\n\n{} Found {} sheet(s)\n\n",
        "📊".cyan().bold(),
        file.green(),
        "📄".cyan().bold(),
        sheets.len()
    );

    for sheet in sheets {
        output.push_str(&format!(
            "{} Sheet: {}\n  Bound: {}\n  Cells: {}\n",
            "📌".cyan().bold(),
            sheet.name.yellow().bold(),
            sheet.bound,
            sheet.cells
        ));
        if sheet.headers.is_empty() {
            output.push_str("  No header labels\n\n");
            continue;
        }
        let headers = sheet
            .headers
            .iter()
            .map(|h| format!("{}={}", h.column, h.label))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("  Headers: {}\n", headers));
        for duplicate in &sheet.duplicate_headers {
            output.push_str(&format!(
                "  {} duplicate header '{}' in column {} ignored\n",
                "⚠️".yellow(),
                duplicate.label,
                duplicate.column
            ));
        }
        output.push('\n');
    }
    output
}
