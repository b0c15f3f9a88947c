use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use fxstatement::config::{load_config_with_fallback, Config};
use fxstatement::pipeline::{process_all, FileReport};
use fxstatement::rates::{MnbClient, RateSource, SeriesSource};
use fxstatement::workbook::{list_input_files, read_statement};

use crate::cli::{formatters, Cli, Commands, EnrichArgs};

/// Run the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config_with_fallback(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Enrich(EnrichArgs::default())) {
        Commands::Enrich(args) => enrich(args, config, cli.json).await,
        Commands::Rates { from, to, currency } => {
            let currency = currency.unwrap_or_else(|| config.source_currency.clone());
            rates(from, to, &currency, &config, cli.json).await
        }
        Commands::Inspect { file } => inspect(&file, cli.json),
    }
}

fn apply_overrides(config: &mut Config, args: &EnrichArgs) {
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(suffix) = &args.suffix {
        config.output_suffix = suffix.clone();
    }
}

async fn enrich(args: EnrichArgs, mut config: Config, json: bool) -> Result<()> {
    apply_overrides(&mut config, &args);

    let files = if args.files.is_empty() {
        list_input_files(&config.input_dir)?
    } else {
        args.files.clone()
    };

    if files.is_empty() {
        if json {
            println!("[]");
        } else {
            println!(
                "{} No statement files found in {}",
                "ℹ".blue().bold(),
                config.input_dir.display()
            );
        }
        return Ok(());
    }

    info!("Processing {} file(s)", files.len());
    let config = Arc::new(config);
    let reports = match &args.rates_file {
        Some(path) => {
            let source = SeriesSource::from_json_file(path)?;
            process_all(files, Arc::clone(&config), Arc::new(source)).await
        }
        None => {
            let client = MnbClient::new(
                &config.rate_source.url,
                &config.source_currency,
                config.rate_source.timeout(),
            )
            .context("Failed to build rate source client")?;
            process_all(files, Arc::clone(&config), Arc::new(client)).await
        }
    };

    print_reports(&reports, json)?;

    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        bail!("{} of {} file(s) failed", failed, reports.len());
    }
    Ok(())
}

fn print_reports(reports: &[FileReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        print!("{}", formatters::format_run_report(reports));
    }
    Ok(())
}

async fn rates(from: NaiveDate, to: NaiveDate, currency: &str, config: &Config, json: bool) -> Result<()> {
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }

    let client = MnbClient::new(&config.rate_source.url, currency, config.rate_source.timeout())
        .context("Failed to build rate source client")?;
    let series = client.fetch_rates(from, to).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(series.samples())?);
    } else {
        print!("{}", formatters::format_rates_table(&series, currency));
    }
    Ok(())
}

fn inspect(file: &Path, json: bool) -> Result<()> {
    let statement = read_statement(file)?;
    let sheets = formatters::inspect_statement(&statement)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sheets)?);
    } else {
        print!(
            "{}",
            formatters::format_inspect(&file.display().to_string(), &sheets)
        );
    }
    Ok(())
}
