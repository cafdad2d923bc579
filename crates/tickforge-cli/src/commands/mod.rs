mod model;
mod resilver;
mod run;

use std::io::{self, Write};

use tickforge_core::Symbol;
use tickforge_ml::MetricReport;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::CliError;

pub fn run(cli: &Cli) -> Result<(), CliError> {
    let config = AppConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::Run(args) => run::run(args, &config),
        Command::Resilver(args) => resilver::run(args, &config),
        Command::Model(args) => model::run(args, &config),
    }
}

/// Use the `--symbol` flag when present, otherwise prompt on stdin.
pub(crate) fn resolve_symbol(explicit: Option<&str>) -> Result<Symbol, CliError> {
    match explicit {
        Some(raw) => Ok(Symbol::parse(raw)?),
        None => prompt_symbol(),
    }
}

fn prompt_symbol() -> Result<Symbol, CliError> {
    print!("Enter the stock symbol: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(Symbol::parse(line.trim())?)
}

pub(crate) fn print_reports(reports: &[MetricReport]) {
    println!("\nModel evaluation (held-out split):");
    for report in reports {
        println!(
            "{:<24} MAE: {:.2}, RMSE: {:.2}",
            report.model.label(),
            report.mean_absolute_error,
            report.root_mean_squared_error
        );
    }
}
