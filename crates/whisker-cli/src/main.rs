//! Whisker CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use whisker::WhiskerError;
use whisker_cli::{Args, error_adapter::to_reportables};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();
    init_logger(&args.log_level);

    info!(input = args.input; "Starting Whisker");
    debug!(args:?; "Parsed arguments");

    if let Err(err) = whisker_cli::run(&args) {
        report_error(&err);
        process::exit(1);
    }

    debug!("Completed successfully");
}

/// Install the logger on stderr.
fn init_logger(level: &str) {
    let log_level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {level}. Using 'warn' instead.");
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();
}

/// Render each diagnostic of `err` as its own report.
fn report_error(err: &WhiskerError) {
    let reporter = miette::GraphicalReportHandler::new();

    for reportable in to_reportables(err) {
        let mut writer = String::new();
        reporter
            .render_report(&mut writer, &reportable)
            .expect("Writing to String buffer is infallible");

        error!("{writer}");
    }
}
