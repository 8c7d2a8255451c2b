// csvcat entry point: re-delimits CSV files (or stdin) onto stdout
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, Level};
use utilkit::cli::{increment_param, toggle_param, value_param, Arg, Parser};
use utilkit::config::ToolSettings;
use utilkit::services::recode::{output_writer, recode_file, recode_stream};

fn init_tracing(verbosity: usize) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let mut delimiter = String::new();
    let mut output_delimiter = String::new();
    let mut config_path = String::new();
    let mut skip_header = false;
    let mut verbosity = 0usize;

    let inputs = {
        let mut parser = Parser::new(
            "csvcat - rewrite CSV data with another delimiter",
            vec![
                Arg::new(
                    "-d",
                    "--delimiter",
                    "D",
                    "Input field delimiter (default ';')",
                    value_param(&mut delimiter),
                ),
                Arg::new(
                    "-o",
                    "--output-delimiter",
                    "D",
                    "Output field delimiter (default ',')",
                    value_param(&mut output_delimiter),
                ),
                Arg::new(
                    "-c",
                    "--config",
                    "FILE",
                    "JSON settings file",
                    value_param(&mut config_path),
                ),
                Arg::flag(
                    "-s",
                    "--skip-header",
                    "Drop the first row of every input",
                    toggle_param(&mut skip_header),
                ),
                Arg::flag(
                    "-v",
                    "--verbose",
                    "More log output, repeat for more",
                    increment_param(&mut verbosity),
                ),
            ],
        );
        parser.process_env_or_exit()?;
        parser.remaining_args().to_vec()
    };

    init_tracing(verbosity);
    info!("Starting csvcat...");

    let mut settings = if config_path.is_empty() {
        ToolSettings::default()
    } else {
        ToolSettings::load_from_file(&config_path)
            .with_context(|| format!("Failed to load settings from '{}'", config_path))?
    };
    if let Some(ch) = delimiter.chars().next() {
        settings.csv.delimiter = ch;
    }
    if let Some(ch) = output_delimiter.chars().next() {
        settings.output_delimiter = ch;
    }
    if skip_header {
        settings.csv.skip_first_row = true;
    }

    let reader = settings.reader()?;
    let mut writer = output_writer(settings.output_delimiter_byte()?, io::stdout().lock());

    if inputs.is_empty() {
        let rows = recode_stream(&reader, io::stdin().lock(), &mut writer)
            .context("Failed to recode stdin")?;
        info!(rows, "Recoded stdin");
    } else {
        for input in &inputs {
            recode_file(&reader, Path::new(input), &mut writer)
                .with_context(|| format!("Failed to recode CSV file '{}'", input))?;
        }
    }
    writer.flush().context("Failed to flush output")?;
    Ok(())
}
