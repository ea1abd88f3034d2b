pub mod cli;
pub mod config;
pub mod filter;
pub mod record;
pub mod shell;
pub mod sources;
pub mod table;
pub mod value;

use anyhow::Context;
use log::{LevelFilter, debug};
use std::io;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use config::{ConfigError, DfqlConfig, load_config};
pub use filter::{DisplayFilter, EvaluationError, ParserError};
pub use record::{Record, record_from_serialize, records_from_rows};
pub use sources::{Dataset, InputFormat, SourceError};
pub use table::{QueryError, ResultTable};
pub use value::Value;

/// Log level for `-v` counts; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Debug)
        .format_timestamp(None)
        .format_target(false);
    if let Some(spec) = &rust_log {
        builder.parse_filters(spec);
    }
    // The shell's `debug` command raises the max level later on.
    if builder.try_init().is_ok() && rust_log.is_none() {
        log::set_max_level(level);
    }
}

fn apply_color_mode(color_mode: ColorMode) {
    match color_mode {
        ColorMode::Always => unsafe {
            std::env::set_var("CLICOLOR_FORCE", "1");
        },
        ColorMode::Never => unsafe {
            std::env::set_var("NO_COLOR", "1");
        },
        ColorMode::Auto => {}
    }
}

/// The configured filter, with `--fields` overriding the allow-list.
fn build_filter(
    config: &DfqlConfig,
    fields: Option<Vec<String>>,
) -> Result<DisplayFilter, ConfigError> {
    let filter = config.display_filter()?;
    Ok(match fields {
        Some(fields) if !fields.is_empty() => filter.with_field_names(fields),
        _ => filter,
    })
}

fn run_query(filter: &DisplayFilter, text: &str, dataset: &Dataset) -> anyhow::Result<ResultTable> {
    match ResultTable::query(filter, text, dataset) {
        Ok(result) => Ok(result),
        Err(QueryError::Parser(err)) => Err(err).context("Invalid display filter"),
        Err(QueryError::Evaluation(err)) => Err(err).context("Failed to evaluate display filter"),
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logging(cli.verbose);
    apply_color_mode(cli.color);

    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = &cli.config {
        debug!("Loaded config from {}", path.display());
    }

    match cli.command {
        Commands::Query {
            file,
            filter,
            input,
            fields,
            output,
        } => {
            let dataset = sources::load(&file, input)?;
            let display_filter = build_filter(&config, fields)?;
            let result = run_query(&display_filter, filter.as_deref().unwrap_or(""), &dataset)?;
            match output {
                OutputFormat::Table => print!("{}", result.render()),
                OutputFormat::Json => println!("{}", result.to_json()?),
            }
        }
        Commands::Shell {
            file,
            input,
            fields,
        } => {
            let dataset = sources::load(&file, input)?;
            let display_filter = build_filter(&config, fields)?;
            let mut shell = shell::Shell::new(&dataset, display_filter)
                .with_rules(config.shell.clone())
                .with_nested_fields(config.table.nested_fields);
            shell.run(io::stdin().lock(), &mut io::stdout().lock())?;
        }
        Commands::Fields { file, input, flat } => {
            let dataset = sources::load(&file, input)?;
            let names = match config.field_names() {
                Some(names) => names.to_vec(),
                None => table::fields(&dataset.records, config.table.nested_fields && !flat),
            };
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}
