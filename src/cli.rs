use crate::sources::InputFormat;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Query JSON, JSON Lines and CSV records with Wireshark-style display filters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "DFQL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// When to use colored output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the records of a file matching a display filter
    Query {
        /// File with the records
        file: PathBuf,

        /// Display filter, e.g. "age >= 32 and gender == male"; omit for all records
        filter: Option<String>,

        /// Input format
        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        input: InputFormat,

        /// Restrict filters to these comma-separated fields
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Start an interactive filter shell over a file
    Shell {
        /// File with the records
        file: PathBuf,

        /// Input format
        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        input: InputFormat,

        /// Restrict filters to these comma-separated fields
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },
    /// List the field names of a file
    Fields {
        /// File with the records
        file: PathBuf,

        /// Input format
        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        input: InputFormat,

        /// Only list top-level keys
        #[arg(long)]
        flat: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
