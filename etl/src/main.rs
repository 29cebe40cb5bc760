//! orderjoin CLI - join users and orders CSV files into SQLite
//!
//! # Commands
//!
//! ```bash
//! orderjoin run                      # data/raw/*.csv -> data/processed/analytics_v2.sqlite
//! orderjoin run --output out.sqlite  # override any configured location
//! orderjoin run --json               # print the run report as JSON
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! orderjoin inspect data/raw/users.csv   # show detected encoding, delimiter, columns
//! orderjoin config                       # show effective configuration
//! ```

use clap::{Parser, Subcommand};
use orderjoin::config::parse_delimiter;
use orderjoin::logging::init_tracing;
use orderjoin::parser::format_delimiter;
use orderjoin::{read_table, run, PipelineConfig, ReadOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orderjoin")]
#[command(about = "Join users and orders CSV files into a SQLite table", long_about = None)]
struct Cli {
    /// Debug logging for orderjoin events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: read, join, categorise, write
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Print the run report as JSON instead of the summary line
        #[arg(long)]
        json: bool,
    },

    /// Read one delimited file and describe it
    Inspect {
        /// Input file
        input: PathBuf,

        /// Delimiter (auto-detect if not specified)
        #[arg(short, long, value_parser = delimiter_arg)]
        delimiter: Option<char>,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Flags that take precedence over `ORDERJOIN_*` variables.
#[derive(clap::Args)]
struct Overrides {
    /// Users CSV
    #[arg(long)]
    users: Option<PathBuf>,

    /// Orders CSV
    #[arg(long)]
    orders: Option<PathBuf>,

    /// SQLite destination file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Destination table name
    #[arg(long)]
    table: Option<String>,

    /// Numeric orders column used for the category
    #[arg(long)]
    amount_column: Option<String>,

    /// Delimiter for both inputs (auto-detect if not specified)
    #[arg(short, long, value_parser = delimiter_arg)]
    delimiter: Option<char>,
}

impl Overrides {
    fn apply(self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(p) = self.users {
            config.users_path = p;
        }
        if let Some(p) = self.orders {
            config.orders_path = p;
        }
        if let Some(p) = self.output {
            config.destination = p;
        }
        if let Some(t) = self.table {
            config.table_name = t;
        }
        if let Some(c) = self.amount_column {
            config.amount_column = c;
        }
        if self.delimiter.is_some() {
            config.delimiter = self.delimiter;
        }
        config
    }
}

fn delimiter_arg(value: &str) -> Result<char, String> {
    parse_delimiter("--delimiter", value).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run { overrides, json } => cmd_run(overrides, json),
        Commands::Inspect { input, delimiter } => cmd_inspect(&input, delimiter),
        Commands::Config { overrides } => cmd_config(overrides),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(overrides: Overrides) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    Ok(overrides.apply(PipelineConfig::from_env()?))
}

fn cmd_run(overrides: Overrides, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    let report = run(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}

fn cmd_inspect(input: &Path, delimiter: Option<char>) -> Result<(), Box<dyn std::error::Error>> {
    let result = read_table(input, ReadOptions { delimiter })?;

    println!("File: {}", input.display());
    println!("Encoding: {}", result.encoding);
    println!(
        "Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    println!("Columns: {}", result.table.headers.join(", "));
    println!("Rows: {}", result.table.len());
    Ok(())
}

fn cmd_config(overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(overrides)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
