//! Rulecov CLI - Rule Example Coverage Checker
//!
//! Checks that the examples embedded in rule definition files exercise
//! every branch of each rule's query expression.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use glob::glob;
use rulecov::config::{ColorMode, Config, OutputFormat};
use rulecov::engine::Engine;
use rulecov::output::formatter_for;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rulecov",
    version,
    about = "Rule example coverage checker",
    long_about = "Verifies that the annotated examples embedded in rule definition files \
exercise every branch of each rule's query expression, and reports uncovered \
branches with their file line."
)]
struct Cli {
    /// Rule files or glob patterns to check
    files: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value = "0")]
    jobs: usize,

    /// Ignore rules by name prefix (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore: Option<Vec<String>>,

    /// Exit with 0 even if uncovered branches are found
    #[arg(long)]
    exit_zero: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Lcov,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::Lcov => OutputFormat::Lcov,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                std::process::exit(2);
            }
        },
        None => Config::load_default().unwrap_or_else(|e| {
            eprintln!("{}: invalid configuration: {}", "warning".yellow(), e);
            Config::default()
        }),
    };

    config.merge_cli(
        Some(cli.format.into()),
        Some(cli.verbose),
        Some(cli.jobs),
        cli.ignore.clone(),
    );
    if cli.no_color {
        config.output.color = ColorMode::Never;
        colored::control::set_override(false);
    }

    // Expand glob patterns
    let patterns: Vec<String> = if cli.files.is_empty() {
        config.files.include.clone()
    } else {
        cli.files.clone()
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in &patterns {
        match glob(pattern) {
            Ok(paths) => {
                for entry in paths.flatten() {
                    if entry.is_file() {
                        files.push(entry);
                    }
                }
            }
            Err(e) => {
                eprintln!(
                    "{}: Invalid pattern '{}': {}",
                    "error".red().bold(),
                    pattern,
                    e
                );
                std::process::exit(2);
            }
        }
    }

    if files.is_empty() {
        eprintln!("{}: No rule files found to check", "error".red().bold());
        std::process::exit(2);
    }

    if cli.verbose {
        eprintln!("Checking {} files...", files.len());
    }

    let engine = Engine::new(config.clone());
    let result = engine.check_files(&files);

    let formatter = formatter_for(&config);
    print!("{}", formatter.format(&result));

    if cli.exit_zero {
        std::process::exit(0);
    }
    std::process::exit(result.exit_code());
}
