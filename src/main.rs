//! CLI entry point for `mobiscope`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use mobiscope::config::Config;
use mobiscope::{analyzer, compare, report};

#[derive(Parser)]
#[command(
    name = "mobiscope",
    version,
    about = "Inspect and compare the headers of MOBI e-books"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and print the headers of one file
    Analyze {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Analyze two files and compare key header fields
    Compare {
        a: PathBuf,
        b: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = mobiscope::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Analyze { path, json } => cmd_analyze(&path, json, &config),
        Commands::Compare { a, b, json } => cmd_compare(&a, &b, json, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = mobiscope::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mobiscope.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mobiscope", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Analyze one file and print its headers.
fn cmd_analyze(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let data = analyzer::load_file(path)?;
    let result = analyzer::analyze_bytes(&data).map_err(|e| e.in_file(path))?;

    if json {
        let value = report::json::analysis_json(path, &result)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!(
            "{}",
            report::text::render_analysis("File", path, &result, &data, &config.report)
        );
    }
    Ok(())
}

/// Analyze two files and print the comparison.
fn cmd_compare(a: &Path, b: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let outcome = compare::compare_files(a, b);

    if json {
        let value = report::json::comparison_json(&outcome)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!(
            "{}",
            report::text::render_comparison(&outcome, &config.report)
        );
    }
    Ok(())
}
