use anyhow::bail;
use clap::Parser;
use colored::Colorize;
use linescan::{RunState, ScanEvent, SearchConfig, Searcher};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Case-insensitive substring search over the lines of a file", long_about = None)]
struct Cli {
    /// File whose lines are searched
    file: PathBuf,

    /// Case-insensitive substring to search for
    query: String,

    /// Number of search workers
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print status transitions and elapsed time while running
    #[arg(short, long)]
    verbose: bool,
}

/// Formats elapsed seconds as HH:MM:SS
fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base = SearchConfig::load_from(cli.config.as_deref()).unwrap_or_default();
    let worker_count = cli.workers.unwrap_or(base.worker_count);
    let config = base.merge_with_cli(SearchConfig {
        worker_count,
        ..SearchConfig::new(cli.file, cli.query)
    });

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();
    debug!(
        "searching {} for {:?} with {} workers",
        config.file_path.display(),
        config.query,
        config.worker_count
    );

    let searcher = Searcher::new();
    let events = searcher.subscribe();
    searcher.start(config)?;

    loop {
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(ScanEvent::MatchFound(line)) => println!("{}", line),
            Ok(ScanEvent::Tick(seconds)) => {
                if cli.verbose {
                    eprintln!("{}", format_elapsed(seconds).dimmed());
                }
            }
            Ok(ScanEvent::StateChanged(state)) => {
                if cli.verbose {
                    eprintln!("{}", state.status_text().blue());
                }
                match state {
                    RunState::Finished => break,
                    RunState::Error => bail!("{}", state.status_text()),
                    RunState::Cancelled => break,
                    _ => {}
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    eprintln!(
        "{} matches in {}",
        searcher.match_count().to_string().green().bold(),
        format_elapsed(searcher.elapsed_seconds())
    );
    Ok(())
}
