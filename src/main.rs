use clap::Parser;
use tracing_subscriber::EnvFilter;

use yt_csv::commands;
use yt_csv::config::{DEFAULT_COUNT, RunConfig, load_env};
use yt_csv::error::{Error, Result};
use yt_csv::extractor::YtDlp;

#[derive(Parser)]
#[command(name = "yt-csv")]
#[command(about = "Export a YouTube channel's recent videos to CSV using yt-dlp")]
#[command(version)]
#[command(after_help = "Examples:
  yt-csv @example --count 20 --output example.csv
  yt-csv youtube.com/@example -c 5
  yt-csv https://www.youtube.com/@example -c 15 -j 4

Files are always written to the yt-csv/ directory (override with YT_CSV_DIR).")]
struct Cli {
    /// Channel handle or URL (e.g., @CHANNEL or https://www.youtube.com/@CHANNEL)
    channel: String,

    /// Number of most recent videos to export
    #[arg(short, long, default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Output file name; directory components are ignored (default: <handle>.csv)
    #[arg(short, long)]
    output: Option<String>,

    /// Premiere-date lookups to run at once, 1-8 (default: 1)
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "yt_csv=debug" } else { "yt_csv=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::new(&cli.channel, cli.count, cli.output.as_deref(), cli.jobs)?;

    let ytdlp = YtDlp::locate()?;
    eprintln!("Using yt-dlp: {}", ytdlp.program().display());

    let summary = commands::export::run(&config, &ytdlp, interrupted()).await?;

    println!(
        "Exported {} video(s) to {}",
        summary.rows,
        summary.path.display()
    );

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables
    load_env();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        match &e {
            Error::Interrupted => eprintln!("\nInterrupted; nothing was written."),
            _ => {
                eprintln!("Error: {}", e);
                if let Some(hint) = e.hint() {
                    eprintln!("\n{}", hint);
                }
            }
        }
        std::process::exit(e.exit_code());
    }
}
