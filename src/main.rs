use civitai_mirror::catalog::DEFAULT_API_BASE;
use civitai_mirror::{Category, DownloadType, MirrorBuilder, RunSummary};

use clap::Parser;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use console::style;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "civitai-mirror.log";

/// Mirror the models, previews and metadata of Civitai creators.
#[derive(Parser, Debug)]
#[clap(version)]
struct CliArgs {
    /// Creator usernames to mirror.
    #[clap(required = true)]
    pub usernames: Vec<String>,

    /// Civitai API token. Asked for on stdin when not given.
    #[clap(long, env = "CIVITAI_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Seconds to wait between two attempts.
    #[clap(long, default_value_t = 10)]
    pub retry_delay: u64,

    /// Attempts per request, the first one included.
    #[clap(long, default_value_t = 3)]
    pub max_tries: u32,

    /// Concurrent downloads.
    #[clap(long, default_value_t = 5)]
    pub max_threads: usize,

    /// Only download this category (Lora, Checkpoints, Embeddings, Training_Data, Other or All).
    #[clap(long, alias = "download_type", conflicts_with = "exclude_type")]
    pub download_type: Option<DownloadType>,

    /// Download everything but this category.
    #[clap(long, alias = "exclude_type")]
    pub exclude_type: Option<DownloadType>,

    /// Root of the downloaded tree.
    #[clap(long, default_value = "model_downloads")]
    pub output_dir: PathBuf,

    /// Where summaries, failure logs and the process log are written.
    #[clap(long, default_value = "logs")]
    pub logs_dir: PathBuf,

    /// Models listing endpoint.
    #[clap(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Hide the progress bars.
    #[clap(long)]
    pub no_progress: bool,
}

fn init_tracing(logs_dir: &Path) -> Result<()> {
    fs::create_dir_all(logs_dir)
        .wrap_err_with(|| format!("Cannot create {}", logs_dir.display()))?;
    let log_file = File::create(logs_dir.join(LOG_FILE))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        );
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_filter(EnvFilter::new("info,civitai_mirror=debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

async fn prompt_token() -> Result<String> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Please enter your Civitai API token: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

fn summary_table(results: &[(String, civitai_mirror::Result<RunSummary>)]) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Creator".to_string(), "Filter".into(), "Total".into()];
    header.extend(Category::ALL.iter().map(Category::to_string));
    header.extend(
        ["Selected", "Skipped", "Downloaded", "Failed", "Failure log"].map(String::from),
    );
    table.load_preset(UTF8_FULL).set_header(header);

    for (creator, result) in results {
        match result {
            Ok(run) => {
                let mut row = vec![
                    Cell::new(creator),
                    Cell::new(run.filter.to_string()),
                    Cell::new(run.total_items),
                ];
                for category in Category::ALL {
                    let count = run.category_counts.get(&category).copied().unwrap_or_default();
                    row.push(Cell::new(count));
                }
                let failed = match run.failed {
                    0 => style(run.failed).green(),
                    n => style(n).red(),
                };
                row.extend([
                    Cell::new(run.selected),
                    Cell::new(run.intentionally_skipped),
                    Cell::new(run.downloaded),
                    Cell::new(failed),
                    Cell::new(run.failure_records),
                ]);
                table.add_row(row);
            }
            Err(e) => {
                table.add_row(vec![
                    Cell::new(creator),
                    Cell::new(style("aborted").red().bold()),
                    Cell::new(e),
                ]);
            }
        }
    }
    table
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    init_tracing(&args.logs_dir)?;

    let token = match args.token {
        Some(token) => token,
        None => prompt_token().await?,
    };
    if token.is_empty() {
        warn!("No API token given, restricted content will not be downloadable");
    }

    let mut builder = match args.no_progress {
        true => MirrorBuilder::hidden(),
        false => MirrorBuilder::new(),
    }
    .directory(args.output_dir)
    .logs_directory(args.logs_dir)
    .token(token)
    .api_base(args.api_base)
    .retries(args.max_tries)
    .retry_delay(Duration::from_secs(args.retry_delay))
    .concurrent_downloads(args.max_threads);
    if let Some(download_type) = args.download_type {
        builder = builder.download_type(download_type);
    }
    if let Some(exclude_type) = args.exclude_type {
        builder = builder.exclude_type(exclude_type);
    }
    let mirror = builder.build()?;

    info!(creators = args.usernames.len(), "Starting");
    let results = mirror.run(&args.usernames).await;
    println!("{}", summary_table(&results));

    let aborted = results.iter().filter(|(_, r)| r.is_err()).count();
    if aborted > 0 {
        return Err(eyre!("{aborted} of {} creators aborted", results.len()));
    }
    Ok(())
}
