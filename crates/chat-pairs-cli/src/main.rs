//! CLI for turning a Telegram chat export into question/answer pairs.
//!
//! Subcommands:
//!  - `convert` : run the pairing pipeline and write the pairs as CSV or JSONL.
//!  - `inspect` : run the pipeline and report counters without writing anything.
//!
//! Usage examples:
//!  cargo run -p chat-pairs -- convert --input result.json --out pairs.csv
//!  cargo run -p chat-pairs -- inspect --input result.json --json
//!
//! Settings resolve in three layers: built-in defaults, then an optional TOML
//! file (`--config`), then individual flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_pairs::{
    load_conversation, sink, AppConfig, ConcatOrder, Conversation, OutputFormat, Pipeline,
    PipelineOutput, PipelineStats,
};

/// Default export file name written by Telegram Desktop.
const DEFAULT_INPUT: &str = "result.json";

/// CLI entrypoint.
#[derive(Parser)]
#[command(
    name = "chat-pairs",
    about = "Convert a chat export into question/answer training pairs",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build context windows and write question/answer pairs.
    Convert(ConvertArgs),

    /// Report message, anchor and window counts for an export.
    Inspect(InspectArgs),
}

/// Input selection and pipeline knobs shared by every subcommand.
#[derive(Args, Debug)]
struct PipelineArgs {
    /// Path to the Telegram JSON export.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Chat to convert. Required for account exports with several personal chats.
    #[arg(long)]
    chat_id: Option<i64>,

    /// TOML configuration file; flags given on the command line take precedence.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum messages per context window, reply included (default: 4).
    #[arg(long)]
    max_window: Option<usize>,

    /// Maximum age in seconds of a context message relative to the reply (default: 86400).
    #[arg(long)]
    decay_seconds: Option<i64>,

    /// Order of messages within one side of a pair (default: as-stored, newest first).
    #[arg(long, value_enum, value_name = "ORDER")]
    concat_order: Option<ConcatOrderArg>,

    /// Drop messages whose text matches this regex. Repeatable.
    #[arg(long = "drop-pattern", value_name = "REGEX")]
    drop_patterns: Vec<String>,
}

/// Command-line spelling of [`ConcatOrder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ConcatOrderArg {
    AsStored,
    Chronological,
}

impl From<ConcatOrderArg> for ConcatOrder {
    fn from(arg: ConcatOrderArg) -> Self {
        match arg {
            ConcatOrderArg::AsStored => ConcatOrder::AsStored,
            ConcatOrderArg::Chronological => ConcatOrder::Chronological,
        }
    }
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output path (default: result.csv).
    #[arg(long, short = 'o', value_name = "PATH")]
    out: Option<PathBuf>,

    /// Output format: csv|jsonl (default: csv).
    #[arg(long)]
    format: Option<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output the report as JSON to stdout.
    #[arg(long)]
    json: bool,
}

/// Application entry point.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

/// Install a stderr subscriber. `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. from tests) is harmless; ignore the error.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Resolve the effective configuration: defaults < config file < flags.
fn resolve_config(
    args: &PipelineArgs,
    out: Option<&Path>,
    format: Option<&str>,
) -> Result<AppConfig> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(m) = args.max_window {
        cfg.pipeline.max_window = m;
    }
    if let Some(t) = args.decay_seconds {
        cfg.pipeline.decay_seconds = t;
    }
    if let Some(order) = args.concat_order {
        cfg.pipeline.concat_order = order.into();
    }
    cfg.pipeline
        .drop_patterns
        .extend(args.drop_patterns.iter().cloned());
    if let Some(out) = out {
        cfg.output.path = out.to_path_buf();
    }
    if let Some(format) = format {
        cfg.output.format = OutputFormat::parse(format)?;
    }

    cfg.validate().context("validating configuration")?;
    tracing::debug!(?cfg, "effective configuration");
    Ok(cfg)
}

/// Load the export and run the pipeline over the selected chat.
fn load_and_run(args: &PipelineArgs, cfg: &AppConfig) -> Result<(Conversation, PipelineOutput)> {
    let conversation = load_conversation(&args.input, args.chat_id)
        .with_context(|| format!("loading export from {}", args.input.display()))?;
    let pipeline = Pipeline::new(cfg.pipeline.clone()).context("building pipeline")?;
    let output = pipeline
        .run(&conversation)
        .with_context(|| format!("pairing messages of {}", args.input.display()))?;
    Ok((conversation, output))
}

/// Run the `convert` subcommand.
///
/// # Errors
///
/// Returns an `anyhow::Error` when loading, validation or writing fails. In
/// every failure case the output file is left as it was before the run.
fn run_convert(args: ConvertArgs) -> Result<()> {
    let cfg = resolve_config(&args.pipeline, args.out.as_deref(), args.format.as_deref())?;
    println!("Converting {}", args.pipeline.input.display());

    let (conversation, output) = load_and_run(&args.pipeline, &cfg)?;
    print_summary(&conversation, &output.stats, &cfg);

    let total = output.pairs.len();
    let written = write_with_progress(&cfg, output.pairs, total)?;
    println!(
        "Wrote {} pairs to {} ({})",
        written,
        cfg.output.path.display(),
        cfg.output.format.as_str()
    );
    Ok(())
}

#[cfg(feature = "progress")]
fn write_with_progress(
    cfg: &AppConfig,
    pairs: Vec<chat_pairs::QaPair>,
    total: usize,
) -> Result<usize> {
    use indicatif::{ProgressBar, ProgressStyle};

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("progress bar template")?
            .progress_chars("##-"),
    );
    bar.set_message("Writing pairs...");

    let on_row: &dyn Fn(usize) = &|n| bar.set_position(n as u64);
    let written = sink::write_pairs(&cfg.output.path, cfg.output.format, pairs, Some(on_row))
        .with_context(|| format!("writing pairs to {}", cfg.output.path.display()));
    match &written {
        Ok(n) => bar.finish_with_message(format!("{n} rows")),
        Err(_) => bar.abandon_with_message("write failed"),
    }
    written
}

#[cfg(not(feature = "progress"))]
fn write_with_progress(
    cfg: &AppConfig,
    pairs: Vec<chat_pairs::QaPair>,
    _total: usize,
) -> Result<usize> {
    sink::write_pairs(&cfg.output.path, cfg.output.format, pairs, None)
        .with_context(|| format!("writing pairs to {}", cfg.output.path.display()))
}

/// Run the `inspect` subcommand.
fn run_inspect(args: InspectArgs) -> Result<()> {
    let cfg = resolve_config(&args.pipeline, None, None)?;
    let (conversation, output) = load_and_run(&args.pipeline, &cfg)?;

    if args.json {
        let report = json!({
            "input": args.pipeline.input.display().to_string(),
            "chat_id": conversation.id,
            "chat_name": conversation.name,
            "max_window": cfg.pipeline.max_window,
            "decay_seconds": cfg.pipeline.decay_seconds,
            "concat_order": cfg.pipeline.concat_order.as_str(),
            "stats": output.stats,
            "first_message_at": output.stats.first_timestamp.and_then(format_time),
            "last_message_at": output.stats.last_timestamp.and_then(format_time),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&conversation, &output.stats, &cfg);
    let span = match (
        output.stats.first_timestamp.and_then(format_time),
        output.stats.last_timestamp.and_then(format_time),
    ) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => "n/a".to_string(),
    };
    println!("Time span: {span}");
    Ok(())
}

fn print_summary(conversation: &Conversation, stats: &PipelineStats, cfg: &AppConfig) {
    println!(
        "Chat: {} (id {})",
        conversation.name.as_deref().unwrap_or("<unnamed>"),
        conversation
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string())
    );
    println!("Total Messages: {}", stats.total_messages);
    println!("Text Messages: {}", stats.text_messages);
    println!("Model Messages: {}", stats.anchors);
    println!(
        "Windows: {} (absorbed anchors: {}, consumed messages: {}) [max_window={} decay_seconds={} order={}]",
        stats.windows,
        stats.skipped_anchors,
        stats.consumed_messages,
        cfg.pipeline.max_window,
        cfg.pipeline.decay_seconds,
        cfg.pipeline.concat_order.as_str()
    );
}

/// RFC3339 rendering of epoch seconds; `None` when out of chrono's range.
fn format_time(ts: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(ts, 0).map(|dt| dt.to_rfc3339())
}
