use anyhow::Context;
use chrono::{TimeDelta, Utc};
use clap::{Parser, ValueEnum};
use logmunch::RunOptions;
use logmunch_core::config::Config;
use logmunch_core::duration::parse_duration;
use logmunch_core::{Query, QueryGroup};
use logmunch_drains::Drain;
use logmunch_sources::SourceLoader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logmunch", about = "Normalise log lines and stream them through filters")]
struct Cli {
    /// Log source locator, e.g. `file:app.log` or `logentries:Production/api`.
    #[arg(long)]
    source: Option<String>,

    /// Only fetch lines with this prefix (applied by the source).
    #[arg(long, default_value = "")]
    filter: String,

    /// When to start fetching, relative to now.
    #[arg(long, allow_hyphen_values = true, value_parser = duration)]
    start: Option<TimeDelta>,

    /// When to stop fetching, relative to now.
    #[arg(long, allow_hyphen_values = true, value_parser = duration)]
    end: Option<TimeDelta>,

    /// How many lines to fetch.
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long, value_enum, default_value_t = Output::Standard)]
    output: Output,

    /// Key to pivot on for `count` and `gnuplot` output.
    #[arg(long, required_if_eq_any = [("output", "count"), ("output", "gnuplot")])]
    key: Option<String>,

    /// Output as lines of JSON. Same as `--output json`.
    #[arg(long)]
    json_output: bool,

    /// Round timestamps to the nearest multiple, e.g. `1h10m`.
    #[arg(long, value_parser = duration)]
    round_time: Option<TimeDelta>,

    /// Bucketize these keys (comma separated).
    #[arg(long, value_delimiter = ',')]
    bucketize: Vec<String>,

    /// Keep only these keys (comma separated).
    #[arg(long, value_delimiter = ',')]
    pick: Vec<String>,

    /// Join keys into a new one: `NEW=A,B`.
    #[arg(long, value_parser = assignment)]
    compound: Vec<(String, Vec<String>)>,

    /// Normalise URL paths in a key: `KEY=/users/:id,/orders/:id`.
    #[arg(long = "normalize-path", value_parser = assignment)]
    normalize_path: Vec<(String, Vec<String>)>,

    /// Move Heroku drain IDs out of the name into `drainId`.
    #[arg(long)]
    strip_drain_id: bool,

    /// Keep records for which this expression is true, e.g. `status >= 500`.
    #[arg(long)]
    script: Option<String>,

    /// Group keys into a new one: `NAME=A,B` gives `NAME=a×b`.
    #[arg(long, value_parser = assignment)]
    group: Vec<(String, Vec<String>)>,

    /// Config file to use instead of ~/.config/logmunch/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log pipeline diagnostics to stderr.
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Standard,
    Json,
    Count,
    Gnuplot,
    Sqlite,
}

fn duration(text: &str) -> Result<TimeDelta, String> {
    parse_duration(text).map_err(|e| e.to_string())
}

fn assignment(text: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) = text
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=A,B, got `{text}`"))?;
    if name.is_empty() || values.is_empty() {
        return Err(format!("expected NAME=A,B, got `{text}`"));
    }
    Ok((
        name.to_string(),
        values.split(',').map(str::to_string).collect(),
    ))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("loading config")?;

    let mut loader = SourceLoader::from_config(&config)?;
    let mut legacy = vec![PathBuf::from(".logmunch")];
    if let Some(home) = std::env::var_os("HOME") {
        legacy.push(PathBuf::from(home).join(".logmunch"));
    }
    loader.load_files(&legacy)?;

    let start = match cli.start {
        Some(start) => start,
        None => config.query.start_offset()?,
    };
    let end = match cli.end {
        Some(end) => end,
        None => config.query.end_offset()?,
    };

    let now = Utc::now();
    let mut query = Query::new(now + start, now + end).with_filter(cli.filter);
    query.limit = cli.limit.or(config.query.limit);
    query.group_by = cli
        .group
        .into_iter()
        .map(|(name, keys)| QueryGroup::new(name, keys))
        .collect();

    let output = if cli.json_output { Output::Json } else { cli.output };
    let key = cli.key.unwrap_or_default();
    let drain = match output {
        Output::Standard => Drain::Standard,
        Output::Json => Drain::Json,
        Output::Count => Drain::CountOverTime { key },
        Output::Gnuplot => Drain::Gnuplot { key },
        Output::Sqlite => Drain::Sqlite,
    };

    let mut options = RunOptions::new(cli.source.unwrap_or(config.query.source), query);
    options.drain = drain;
    options.queue_capacity = config.pipeline.queue_capacity;
    options.strip_drain_id = cli.strip_drain_id;
    options.normalize_paths = cli.normalize_path;
    options.compounds = cli.compound;
    options.script = cli.script;
    options.pick = cli.pick;
    options.round_time = cli.round_time;
    options.bucketize = cli.bucketize;

    logmunch::run(&loader, options, tokio::io::stdout()).await?;
    Ok(())
}
