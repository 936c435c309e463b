use anyhow::Context;
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use sumo_forwarder::pipeline::chunk_from_values;
use sumo_forwarder::{Config, Sink, SumoSink};
use tracing_subscriber::EnvFilter;

/// Reads newline-delimited JSON records from stdin and delivers them to a
/// Sumo Logic HTTP source as one chunk. Buffering and flush scheduling are
/// left to whatever invokes this binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(long, env = "SUMO_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// HTTP source endpoint URL (overrides the config file)
    #[arg(long, env = "SUMO_ENDPOINT")]
    endpoint: Option<String>,

    /// Tag attached to the chunk, split by the configured delimiter
    #[arg(long, env = "SUMO_TAG", default_value = "sumo.forwarder")]
    tag: String,

    /// Log filter, e.g. "info" or "sumo_forwarder=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_filter))
        .init();

    let mut config = match &args.config_file {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let mut sink = SumoSink::new(config).context("Invalid configuration")?;
    sink.start();

    let now = chrono::Utc::now().timestamp();
    let mut values = Vec::new();
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON record: {line}"))?;
        values.push(value);
    }

    let chunk = chunk_from_values(&args.tag, now, values);
    let result = sink.write(&chunk).await;
    sink.shutdown();
    result.context("Chunk delivery failed")
}
