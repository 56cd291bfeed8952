use anyhow::Context;
use clap::Parser;
use mock_feed::{sample_entries, MockFeed, ParameterStore};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:8765";

#[derive(Parser, Debug)]
#[command(name = "mock_feed")]
struct Args {
    /// Listen address; falls back to MOCK_FEED_ADDR.
    #[arg(long)]
    addr: Option<String>,

    /// Write the bound address here (useful with port 0).
    #[arg(long, value_name = "PATH")]
    addr_file: Option<PathBuf>,

    /// Seed the store from a `{ "parameters": [..] }` file instead of the
    /// built-in camera nodes.
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    #[arg(long)]
    run_for_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let addr = args
        .addr
        .clone()
        .or_else(|| std::env::var("MOCK_FEED_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let store = match &args.dump {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read dump {}", path.display()))?;
            ParameterStore::from_json(&raw)?
        }
        None => ParameterStore::new(sample_entries()),
    };

    let feed = MockFeed::spawn(&addr, store)?;
    if let Some(path) = &args.addr_file {
        std::fs::write(path, feed.listen_addr().to_string())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    println!("mock_feed listening on {}", feed.url());

    let run_for = args.run_for_ms.map(Duration::from_millis);
    let start = Instant::now();
    loop {
        while let Ok(update) = feed.updates().try_recv() {
            tracing::info!(name = %update.name, value = update.value, "set");
        }
        thread::sleep(Duration::from_millis(33));
        if let Some(max) = run_for {
            if start.elapsed() >= max {
                break;
            }
        }
    }

    feed.shutdown();
    Ok(())
}
