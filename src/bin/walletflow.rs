//! Wallet Flow Snapshot - fetch a wallet's transfers and print the laid-out flow graph
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin walletflow -- --wallet 0xabc... --start 2024-01-01 --end 2024-02-01
//! cargo run --release --bin walletflow -- --wallet 0xabc... --input payload.json --output graph.json
//! ```
//!
//! ## Arguments
//!
//! - `--wallet <address>` - central wallet (required)
//! - `--start <date>` / `--end <date>` - fetch range, `YYYY-MM-DD[ HH:MM:SS]` (required without `--input`)
//! - `--input <path>` - read a saved payload instead of calling the explorer
//! - `--output <path>` - write the snapshot to a file instead of stdout
//!
//! ## Environment Variables
//!
//! - EXPLORER_API_KEY - Block explorer API key (required without `--input`)
//! - NETWORK - ethereum | bsc (default: ethereum)
//! - ETH_PRICE - Native token price in dollars (default: 3000)
//! - DOLLAR_THRESHOLD - Minimum dollar value for links and nodes (default: 0)
//! - CANVAS_WIDTH / CANVAS_HEIGHT - Layout surface (default: 960 / 720)
//! - LAYOUT_RADIUS - Circle radius for non-central addresses (default: min side / 3)
//! - RUST_LOG - Logging level (optional, default: info)

use std::env;
use std::fs;
use std::path::PathBuf;
use walletflow::{
    load_payload_file, AppState, DataFetchError, ExplorerClient, FetchQuery, FlowConfig,
    TransactionSource,
};

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|x| x == flag)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

#[derive(Debug)]
struct CliArgs {
    wallet: String,
    start: Option<String>,
    end: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self, Box<dyn std::error::Error>> {
        let args: Vec<String> = env::args().collect();

        let wallet = arg_value(&args, "--wallet").ok_or("--wallet <address> is required")?;
        let input = arg_value(&args, "--input").map(PathBuf::from);
        let start = arg_value(&args, "--start");
        let end = arg_value(&args, "--end");

        if input.is_none() && (start.is_none() || end.is_none()) {
            return Err("--start and --end are required unless --input is given".into());
        }

        Ok(Self {
            wallet,
            start,
            end,
            input,
            output: arg_value(&args, "--output").map(PathBuf::from),
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let config = FlowConfig::from_env()?;
    let args = CliArgs::parse()?;

    log::info!("🚀 Starting Wallet Flow");
    log::info!("   Wallet: {}", args.wallet);
    log::info!("   Network: {}", config.network.as_str());
    log::info!(
        "   {} price: ${}",
        config.network.native_symbol(),
        config.eth_price
    );
    log::info!("   Dollar threshold: {}", config.dollar_threshold);
    log::info!(
        "   Canvas: {}x{} (radius {})",
        config.canvas_width,
        config.canvas_height,
        config.layout_radius
    );

    let result: Result<_, DataFetchError> = match &args.input {
        Some(path) => load_payload_file(path),
        None => {
            let client = ExplorerClient::new(config.network, config.api_key.clone())?;
            let query = FetchQuery {
                address: args.wallet.clone(),
                start_date: args.start.clone().unwrap_or_default(),
                end_date: args.end.clone().unwrap_or_default(),
            };
            log::info!("📡 Fetching from {}", client.source_name());
            client.fetch_period(&query).await
        }
    };

    let mut state = AppState::new(&config);
    state.apply_fetch(&args.wallet, result)?;

    let graph = state.graph();
    log::info!(
        "📊 {} transfers, {} nodes, {} links",
        state.timeline().len(),
        graph.nodes.len(),
        graph.links.len()
    );

    let json = serde_json::to_string_pretty(&state.snapshot())?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            log::info!("✅ Snapshot written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
