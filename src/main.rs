//! fetch-mock CLI
//!
//! Loads a TOML route file into a mock fetch engine and exercises it.
//!
//! # Architecture Overview
//!
//! ```text
//!   routes.toml ──▶ config::loader ──▶ FetchMock ──▶ RouteRegistry
//!                                          │
//!   resolve <url> ──▶ normalize_request ──▶│──▶ first matching route ──▶ JSON response
//!                                          │──▶ fallback response
//!                                          └──▶ NetworkFetch (--spy)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use fetch_mock::config::loader::{load_config, register_routes};
use fetch_mock::interception::{CallFilter, FetchMock, MockConfig, NetworkFetch};
use fetch_mock::observability::init_logging;
use fetch_mock::RequestOptions;

#[derive(Parser)]
#[command(name = "fetch-mock")]
#[command(about = "Resolve HTTP calls against a file of mocked routes", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a route file and register every route
    Check {
        file: PathBuf,
    },
    /// Answer one simulated call and print the response as JSON
    Resolve {
        file: PathBuf,

        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as 'name: value' (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        #[arg(short, long)]
        body: Option<String>,

        /// Send unmatched calls to the real network
        #[arg(long)]
        spy: bool,

        /// Network timeout for --spy, in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("invalid header {:?}, expected 'name: value'", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Check { file } => {
            let routes = load_config(&file)?;
            let mock = FetchMock::new(MockConfig::from(&routes.settings));
            register_routes(&mock, &routes)?;

            println!("{}: {} route(s) registered", file.display(), mock.route_count());
            for identifier in mock.route_identifiers() {
                println!("  {}", identifier);
            }
        }
        Commands::Resolve {
            file,
            url,
            method,
            headers,
            body,
            spy,
            timeout_secs,
        } => {
            let routes = load_config(&file)?;
            let mut mock = FetchMock::new(MockConfig::from(&routes.settings));
            if spy {
                let network = NetworkFetch::new(Duration::from_secs(timeout_secs))?;
                mock = mock.with_native_fetch(Arc::new(network));
            }
            register_routes(&mock, &routes)?;
            if spy {
                mock.spy()?;
            }

            let mut options = RequestOptions::new().with_method(method);
            for raw in &headers {
                let (name, value) = parse_header(raw)?;
                options = options.with_header(name, value);
            }
            if let Some(body) = body {
                options = options.with_body(body);
            }

            let response = mock.fetch(url.as_str(), options).await?;
            if let Some(call) = mock.last_call(CallFilter::All) {
                tracing::info!(
                    url = %call.url,
                    route = call.route.as_deref().unwrap_or("<fallback>"),
                    "Call resolved"
                );
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
