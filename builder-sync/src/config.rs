//! Command-line arguments and bridge configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::autosave::DEFAULT_DEBOUNCE;
use crate::pages::RetryConfig;

/// Default Pages API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Command-line arguments for page-builder.
#[derive(Debug, Clone, Parser)]
#[command(name = "page-builder")]
#[command(about = "Inspect, normalize and publish page-builder pages")]
#[command(version)]
pub struct CliArgs {
    /// Pages API base URL (e.g., <http://localhost:3000/api>)
    #[arg(long, env = "PAGES_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Shop domain the pages belong to
    #[arg(long, env = "SHOPIFY_SHOP", default_value = "", global = true)]
    pub shop: String,

    /// Total attempts per Pages API request
    #[arg(long, default_value = "3", global = true)]
    pub retries: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, default_value = "500", global = true)]
    pub backoff_ms: u64,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// page-builder subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List registered widgets by category
    Widgets,
    /// Read a local HTML file and print it in canonical form
    Normalize {
        /// HTML file to read
        file: PathBuf,
    },
    /// Load a page and print its markup
    Fetch {
        /// Page ID
        #[arg(long)]
        page: String,
        /// Print the element tree as JSON instead of markup
        #[arg(long)]
        json: bool,
    },
    /// Normalize a local HTML file and save it as a page body
    Push {
        /// Page ID
        #[arg(long)]
        page: String,
        /// HTML file to publish
        file: PathBuf,
    },
}

/// Persistence bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Pages API base URL.
    pub api_url: String,
    /// Shop domain.
    pub shop: String,
    /// Retry policy for API calls.
    pub retry: RetryConfig,
    /// Auto-save quiet period.
    pub debounce: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            shop: String::new(),
            retry: RetryConfig::default(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl From<&CliArgs> for BridgeConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            api_url: args.api_url.clone(),
            shop: args.shop.clone(),
            retry: RetryConfig::new(args.retries, Duration::from_millis(args.backoff_ms)),
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}
