//! # page-builder
//!
//! Command-line access to stored pages: list widgets, normalize markup,
//! fetch and publish page bodies through the Pages API.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use builder_core::WidgetRegistry;
use builder_sync::commands;
use builder_sync::{BridgeConfig, CliArgs, Command, PagesClient};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,builder_sync=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,builder_sync=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

fn client(config: &BridgeConfig) -> anyhow::Result<PagesClient> {
    PagesClient::with_retry_config(&config.api_url, config.shop.clone(), config.retry.clone())
        .with_context(|| format!("cannot use Pages API at {}", config.api_url))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = BridgeConfig::from(&args);
    let registry = Arc::new(WidgetRegistry::with_builtins());
    tracing::debug!(api_url = %config.api_url, widgets = registry.len(), "page-builder starting");

    match &args.command {
        Command::Widgets => print!("{}", commands::widgets(&registry)),
        Command::Normalize { file } => println!("{}", commands::normalize(file, &registry).await?),
        Command::Fetch { page, json } => {
            let api = client(&config)?;
            println!("{}", commands::fetch(&api, page, *json, &registry).await?);
        }
        Command::Push { page, file } => {
            let api = client(&config)?;
            let bytes = commands::push(&api, page, file, &registry).await?;
            tracing::info!(page_id = %page, bytes, "page published");
        }
    }

    Ok(())
}
