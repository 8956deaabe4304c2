mod config;
mod controller;
mod fetcher;
mod model;
mod parser;
mod view;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::controller::{probe_for_endpoint, NewsListController, ViewEvent};
use crate::fetcher::NewsFetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tech_news=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("news.toml")?;
    info!("Fetching from {}", config.endpoint);

    let fetcher = Arc::new(NewsFetcher::new(&config)?);
    let probe = probe_for_endpoint(&config.endpoint);

    // The preferences side of the options subscription. This binary has no
    // settings screen, so the sender only carries the configured defaults.
    let (_options_tx, options_rx) = watch::channel(config.options());

    let (news_controller, handle, mut events) =
        NewsListController::new(fetcher, probe, options_rx);
    tokio::spawn(news_controller.run());

    handle.activate();

    // Drive the terminal view from controller events. A non-empty list or a
    // status text is the terminal outcome of the one activation cycle.
    while let Some(event) = events.recv().await {
        match event {
            ViewEvent::RenderList(items) if !items.is_empty() => {
                println!("{}", view::render_list(&items));
                break;
            }
            ViewEvent::StatusText(Some(text)) => {
                println!("{}", text);
                break;
            }
            ViewEvent::OpenUrl(url) => println!("open: {}", url),
            _ => {}
        }
    }

    Ok(())
}
