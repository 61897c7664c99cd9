mod app;
mod cache;
mod catalog;
mod commands;
mod config;
mod event;
mod logging;
mod route;
mod sync;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cosview")]
#[command(about = "A terminal browser for a cosplay video catalog")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/cosview/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Catalog API base URL (overrides config and COSVIEW_API_URL)
  #[arg(short, long)]
  api_url: Option<String>,

  /// Address to open first, e.g. "videos?ordering=title" or "videos/12"
  location: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let config = config::Config::load(args.config.as_deref())?
    .with_api_url(args.api_url.or_else(config::Config::api_url_from_env));

  let log_dir = config.log_dir.clone().unwrap_or_else(logging::default_dir);
  let _guard = logging::init(&log_dir)?;
  info!(api = %config.api.base_url, web = %config.web_url, "cosview starting");

  let mut app = app::App::new(&config, args.location.as_deref())?;
  app.run().await?;

  info!("cosview exiting");
  Ok(())
}
