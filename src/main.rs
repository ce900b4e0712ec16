use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::{json, Value};
use std::path::PathBuf;

use yt_music_bridge::{AppConfig, MethodError, MusicBridge, StreamKind};

#[derive(Parser)]
#[command(name = "yt-music-bridge", version, about = "Query YouTube Music and KuGou through the bridge's method and event channels")]
struct Cli {
    /// Proxy URL (http, https, socks5)
    #[arg(long, global = true)]
    proxy: Option<String>,

    /// Two-letter country code
    #[arg(long, global = true)]
    country: Option<String>,

    /// Config file to read instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Invoke one method and print its response
    Call {
        /// e.g. searchMusic, getRelatedSongs, getLyrics
        method: String,
        /// Arguments as a JSON object
        args: Option<String>,
    },
    /// Listen on an event channel and print one JSON line per event
    Stream {
        /// search, related or artist
        channel: String,
        /// Arguments as a JSON object
        args: Option<String>,
    },
}

fn parse_args(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        None => Ok(json!({})),
        Some(raw) => serde_json::from_str(raw).with_context(|| format!("Invalid JSON arguments: {}", raw)),
    }
}

fn report(error: MethodError) -> anyhow::Error {
    println!("{}", json!({ "code": error.code, "message": error.message, "details": error.details }));
    anyhow!("{}", error)
}

async fn initialize(bridge: &MusicBridge, cli: &Cli) -> anyhow::Result<()> {
    let mut args = json!({});
    if let Some(proxy) = &cli.proxy {
        args["proxy"] = json!(proxy);
    }
    if let Some(country) = &cli.country {
        args["country"] = json!(country);
    }
    bridge.invoke("initialize", args).await.map_err(report)?;
    Ok(())
}

async fn call(bridge: &MusicBridge, cli: &Cli, method: &str, args: Value) -> anyhow::Result<()> {
    if method != "initialize" {
        initialize(bridge, cli).await?;
    }
    let response = bridge.invoke(method, args).await.map_err(report)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn stream(bridge: &MusicBridge, cli: &Cli, channel: &str, args: Value) -> anyhow::Result<()> {
    let kind = StreamKind::parse(channel).ok_or_else(|| anyhow!("Unknown stream channel: {}", channel))?;
    initialize(bridge, cli).await?;

    let mut subscription = bridge
        .listen(kind, args)
        .await
        .ok_or_else(|| anyhow!("Channel {} is not registered", kind.channel_name()))?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Interrupted, cancelling {}", kind.channel_name());
                subscription.cancel();
                break;
            }
            event = subscription.recv() => match event {
                Some(event) => println!("{}", event.to_json()),
                None => break,
            },
        }
    }

    let state = subscription.finished().await;
    info!("{} finished in state {:?}", kind.channel_name(), state);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => match AppConfig::load() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                config
            }
            Err(e) => {
                log::error!("Failed to load configuration: {}", e);
                AppConfig::default()
            }
        },
    };

    let bridge = MusicBridge::new(config)?;

    let outcome = match &cli.command {
        Command::Call { method, args } => {
            let args = parse_args(args.as_deref())?;
            call(&bridge, &cli, method, args).await
        }
        Command::Stream { channel, args } => {
            let args = parse_args(args.as_deref())?;
            stream(&bridge, &cli, channel, args).await
        }
    };

    if let Err(e) = bridge.invoke("dispose", json!({})).await {
        log::warn!("⚠️ Cleanup failed: {}", e);
    }
    outcome
}
