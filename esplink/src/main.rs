//! esplink — entry point.
//!
//! ```text
//! esplink --port /dev/ttyUSB0       Connect with defaults
//! esplink --config <path>           Use custom config TOML
//! esplink --gen-config              Dump default config and exit
//! esplink --write-config            Write default config to --config and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use esplink_core::{ChannelRouter, CompressedAsset, LinkError, RawImage, preview};

use esplink::command::{Command, HELP};
use esplink::config::AppConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "esplink", about = "Chat and image transfer with an ESP8266 over serial")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "esplink.toml")]
    config: PathBuf,

    /// Serial port (overrides config). Example: /dev/ttyUSB0 or COM3
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides config).
    #[arg(short, long)]
    baud: Option<u32>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the --config path and exit.
    #[arg(long)]
    write_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&AppConfig::default())?;
        println!("{text}");
        return Ok(());
    }
    if cli.write_config {
        AppConfig::write_default(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    let read = AppConfig::read(&cli.config);

    // Init tracing before resolving the config so a bad file is reported.
    // Logs go to stderr so they do not mix with the chat.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(AppConfig::initial_log_level(&read)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::resolve(read, &cli.config);
    if let Some(port) = cli.port {
        config.serial.port = port;
    }
    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }

    config.validate()?;
    info!("esplink v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Open the link ────────────────────────────────────────

    let (mut router, mut events) = ChannelRouter::new(config.link_config(), config.compression);
    router.connect()?;
    println!("Connected to {}", config.serial.port);
    println!("{HELP}");

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{event}");
        }
    });

    // ── 2. Input loop ───────────────────────────────────────────

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut current: Option<CompressedAsset> = None;

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Text(text) => report(router.send_text(&text).await),
            Command::Image(path) => {
                let raw = match RawImage::load(&path) {
                    Ok(raw) => raw,
                    Err(e) => {
                        println!("Image error: {e}");
                        continue;
                    }
                };
                let thumb = preview(&raw, config.preview.max_side);
                println!(
                    "Selected {} ({}x{}, preview {}x{})",
                    path.display(),
                    raw.width(),
                    raw.height(),
                    thumb.width(),
                    thumb.height()
                );
                // On failure the previous asset stays available.
                if let Ok(asset) = router.compress(Arc::new(raw)).await {
                    current = Some(asset);
                }
            }
            Command::Send => report(router.send_image(current.as_ref()).await),
            Command::Status => {
                let ready = current
                    .as_ref()
                    .map(|a| format!("{} bytes ready ({})", a.len(), a.fingerprint()))
                    .unwrap_or_else(|| "no image".into());
                println!("Link: {} | Image: {ready}", router.phase());
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Invalid(message) => println!("{message}"),
        }
    }

    // ── 3. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    router.disconnect().await;
    drop(router);
    if let Err(e) = printer.await {
        warn!("event printer ended abnormally: {e}");
    }

    Ok(())
}

fn report(result: Result<(), LinkError>) {
    match result {
        Ok(()) => {}
        // Link I/O failures are already reported as events.
        Err(e) if e.is_link_io() => {}
        Err(e) => println!("Send error: {e}"),
    }
}
