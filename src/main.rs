use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};

use love_booth::{
    audio::{CuePlayer, LogCues},
    catalog::Catalog,
    config::Config,
    media::{MediaSource, StillSource},
    session::RelayStatus,
    stickers::StickerStyle,
    BoothEngine, BoothEvent, EffectRegistry,
};

#[derive(Parser)]
#[command(
    name = "love-booth",
    version,
    about = "Countdown photobooth that turns a burst of selfies into a decorated photo strip",
    long_about = "Love Booth counts down, captures a set of photos, decorates them with frames, backgrounds and stickers, and exports a single photo strip to disk, a share folder or a remote relay."
)]
struct Cli {
    /// Frame source: `camera`, `pattern`, or a path to a still image
    #[arg(short, long, default_value = "pattern")]
    source: String,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Option catalog file (optional, built-in catalog otherwise)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Frame id
    #[arg(short, long)]
    frame: Option<String>,

    /// Background id
    #[arg(short, long)]
    background: Option<String>,

    /// Sticker id (repeatable)
    #[arg(long = "sticker")]
    stickers: Vec<String>,

    /// Sticker layout (single, burst, chaos, border, corners)
    #[arg(long, default_value = "single")]
    sticker_style: String,

    /// Photo effect id
    #[arg(short, long, default_value = "none")]
    effect: String,

    /// Directory for the saved strip (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also hand the strip to the share destination
    #[arg(long)]
    share: bool,

    /// Relay the strip to the configured endpoint
    #[arg(long)]
    relay: bool,

    /// List frames, backgrounds, stickers and effects, then exit
    #[arg(long)]
    list: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Love Booth v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    if let Some(output) = &cli.output {
        config.export.output_dir = output.clone();
    }
    config.validate()?;

    let catalog = match &cli.catalog {
        Some(path) => Catalog::from_file(path)?.with_sticker_patterns(),
        None => Catalog::builtin(),
    };

    if cli.list {
        print_options(&catalog);
        return Ok(());
    }

    let style: StickerStyle = cli.sticker_style.parse().map_err(anyhow::Error::msg)?;
    let (mut booth, mut events) = BoothEngine::new(&config, catalog, open_source(&cli.source, &config)?, cue_player());

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BoothEvent::Countdown(Some(n)) if n > 0 => info!("⏳ {}", n),
                BoothEvent::PhotoCaptured { current, target } => info!("📸 {}/{}", current, target),
                BoothEvent::CaptureSkipped => warn!("No frame available, capture skipped"),
                BoothEvent::Relay(RelayStatus::Error(reason)) => warn!("Relay: {}", reason),
                _ => {}
            }
        }
    });

    booth.preload_assets().await;
    booth.select_frame(cli.frame.as_deref()).await?;
    booth.select_background(cli.background.as_deref()).await?;
    for sticker in &cli.stickers {
        booth.toggle_sticker(sticker).await?;
    }
    booth.set_sticker_style(style);
    booth.set_effect(&cli.effect)?;

    let captured = booth.shoot().await?;
    if captured == 0 {
        anyhow::bail!("No photos were captured");
    }

    let saved = booth.save().await.context("Failed to save strip")?;
    info!("Strip saved to: {:?}", saved);

    if cli.share {
        booth.share().await.context("Failed to share strip")?;
    }

    if booth.await_auto_relay().await.is_some() {
        info!("Automatic relay: {}", booth.session().relay_status());
    }

    if cli.relay {
        match booth.relay().await {
            Ok(_) => info!("Strip relayed"),
            Err(e) => warn!("{}", e.user_message()),
        }
    }

    Ok(())
}

fn open_source(source: &str, config: &Config) -> Result<Box<dyn MediaSource>> {
    match source {
        "pattern" => Ok(Box::new(StillSource::test_pattern())),
        "camera" => open_camera(config),
        path => Ok(Box::new(StillSource::from_image(path))),
    }
}

#[cfg(feature = "camera")]
fn open_camera(config: &Config) -> Result<Box<dyn MediaSource>> {
    Ok(Box::new(love_booth::media::CameraSource::new(config.camera.device_index)))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &Config) -> Result<Box<dyn MediaSource>> {
    anyhow::bail!("Camera support not compiled in; rebuild with --features camera")
}

#[cfg(feature = "sound")]
fn cue_player() -> Box<dyn CuePlayer> {
    match love_booth::audio::ToneCues::new() {
        Ok(player) => Box::new(player),
        Err(e) => {
            warn!("Sound disabled: {}", e);
            Box::new(LogCues::new())
        }
    }
}

#[cfg(not(feature = "sound"))]
fn cue_player() -> Box<dyn CuePlayer> {
    Box::new(LogCues::new())
}

fn print_options(catalog: &Catalog) {
    println!("Frames:");
    for frame in &catalog.frames {
        println!("  {:<20} {}", frame.id, frame.name);
    }
    println!("Backgrounds:");
    for background in &catalog.backgrounds {
        println!("  {:<20} {}", background.id, background.name);
    }
    println!("Stickers:");
    for sticker in &catalog.stickers {
        println!("  {:<20} {}", sticker.id, sticker.name);
    }
    println!("Sticker styles:");
    for style in StickerStyle::ALL {
        println!("  {:<20} {}", style.name(), style.description());
    }
    let effects = EffectRegistry::new();
    println!("Effects:");
    for id in effects.available() {
        println!("  {:<20} {}", id, effects.display_name(id));
    }
}
