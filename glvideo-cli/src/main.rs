//! GLVideo CLI Tool
//!
//! Headless host for GLVideo sessions: probes media sources and drives a
//! fixed-rate render loop that fetches decoded frames.

mod texture_store;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glvideo_core::{resolve_source, SessionFactory};
use glvideo_decoder::{DecoderConfig, FfmpegBackend};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use texture_store::ImageTextureStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glvideo")]
#[command(about = "GLVideo - hardware-decoded video playback for render loops")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a media source
    Info {
        /// File name or URI
        source: String,

        /// Directory searched before the current directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a media source through a headless render loop
    Play {
        /// File name or URI
        source: String,

        /// Directory searched before the current directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Restart at the end instead of stopping
        #[arg(long = "loop")]
        looping: bool,

        /// Playback rate (1.0 is real time)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Start position in seconds
        #[arg(long)]
        seek: Option<f64>,

        /// Stop after this many fetched frames
        #[arg(long)]
        frames: Option<u64>,

        /// Render loop frequency
        #[arg(long, default_value = "60")]
        tick_hz: f64,

        /// Output directory for fetched frames
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of decode threads (default: all cores)
        #[arg(long)]
        threads: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Info {
            source,
            data_dir,
            json,
        } => show_info(source, data_dir, json)?,

        Commands::Play {
            source,
            data_dir,
            looping,
            speed,
            seek,
            frames,
            tick_hz,
            output,
            threads,
        } => {
            let mut config = DecoderConfig::default();
            if let Some(threads) = threads {
                config.decode_threads = threads;
            }
            let options = PlayOptions {
                looping,
                speed,
                seek,
                frames,
                tick_hz,
                output,
            };
            play_video(source, data_dir, config, options)?
        }
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("Invalid log level")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn show_info(source: String, data_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let descriptor = resolve_source(&source, data_dir.as_deref());
    let factory = SessionFactory::new(FfmpegBackend::new(ImageTextureStore::new()));
    let mut session = factory
        .open(&descriptor)
        .with_context(|| format!("Failed to open {descriptor}"))?;

    let media = session.media_info();
    if json {
        let report = serde_json::json!({
            "descriptor": descriptor,
            "media": media,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Media Information ===");
        println!("Source: {}", descriptor);
        println!("Resolution: {}x{}", media.width, media.height);
        println!("Frame rate: {:.3} fps", media.frame_rate_hz);
        if media.duration_seconds > 0.0 {
            println!("Duration: {:.3} seconds", media.duration_seconds);
        } else {
            println!("Duration: unknown (live source)");
        }
    }

    session.close();
    Ok(())
}

struct PlayOptions {
    looping: bool,
    speed: f64,
    seek: Option<f64>,
    frames: Option<u64>,
    tick_hz: f64,
    output: Option<PathBuf>,
}

fn play_video(
    source: String,
    data_dir: Option<PathBuf>,
    config: DecoderConfig,
    options: PlayOptions,
) -> Result<()> {
    let descriptor = resolve_source(&source, data_dir.as_deref());
    let store = ImageTextureStore::new();
    let factory = SessionFactory::new(FfmpegBackend::with_config(store.clone(), config));
    let mut session = factory
        .open(&descriptor)
        .with_context(|| format!("Failed to open {descriptor}"))?;

    info!(
        descriptor = %descriptor,
        width = session.width(),
        height = session.height(),
        duration = session.duration_seconds(),
        "playing"
    );

    if let Some(output_dir) = &options.output {
        std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;
    }

    // Rejections are logged by the session; playback continues regardless
    if let Some(position) = options.seek {
        let _ = session.seek(position);
    }
    let _ = session.set_rate(options.speed);
    if options.looping {
        session.loop_playback();
    } else {
        session.play();
    }

    let tick = Duration::from_secs_f64(1.0 / options.tick_hz.max(1.0));
    let started = Instant::now();
    let mut fetched: u64 = 0;

    loop {
        if let Some(texture) = session.poll_frame() {
            if let Some(output_dir) = &options.output {
                let path = output_dir.join(format!("frame_{:06}.png", fetched));
                store.save(texture, &path)?;
            }
            fetched += 1;

            if fetched % 30 == 0 {
                info!(
                    fetched,
                    position = session.position_seconds(),
                    size = ?store.dimensions(texture),
                    "render loop progress"
                );
            }
            if options.frames.is_some_and(|limit| fetched >= limit) {
                break;
            }
        } else if !session.is_playing() && !session.has_new_frame() {
            break;
        }

        thread::sleep(tick);
    }

    let position = session.position_seconds();
    session.close();

    let elapsed = started.elapsed().as_secs_f64();
    println!(
        "Fetched {} frames in {:.2}s ({:.1} fps), stopped at {:.3}s",
        fetched,
        elapsed,
        if elapsed > 0.0 { fetched as f64 / elapsed } else { 0.0 },
        position
    );
    if let Some(output_dir) = &options.output {
        println!("Saved frames to {}", output_dir.display());
    }

    Ok(())
}
