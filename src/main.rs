// PULSEFRAME Main Entry Point

use pulseframe::audio::{beat, decode};
use pulseframe::media::{self, ffmpeg::RenderOptions};
use pulseframe::render::{remix, slideshow};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pulseframe")]
#[command(about = "Beat-synced music visualizer video generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recolor a video with the cyclic colorwave blend, synced to an audio track
    Remix {
        /// Input video path
        #[arg(short, long)]
        input: PathBuf,

        /// Audio track to lay under the video
        #[arg(short, long)]
        audio: PathBuf,

        /// Output path (defaults to <input>_remix.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds per full color cycle
        #[arg(long, default_value_t = 12.0)]
        cycle: f64,

        /// Output height in pixels (aspect ratio preserved)
        #[arg(long, default_value_t = 720)]
        height: u32,

        /// Fade-out length in seconds after the audio ends
        #[arg(long, default_value_t = 5.0)]
        fade: f64,

        /// Override the source frame rate
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Build a beat-driven slideshow video from a folder of images
    Slideshow {
        /// Audio track to analyze and lay under the video
        #[arg(short, long)]
        audio: PathBuf,

        /// Folder of .jpg/.png images
        #[arg(short, long)]
        images: PathBuf,

        /// Output path (defaults to <audio>_slideshow.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output frame rate
        #[arg(long, default_value_t = 24.0)]
        fps: f64,

        /// Output resolution as WIDTHxHEIGHT
        #[arg(long, default_value = "640x640")]
        size: String,

        /// Seed for all randomized effects
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Directional fade-in length in seconds
        #[arg(long, default_value_t = 2.0)]
        fade: f64,
    },

    /// Analyze an audio track and print tempo/beat information
    Analyze {
        /// Audio file to analyze
        #[arg(short, long)]
        audio: PathBuf,

        /// Emit the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Combine a video with an external audio track (no effects)
    Combine {
        /// Input video path
        #[arg(short, long)]
        input: PathBuf,

        /// Input audio path
        #[arg(short, long)]
        audio: PathBuf,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Derive `<stem>_<suffix>.mp4` next to the source file.
fn default_output(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    source.with_file_name(format!("{}_{}.mp4", stem, suffix))
}

/// Parse a `WIDTHxHEIGHT` resolution string.
fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let (w, h) = raw
        .split_once('x')
        .with_context(|| format!("Invalid size '{}', expected WIDTHxHEIGHT", raw))?;
    let w: u32 = w.parse().context("Invalid width")?;
    let h: u32 = h.parse().context("Invalid height")?;
    if w == 0 || h == 0 {
        bail!("Size must be non-zero");
    }
    Ok((w, h))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,symphonia=error");
    }
    tracing_subscriber::fmt::init();

    let missing = media::health::check_dependencies();
    if !missing.is_empty() {
        warn!("[HEALTH] ⚠️ Missing external tools: {:?}. Rendering will fail without them.", missing);
    }

    let args = Cli::parse();

    match args.command {
        Commands::Remix {
            input,
            audio,
            output,
            cycle,
            height,
            fade,
            fps,
        } => {
            let out_path = output.unwrap_or_else(|| default_output(&input, "remix"));
            let opts = remix::RemixOptions {
                cycle_secs: cycle,
                height,
                fade_secs: fade,
                fps,
                render: RenderOptions::default(),
            };
            let summary = remix::render(&input, &audio, &out_path, opts).await?;
            println!(
                "🎬 Remix saved: {:?} ({:.2} MB, {:.2}s)",
                summary.output_path, summary.size_mb, summary.duration
            );
        }
        Commands::Slideshow {
            audio,
            images,
            output,
            fps,
            size,
            seed,
            fade,
        } => {
            let out_path = output.unwrap_or_else(|| default_output(&audio, "slideshow"));
            let opts = slideshow::SlideshowOptions {
                fps,
                size: parse_size(&size)?,
                seed,
                fade_secs: fade,
                render: RenderOptions::default(),
            };
            let summary = slideshow::render(&audio, &images, &out_path, opts).await?;
            println!(
                "🎬 Slideshow saved: {:?} ({:.2} MB, {:.2}s)",
                summary.output_path, summary.size_mb, summary.duration
            );
        }
        Commands::Analyze { audio, json } => {
            let analysis = tokio::task::spawn_blocking(move || -> Result<beat::BeatAnalysis> {
                let buffer = decode::decode_mono(&audio)?;
                Ok(beat::analyze(&buffer))
            })
            .await??;

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("Detected BPM: {:.2}", analysis.tempo_bpm);
                println!("Duration:     {:.2}s", analysis.duration);
                println!("Beats:        {}", analysis.beat_times.len());
            }
        }
        Commands::Combine {
            input,
            audio,
            output,
        } => {
            let out_path = output.unwrap_or_else(|| default_output(&input, "combined"));
            let opts = RenderOptions::default();
            media::ffmpeg::mux_audio(&input, &audio, &out_path, &opts, false, None).await?;
            let size_mb = std::fs::metadata(&out_path)?.len() as f64 / 1_048_576.0;
            println!("🎹 Combine saved: {:?} ({:.2} MB)", out_path, size_mb);
        }
    }

    info!("Done.");
    Ok(())
}
