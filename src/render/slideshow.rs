// PULSEFRAME Slideshow Pipeline
//
// Builds a video from a folder of still images, timed to an audio
// track. The audio is decoded and beat-analyzed up front; every output
// frame then picks a random image and effect set (deterministic per
// seed + timestamp) with intensity following the detected beats.

use anyhow::{anyhow, bail, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::info;
use walkdir::WalkDir;

use crate::audio::beat::{self, BeatAnalysis};
use crate::audio::decode;
use crate::effects::frame::{self, FrameParams};
use crate::effects::zoom::ZoomSchedule;
use crate::media::ffmpeg::{self, RenderOptions};

use super::{file_size_mb, RenderSummary};

#[derive(Debug, Clone)]
pub struct SlideshowOptions {
    pub fps: f64,
    pub size: (u32, u32),
    pub seed: u64,
    /// Directional fade-in length at the start of the video.
    pub fade_secs: f64,
    pub render: RenderOptions,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self {
            fps: 24.0,
            size: (640, 640),
            seed: 42,
            fade_secs: 2.0,
            render: RenderOptions::default(),
        }
    }
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png")
    )
}

/// Load every jpg/png in the folder, resized to the output resolution.
fn load_images(dir: &Path, size: (u32, u32)) -> Result<Vec<RgbImage>> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| is_image_file(p))
        .collect();
    paths.sort();

    let images = paths
        .par_iter()
        .map(|p| {
            let img = image::open(p)
                .map_err(|e| anyhow!("Failed to load image {:?}: {}", p, e))?
                .to_rgb8();
            Ok(imageops::resize(&img, size.0, size.1, FilterType::Lanczos3))
        })
        .collect::<Result<Vec<RgbImage>>>()?;

    if images.is_empty() {
        bail!("No images found in {:?} (expected .jpg/.png files)", dir);
    }
    Ok(images)
}

pub async fn render(
    audio_path: &Path,
    images_dir: &Path,
    output: &Path,
    opts: SlideshowOptions,
) -> Result<RenderSummary> {
    if !audio_path.exists() {
        bail!("Audio file not found: {:?}", audio_path);
    }
    if !images_dir.is_dir() {
        bail!("Image folder not found: {:?}", images_dir);
    }

    // Decode + analyze off the async runtime; both are CPU-bound.
    let analysis: BeatAnalysis = {
        let audio_path = audio_path.to_path_buf();
        task::spawn_blocking(move || -> Result<BeatAnalysis> {
            let buffer = decode::decode_mono(&audio_path)?;
            Ok(beat::analyze(&buffer))
        })
        .await??
    };
    info!(
        "[SLIDES] Detected BPM: {:.2} ({} beats over {:.2}s)",
        analysis.tempo_bpm,
        analysis.beat_times.len(),
        analysis.duration
    );

    let duration = analysis.duration;
    if duration <= 0.0 {
        bail!("Audio track {:?} has zero duration", audio_path);
    }

    let images = {
        let dir = images_dir.to_path_buf();
        let size = opts.size;
        task::spawn_blocking(move || load_images(&dir, size)).await??
    };
    info!(
        "[SLIDES] Loaded {} images at {}x{}",
        images.len(),
        opts.size.0,
        opts.size.1
    );

    let work_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("pulseframe_slides_work");
    if work_dir.exists() {
        tokio::fs::remove_dir_all(&work_dir).await?;
    }
    let frames_dir = work_dir.join("frames");
    tokio::fs::create_dir_all(&frames_dir).await?;

    let schedule = ZoomSchedule::generate(duration, opts.seed);
    let n_frames = (duration * opts.fps).ceil() as usize;
    info!("[SLIDES] Rendering {} frames...", n_frames);

    let frames_dir_clone = frames_dir.clone();
    let fps = opts.fps;
    let seed = opts.seed;
    let fade_secs = opts.fade_secs;
    task::spawn_blocking(move || -> Result<(), String> {
        let cpus = num_cpus::get();
        let indices: Vec<usize> = (0..n_frames).collect();
        for chunk in indices.chunks(cpus) {
            chunk.par_iter().try_for_each(|&i| -> Result<(), String> {
                let t = i as f64 / fps;
                let params = FrameParams::generate(t, seed, images.len());
                let strength = analysis.strength_at(t);
                let fade_progress = if fade_secs > 0.0 {
                    (t / fade_secs).min(1.0)
                } else {
                    1.0
                };
                let composed = frame::compose(
                    &images[params.image_index],
                    &params,
                    strength,
                    fade_progress,
                    &schedule,
                    t,
                );
                composed
                    .save(frames_dir_clone.join(format!("frame_{:05}.png", i + 1)))
                    .map_err(|e| e.to_string())
            })?;
        }
        Ok(())
    })
    .await?
    .map_err(|e| anyhow!("Frame rendering failed: {}", e))?;

    info!("[SLIDES] Exporting final video...");
    let silent_video = work_dir.join("video.mp4");
    ffmpeg::encode_frames(&frames_dir, opts.fps, &opts.render, None, &silent_video).await?;

    ffmpeg::mux_audio(&silent_video, audio_path, output, &opts.render, true, None)
        .await
        .context("Failed to mux audio track")?;

    tokio::fs::remove_dir_all(&work_dir).await?;

    let size_mb = file_size_mb(output)?;
    info!("[SLIDES] ✅ Done: {:?} ({:.2} MB)", output, size_mb);

    Ok(RenderSummary {
        output_path: output.to_path_buf(),
        size_mb,
        duration,
    })
}
