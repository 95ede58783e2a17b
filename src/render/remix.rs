// PULSEFRAME Remix Pipeline
//
// Takes an existing video plus an external audio track, recolors every
// frame with the cyclic colorwave blend, fades out at the end and
// muxes the audio in. Runs as extract -> parallel color pass ->
// encode -> mux, with a scratch directory beside the output.

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::info;

use crate::effects::colorwave::ColorWave;
use crate::media::ffmpeg::{self, RenderOptions};
use crate::media::probe;

use super::{file_size_mb, RenderSummary};

#[derive(Debug, Clone)]
pub struct RemixOptions {
    /// Length of one full colorwave cycle in seconds.
    pub cycle_secs: f64,
    /// Output height; width follows the aspect ratio.
    pub height: u32,
    /// Fade-out length appended after the audio ends.
    pub fade_secs: f64,
    /// Override the source frame rate.
    pub fps: Option<f64>,
    pub render: RenderOptions,
}

impl Default for RemixOptions {
    fn default() -> Self {
        Self {
            cycle_secs: 12.0,
            height: 720,
            fade_secs: 5.0,
            fps: None,
            render: RenderOptions::default(),
        }
    }
}

pub async fn render(
    input: &Path,
    audio: &Path,
    output: &Path,
    opts: RemixOptions,
) -> Result<RenderSummary> {
    if !input.exists() {
        bail!("Input video not found: {:?}", input);
    }
    if !audio.exists() {
        bail!("Audio file not found: {:?}", audio);
    }

    info!("[REMIX] Loading video and audio...");
    let video_info = probe::video_info(input).await?;
    let video_duration = probe::media_duration(input).await?;
    let audio_duration = probe::media_duration(audio).await?;

    // The video runs until the audio ends plus the fade tail, or until
    // the source runs out, whichever comes first.
    let duration = video_duration.min(audio_duration + opts.fade_secs);
    let fps = opts.fps.unwrap_or(video_info.fps);

    info!(
        "[REMIX] Source {}x{} @ {:.2} fps, rendering {:.2}s",
        video_info.width, video_info.height, fps, duration
    );

    let work_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("pulseframe_remix_work");
    if work_dir.exists() {
        tokio::fs::remove_dir_all(&work_dir).await?;
    }
    let frames_dir = work_dir.join("frames");
    tokio::fs::create_dir_all(&frames_dir).await?;

    ffmpeg::extract_frames(input, &frames_dir, fps, Some(opts.height), Some(duration)).await?;

    info!("[REMIX] Applying visual effects...");
    let frames_dir_clone = frames_dir.clone();
    let cycle_secs = opts.cycle_secs;
    task::spawn_blocking(move || -> Result<(), String> {
        let wave = ColorWave::new(cycle_secs);

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&frames_dir_clone)
            .map_err(|e| e.to_string())?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        paths.sort();
        info!("[REMIX] Recoloring {} frames...", paths.len());

        // Process in chunks so peak memory stays bounded by core count.
        let cpus = num_cpus::get();
        for (chunk_idx, chunk) in paths.chunks(cpus).enumerate() {
            chunk
                .par_iter()
                .enumerate()
                .try_for_each(|(i, path)| -> Result<(), String> {
                    let frame_idx = chunk_idx * cpus + i;
                    let t = frame_idx as f64 / fps;
                    let img = image::open(path).map_err(|e| e.to_string())?.to_rgb8();
                    wave.apply(&img, t)
                        .save(path)
                        .map_err(|e| e.to_string())
                })?;
        }
        Ok(())
    })
    .await?
    .map_err(|e| anyhow!("Colorwave pass failed: {}", e))?;

    info!("[REMIX] Exporting final video...");
    let silent_video = work_dir.join("video.mp4");
    ffmpeg::encode_frames(
        &frames_dir,
        fps,
        &opts.render,
        Some((duration, opts.fade_secs)),
        &silent_video,
    )
    .await?;

    // No -shortest: the fade tail extends past the end of the audio.
    // The explicit limit keeps a too-long audio track from stretching
    // the container past the rendered video.
    ffmpeg::mux_audio(&silent_video, audio, output, &opts.render, false, Some(duration))
        .await
        .context("Failed to mux audio track")?;

    tokio::fs::remove_dir_all(&work_dir).await?;

    let size_mb = file_size_mb(output)?;
    info!("[REMIX] ✅ Done: {:?} ({:.2} MB)", output, size_mb);

    Ok(RenderSummary {
        output_path: output.to_path_buf(),
        size_mb,
        duration,
    })
}
