// PULSEFRAME FFmpeg Wrappers
//
// All encoding and muxing goes through the ffmpeg binary. Frames are
// exchanged as numbered PNGs in a work directory; encodes are a single
// libx264 pass with rate control matched to the output profile.

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::info;

/// Filename pattern for frame sequences in a work directory.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Encoder/mux settings shared by both pipelines.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            video_bitrate_kbps: 2500,
            audio_bitrate_kbps: 320,
        }
    }
}

/// Dump frames of `input` as numbered PNGs into `dir`, resampled to
/// `fps`. `height` scales to that height preserving aspect ratio
/// (width rounded to even for the encoder's sake); `duration` cuts the
/// input short.
pub async fn extract_frames(
    input: &Path,
    dir: &Path,
    fps: f64,
    height: Option<u32>,
    duration: Option<f64>,
) -> Result<()> {
    let filter = match height {
        Some(h) => format!("fps={},scale=-2:{}", fps, h),
        None => format!("fps={}", fps),
    };

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y").arg("-i").arg(input);
    if let Some(d) = duration {
        cmd.args(["-t", &d.to_string()]);
    }
    cmd.args(["-vf", &filter]).arg(dir.join(FRAME_PATTERN));

    let output = cmd
        .output()
        .await
        .context("Failed to run ffmpeg for frame extraction")?;
    if !output.status.success() {
        bail!(
            "FFmpeg frame extraction failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

/// Encode a PNG frame sequence to H.264. `fade_out` appends a
/// `fade=t=out` filter over the final seconds of `total_duration`.
pub async fn encode_frames(
    dir: &Path,
    fps: f64,
    opts: &RenderOptions,
    fade_out: Option<(f64, f64)>, // (total_duration, fade_secs)
    output: &Path,
) -> Result<()> {
    let bitrate = opts.video_bitrate_kbps;

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .args(["-framerate", &fps.to_string()])
        .arg("-i")
        .arg(dir.join(FRAME_PATTERN))
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-b:v", &format!("{}k", bitrate)])
        .args(["-maxrate", &format!("{}k", bitrate * 3 / 2)])
        .args(["-bufsize", &format!("{}k", bitrate * 2)]);

    if let Some((total, fade)) = fade_out {
        let start = (total - fade).max(0.0);
        cmd.args(["-vf", &format!("fade=t=out:st={:.3}:d={:.3}", start, fade)]);
    }

    cmd.arg(output);

    let result = cmd.output().await.context("Failed to run ffmpeg encoder")?;
    if !result.status.success() {
        bail!(
            "FFmpeg encoding failed: {}",
            String::from_utf8_lossy(&result.stderr)
        );
    }

    info!("[FFMPEG] Encoded {:?} at {} fps, {}k", output, fps, bitrate);
    Ok(())
}

/// Mux an audio track onto a video stream (video copied, audio AAC).
/// With `shortest` the output stops when the shorter stream ends;
/// `limit_secs` caps the container duration regardless of how long
/// either stream runs.
pub async fn mux_audio(
    video: &Path,
    audio: &Path,
    output: &Path,
    opts: &RenderOptions,
    shortest: bool,
    limit_secs: Option<f64>,
) -> Result<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-y")
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "copy", "-c:a", "aac"])
        .args(["-b:a", &format!("{}k", opts.audio_bitrate_kbps)]);
    if shortest {
        cmd.arg("-shortest");
    }
    if let Some(limit) = limit_secs {
        cmd.args(["-t", &limit.to_string()]);
    }
    cmd.arg(output);

    let result = cmd.output().await.context("Failed to run ffmpeg muxer")?;
    if !result.status.success() {
        bail!(
            "FFmpeg audio mux failed: {}",
            String::from_utf8_lossy(&result.stderr)
        );
    }
    Ok(())
}
