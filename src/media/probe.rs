// PULSEFRAME Media Probe — ffprobe wrappers

use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::process::Command;

#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Container duration in seconds via ffprobe. Reading the header is
/// normally instant; a timeout guards against a wedged probe.
pub async fn media_duration(path: &Path) -> Result<f64> {
    let output = tokio::time::timeout(
        tokio::time::Duration::from_secs(10),
        Command::new("ffprobe")
            .kill_on_drop(true)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output(),
    )
    .await
    .context("ffprobe duration check timed out")?
    .context("Failed to run ffprobe")?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse duration from ffprobe output for {:?}", path))
}

/// Width, height and frame rate of the first video stream.
pub async fn video_info(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .kill_on_drop(true)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .await
        .context("Failed to run ffprobe")?;

    if !output.status.success() {
        bail!(
            "ffprobe stream probe failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout.lines().next().context("Empty ffprobe output")?;
    let fields: Vec<&str> = line.trim().trim_end_matches(',').split(',').collect();
    if fields.len() < 3 {
        bail!("Unexpected ffprobe stream output: {}", line);
    }

    let width: u32 = fields[0].parse().context("Bad width in ffprobe output")?;
    let height: u32 = fields[1].parse().context("Bad height in ffprobe output")?;
    let fps = parse_frame_rate(fields[2])?;

    Ok(VideoInfo { width, height, fps })
}

/// ffprobe reports `r_frame_rate` as a rational like "30000/1001".
fn parse_frame_rate(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    if let Some((num, den)) = raw.split_once('/') {
        let num: f64 = num.parse().context("Bad frame rate numerator")?;
        let den: f64 = den.parse().context("Bad frame rate denominator")?;
        if den == 0.0 {
            bail!("Zero frame rate denominator");
        }
        Ok(num / den)
    } else {
        raw.parse().context("Bad frame rate value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_rational() {
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("24/1").unwrap(), 24.0);
        assert_eq!(parse_frame_rate("25").unwrap(), 25.0);
    }

    #[test]
    fn test_parse_frame_rate_rejects_zero_denominator() {
        assert!(parse_frame_rate("30/0").is_err());
    }
}
