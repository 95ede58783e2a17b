// PULSEFRAME Render Pipelines

pub mod remix;
pub mod slideshow;

use std::path::PathBuf;

/// Outcome of a finished render.
#[derive(Debug)]
pub struct RenderSummary {
    pub output_path: PathBuf,
    pub size_mb: f64,
    pub duration: f64,
}

pub(crate) fn file_size_mb(path: &std::path::Path) -> anyhow::Result<f64> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.len() as f64 / 1_048_576.0)
}
