// PULSEFRAME Health Check

use std::process::Command;

/// External binaries this tool shells out to.
const REQUIRED: &[&str] = &["ffmpeg", "ffprobe"];

/// Returns the names of required external binaries that are missing
/// from PATH. Checked once at startup so failures surface before any
/// rendering starts.
pub fn check_dependencies() -> Vec<String> {
    REQUIRED
        .iter()
        .filter(|bin| {
            !Command::new(*bin)
                .arg("-version")
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
        .map(|s| s.to_string())
        .collect()
}
