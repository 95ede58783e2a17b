// PULSEFRAME Media Layer — ffmpeg/ffprobe subprocess plumbing

pub mod ffmpeg;
pub mod health;
pub mod probe;
