// PULSEFRAME — Beat-Synced Music Visualizer

pub mod audio;
pub mod effects;
pub mod media;
pub mod render;
