// PULSEFRAME Audio Analysis

pub mod beat;
pub mod decode;
