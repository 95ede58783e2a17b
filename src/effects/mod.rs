// PULSEFRAME Effect Modules

pub mod colorwave;
pub mod frame;
pub mod zoom;
