// PULSEFRAME Colorwave — Cyclic Colormap Blend
//
// Recolors each frame as a weighted sum of four transforms (inversion,
// JET, HSV, OCEAN) whose weights cycle sinusoidally over time, so the
// look drifts smoothly from one palette to the next and back.

use image::RgbImage;
use std::f64::consts::PI;

/// One 256-entry RGB lookup table.
type Lut = [[u8; 3]; 256];

/// Blend weights for (invert, jet, hsv, ocean) at time `t` within a
/// cycle of `cycle_secs`. Four sinusoids phase-shifted by 90 degrees,
/// normalized so the weights always sum to 1. The raw total is a
/// constant 2.0, so normalization never divides by zero.
pub fn blend_weights(t: f64, cycle_secs: f64) -> [f64; 4] {
    let phase = (t % cycle_secs) / cycle_secs;
    let angle = 2.0 * PI * phase;

    let mut w = [
        (angle.sin() + 1.0) / 2.0,
        ((angle + PI / 2.0).sin() + 1.0) / 2.0,
        ((angle + PI).sin() + 1.0) / 2.0,
        ((angle + 3.0 * PI / 2.0).sin() + 1.0) / 2.0,
    ];

    let total: f64 = w.iter().sum();
    for x in &mut w {
        *x /= total;
    }
    w
}

/// Piecewise-linear JET ramp: blue -> cyan -> yellow -> red.
fn jet_lut() -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f64 / 255.0;
        let r = (1.5 - (4.0 * x - 3.0).abs()).clamp(0.0, 1.0);
        let g = (1.5 - (4.0 * x - 2.0).abs()).clamp(0.0, 1.0);
        let b = (1.5 - (4.0 * x - 1.0).abs()).clamp(0.0, 1.0);
        *entry = [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8];
    }
    lut
}

/// Full hue wheel at maximum saturation and value.
fn hsv_lut() -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let h = i as f64 / 256.0 * 360.0;
        let hp = h / 60.0;
        let x = 1.0 - (hp % 2.0 - 1.0).abs();
        let (r, g, b) = match hp as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        *entry = [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8];
    }
    lut
}

/// Blue-weighted OCEAN ramp: blue rises over the whole range, green
/// over the upper two thirds, red over the final third.
fn ocean_lut() -> Lut {
    let mut lut = [[0u8; 3]; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f64 / 255.0;
        let r = (3.0 * x - 2.0).clamp(0.0, 1.0);
        let g = ((3.0 * x - 1.0) / 2.0).clamp(0.0, 1.0);
        let b = x;
        *entry = [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8];
    }
    lut
}

/// Precomputed LUTs plus the cycle length, built once per render.
pub struct ColorWave {
    cycle_secs: f64,
    jet: Lut,
    hsv: Lut,
    ocean: Lut,
}

impl ColorWave {
    pub fn new(cycle_secs: f64) -> Self {
        Self {
            cycle_secs,
            jet: jet_lut(),
            hsv: hsv_lut(),
            ocean: ocean_lut(),
        }
    }

    /// Recolor a frame for time `t`. Output dimensions equal input
    /// dimensions. The colormaps are indexed by the pixel's luma (a
    /// colormap recolors the grayscale image); inversion works
    /// per-channel. The four transforms are mixed with the current
    /// blend weights.
    pub fn apply(&self, img: &RgbImage, t: f64) -> RgbImage {
        let w = blend_weights(t, self.cycle_secs);
        let (wi, wj, wh, wo) = (w[0] as f32, w[1] as f32, w[2] as f32, w[3] as f32);

        let mut out = RgbImage::new(img.width(), img.height());
        for (src, dst) in img.pixels().zip(out.pixels_mut()) {
            let luma = (0.299 * src.0[0] as f32
                + 0.587 * src.0[1] as f32
                + 0.114 * src.0[2] as f32)
                .round()
                .clamp(0.0, 255.0) as usize;
            let (jet, hsv, ocean) = (self.jet[luma], self.hsv[luma], self.ocean[luma]);

            for c in 0..3 {
                let mixed = wi * (255 - src.0[c]) as f32
                    + wj * jet[c] as f32
                    + wh * hsv[c] as f32
                    + wo * ocean[c] as f32;
                dst.0[c] = mixed.clamp(0.0, 255.0) as u8;
            }
        }
        out
    }
}
