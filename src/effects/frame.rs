// PULSEFRAME Frame Composer
//
// Per-frame effect pass for the slideshow pipeline: every output frame
// picks a random source image and runs it through rotation, enhancement
// jitter, optional inversion, a color overlay, the zoom schedule and a
// directional fade-in. All randomness for a frame derives from the
// frame timestamp plus the run seed, so a (seed, t) pair always yields
// the same parameters.

use image::imageops;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::zoom::ZoomSchedule;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rotation {
    None,
    Cw90,
    Cw180,
    Cw270,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeDirection {
    Left,
    Right,
    Top,
    Bottom,
}

/// Randomized parameters for a single output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParams {
    pub image_index: usize,
    pub rotation: Rotation,
    pub overlay: [u8; 3],
    pub fade_direction: FadeDirection,
    pub contrast: f32,
    pub brightness: f32,
    pub sharpness: f32,
    pub saturation: f32,
    pub invert: bool,
}

impl FrameParams {
    /// Draw the frame parameters from an RNG seeded with
    /// `t * 1000 + seed`, so every timestamp maps to one fixed set of
    /// choices for a given run seed.
    pub fn generate(t: f64, seed: u64, image_count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(((t * 1000.0) as u64).wrapping_add(seed));

        let image_index = rng.gen_range(0..image_count.max(1));
        let rotation = match rng.gen_range(0..4) {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Cw270,
        };
        let overlay = [rng.gen::<u8>(), rng.gen::<u8>(), rng.gen::<u8>()];
        let fade_direction = match rng.gen_range(0..4) {
            0 => FadeDirection::Left,
            1 => FadeDirection::Right,
            2 => FadeDirection::Top,
            _ => FadeDirection::Bottom,
        };

        Self {
            image_index,
            rotation,
            overlay,
            fade_direction,
            contrast: rng.gen_range(1.5..2.5),
            brightness: rng.gen_range(0.9..1.1),
            sharpness: rng.gen_range(1.5..3.0),
            saturation: rng.gen_range(1.0..1.8),
            invert: rng.gen::<f64>() < 0.4,
        }
    }
}

fn luma(p: &[u8; 3]) -> f32 {
    0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32
}

fn mean_luma(img: &RgbImage) -> f32 {
    let sum: f64 = img.pixels().map(|p| luma(&p.0) as f64).sum();
    (sum / img.pixels().len().max(1) as f64) as f32
}

/// Contrast about the image's mean luma, factor 1.0 = unchanged.
fn adjust_contrast(img: &mut RgbImage, factor: f32) {
    let mean = mean_luma(img);
    for p in img.pixels_mut() {
        for c in 0..3 {
            p.0[c] = (mean + (p.0[c] as f32 - mean) * factor).clamp(0.0, 255.0) as u8;
        }
    }
}

fn adjust_brightness(img: &mut RgbImage, factor: f32) {
    for p in img.pixels_mut() {
        for c in 0..3 {
            p.0[c] = (p.0[c] as f32 * factor).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Saturation as a blend between the pixel and its grayscale value.
fn adjust_saturation(img: &mut RgbImage, factor: f32) {
    for p in img.pixels_mut() {
        let gray = luma(&p.0);
        for c in 0..3 {
            p.0[c] = (gray + (p.0[c] as f32 - gray) * factor).clamp(0.0, 255.0) as u8;
        }
    }
}

/// Unsharp-style sharpening: blend away from a blurred copy.
fn adjust_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let blurred = imageops::blur(img, 1.2);
    let mut out = RgbImage::new(img.width(), img.height());
    for ((src, blur), dst) in img.pixels().zip(blurred.pixels()).zip(out.pixels_mut()) {
        for c in 0..3 {
            let v = blur.0[c] as f32 + (src.0[c] as f32 - blur.0[c] as f32) * factor;
            dst.0[c] = v.clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn rotate(img: &RgbImage, rotation: Rotation) -> RgbImage {
    let (w, h) = img.dimensions();
    let rotated = match rotation {
        Rotation::None => return img.clone(),
        Rotation::Cw90 => imageops::rotate90(img),
        Rotation::Cw180 => imageops::rotate180(img),
        Rotation::Cw270 => imageops::rotate270(img),
    };
    let (rw, rh) = rotated.dimensions();
    if (rw, rh) == (w, h) {
        return rotated;
    }

    // Quarter turns swap the axes of non-square frames. Keep the
    // original canvas: center the rotated content, crop what
    // overflows and leave the uncovered area black.
    let mut canvas = RgbImage::new(w, h);
    let dx = (rw as i64 - w as i64) / 2;
    let dy = (rh as i64 - h as i64) / 2;
    for (x, y, p) in canvas.enumerate_pixels_mut() {
        let sx = x as i64 + dx;
        let sy = y as i64 + dy;
        if sx >= 0 && sy >= 0 && (sx as u32) < rw && (sy as u32) < rh {
            *p = *rotated.get_pixel(sx as u32, sy as u32);
        }
    }
    canvas
}

/// Black out the not-yet-revealed part of the frame. The revealed
/// rectangle grows from the fade direction's edge as progress goes
/// 0 -> 1.
fn directional_fade(img: &mut RgbImage, direction: FadeDirection, progress: f64) {
    let (w, h) = img.dimensions();
    let progress = progress.clamp(0.0, 1.0);

    for (x, y, p) in img.enumerate_pixels_mut() {
        let revealed = match direction {
            FadeDirection::Left => (x as f64) < w as f64 * progress,
            FadeDirection::Right => (x as f64) >= w as f64 * (1.0 - progress),
            FadeDirection::Top => (y as f64) < h as f64 * progress,
            FadeDirection::Bottom => (y as f64) >= h as f64 * (1.0 - progress),
        };
        if !revealed {
            p.0 = [0, 0, 0];
        }
    }
}

/// Run the full effect chain for one frame. `beat_strength` (0-1)
/// scales the contrast/saturation jitter toward neutral on weak beats;
/// `fade_progress` below 1.0 applies the directional fade-in mask.
/// Output dimensions always match the input.
pub fn compose(
    base: &RgbImage,
    params: &FrameParams,
    beat_strength: f64,
    fade_progress: f64,
    zoom: &ZoomSchedule,
    t: f64,
) -> RgbImage {
    let punch = (0.6 + 0.4 * beat_strength.clamp(0.0, 1.0)) as f32;

    let mut img = rotate(base, params.rotation);
    adjust_contrast(&mut img, 1.0 + (params.contrast - 1.0) * punch);
    adjust_brightness(&mut img, params.brightness);
    img = adjust_sharpness(&img, params.sharpness);
    adjust_saturation(&mut img, 1.0 + (params.saturation - 1.0) * punch);

    if params.invert {
        for p in img.pixels_mut() {
            p.0 = [255 - p.0[0], 255 - p.0[1], 255 - p.0[2]];
        }
    }

    // 50/50 blend with the overlay color.
    for p in img.pixels_mut() {
        for c in 0..3 {
            p.0[c] = ((p.0[c] as u16 + params.overlay[c] as u16) / 2) as u8;
        }
    }

    img = zoom.apply(&img, t);

    if fade_progress < 1.0 {
        directional_fade(&mut img, params.fade_direction, fade_progress);
    }

    img
}
