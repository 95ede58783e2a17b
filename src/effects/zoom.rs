// PULSEFRAME Zoom Schedule
//
// Precomputed random zoom intervals for a whole render. Each segment
// zooms in or out with its own strength; between renders the schedule
// is fully determined by the seed.

use image::imageops::{self, FilterType};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone)]
pub struct ZoomSegment {
    pub start: f64,
    pub end: f64,
    pub direction: ZoomDirection,
    pub strength: f64,
}

#[derive(Debug, Clone)]
pub struct ZoomSchedule {
    segments: Vec<ZoomSegment>,
}

impl ZoomSchedule {
    /// Build a schedule covering `[0, duration)` with back-to-back
    /// segments of random length (0.5-2.0 s), random direction and
    /// random strength (0.05-0.15). Same seed, same schedule.
    pub fn generate(duration: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut segments = Vec::new();
        let mut t = 0.0;
        while t < duration {
            let len = rng.gen_range(0.5..2.0);
            let direction = if rng.gen_bool(0.5) {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            };
            let strength = rng.gen_range(0.05..0.15);
            segments.push(ZoomSegment {
                start: t,
                end: t + len,
                direction,
                strength,
            });
            t += len;
        }
        Self { segments }
    }

    pub fn segments(&self) -> &[ZoomSegment] {
        &self.segments
    }

    /// Scale factor at time `t`: ramps up through an "in" segment,
    /// down through an "out" segment, 1.0 outside every segment.
    pub fn scale_at(&self, t: f64) -> f64 {
        for seg in &self.segments {
            if seg.start <= t && t <= seg.end {
                let progress = (t - seg.start) / (seg.end - seg.start);
                return match seg.direction {
                    ZoomDirection::In => 1.0 + progress * seg.strength,
                    ZoomDirection::Out => 1.0 + (1.0 - progress) * seg.strength,
                };
            }
        }
        1.0
    }

    /// Upscale by the current factor and crop back to the original
    /// size around the center. A factor of 1.0 is a no-op.
    pub fn apply(&self, img: &RgbImage, t: f64) -> RgbImage {
        let scale = self.scale_at(t);
        if scale <= 1.0 + 1e-6 {
            return img.clone();
        }

        let (w, h) = img.dimensions();
        let new_w = (w as f64 * scale) as u32;
        let new_h = (h as f64 * scale) as u32;
        let zoomed = imageops::resize(img, new_w, new_h, FilterType::Lanczos3);
        let left = (new_w - w) / 2;
        let top = (new_h - h) / 2;
        imageops::crop_imm(&zoomed, left, top, w, h).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_covers_duration() {
        let schedule = ZoomSchedule::generate(30.0, 42);
        let segs = schedule.segments();
        assert!(!segs.is_empty());
        assert_eq!(segs[0].start, 0.0);
        assert!(segs.last().unwrap().end >= 30.0);
    }

    #[test]
    fn test_segments_monotonic_and_contiguous() {
        let schedule = ZoomSchedule::generate(60.0, 7);
        for pair in schedule.segments().windows(2) {
            assert!(pair[0].end > pair[0].start);
            assert!((pair[1].start - pair[0].end).abs() < 1e-9);
        }
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let a = ZoomSchedule::generate(20.0, 42);
        let b = ZoomSchedule::generate(20.0, 42);
        assert_eq!(a.segments().len(), b.segments().len());
        for (x, y) in a.segments().iter().zip(b.segments()) {
            assert_eq!(x.start, y.start);
            assert_eq!(x.strength, y.strength);
            assert_eq!(x.direction, y.direction);
        }
    }

    #[test]
    fn test_scale_bounds() {
        let schedule = ZoomSchedule::generate(15.0, 3);
        for i in 0..150 {
            let t = i as f64 * 0.1;
            let s = schedule.scale_at(t);
            assert!((1.0..=1.15).contains(&s), "scale {} at t={}", s, t);
        }
        // Past the end of the schedule there is no zoom.
        assert_eq!(schedule.scale_at(1e6), 1.0);
    }

    #[test]
    fn test_apply_preserves_dimensions() {
        let schedule = ZoomSchedule::generate(10.0, 42);
        let img = RgbImage::from_pixel(64, 48, image::Rgb([10, 20, 30]));
        let out = schedule.apply(&img, 0.25);
        assert_eq!(out.dimensions(), (64, 48));
    }
}
