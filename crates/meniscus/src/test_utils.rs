//! Shared test utilities: synthetic container frames.

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::roi::Roi;

pub(crate) const BACKGROUND: u8 = 90;
pub(crate) const AIR: u8 = 20;
pub(crate) const LIQUID: u8 = 220;

/// One container drawn into a synthetic frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContainerSpec {
    pub roi: Roi,
    /// First image row (absolute) filled with liquid.
    pub liquid_top_row: u32,
}

/// Render a frame where each container ROI is dark air above a bright liquid
/// column starting at `liquid_top_row`.
pub(crate) fn container_frame(w: u32, h: u32, containers: &[ContainerSpec]) -> RgbImage {
    let mut img = RgbImage::from_pixel(w, h, Rgb([BACKGROUND; 3]));
    for c in containers {
        for y in c.roi.y..c.roi.y + c.roi.height {
            let v = if y >= c.liquid_top_row { LIQUID } else { AIR };
            for x in c.roi.x..c.roi.x + c.roi.width {
                img.put_pixel(x, y, Rgb([v; 3]));
            }
        }
    }
    img
}

/// Add uniform per-pixel noise in `[-amplitude, amplitude]` (seeded).
pub(crate) fn add_noise(img: &mut RgbImage, amplitude: i16, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    for p in img.pixels_mut() {
        let n: i16 = rng.gen_range(-amplitude..=amplitude);
        for c in p.0.iter_mut() {
            *c = (*c as i16 + n).clamp(0, 255) as u8;
        }
    }
}
