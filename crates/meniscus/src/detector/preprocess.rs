//! ROI crop, intensity conversion, thresholding and anisotropic smoothing.

use image::{GrayImage, RgbImage};
use imageproc::contrast::{threshold, ThresholdType};

use super::config::{BlurKernel, DetectorConfig};
use crate::roi::Roi;

/// Crop `frame` to `roi` and convert to single-channel intensity.
///
/// The caller guarantees that `roi` lies inside `frame`.
pub(crate) fn crop_gray(frame: &RgbImage, roi: &Roi) -> GrayImage {
    let crop = image::imageops::crop_imm(frame, roi.x, roi.y, roi.width, roi.height).to_image();
    image::imageops::grayscale(&crop)
}

/// 1D Gaussian weights for an odd `size`, sigma derived from the size.
pub(crate) fn gaussian_kernel(size: u32) -> Vec<f32> {
    let n = size.max(1) as usize;
    if n == 1 {
        return vec![1.0];
    }
    let sigma = 0.3 * ((n as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let center = (n / 2) as f32;
    let mut weights: Vec<f32> = (0..n)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Separable Gaussian with independent horizontal and vertical extents.
pub(crate) fn anisotropic_blur(gray: &GrayImage, kernel: BlurKernel) -> GrayImage {
    let h_kernel = gaussian_kernel(kernel.width);
    let v_kernel = gaussian_kernel(kernel.height);
    imageproc::filter::separable_filter(gray, &h_kernel, &v_kernel)
}

/// Apply the configured preprocessing chain.
pub(crate) fn preprocess(gray: &GrayImage, config: &DetectorConfig) -> GrayImage {
    let mode = config.preprocess;
    let mut out = if mode.uses_threshold() {
        threshold(gray, config.threshold_level, ThresholdType::Binary)
    } else {
        gray.clone()
    };
    if mode.uses_blur() {
        out = anisotropic_blur(&out, config.blur_kernel);
    }
    out
}
