//! Image enhancement applied to every image or page before recognition.
//!
//! Steps run in a fixed order and each is skipped at its neutral value:
//!
//! 1. grayscale  — single-channel luminance
//! 2. denoise    — 3×3 median filter
//! 3. brightness — blend toward black by the factor
//! 4. contrast   — blend toward the image's mean grey by the factor
//! 5. sharpness  — blend toward a 3×3 smoothed copy by the factor
//!
//! Grayscale runs before denoise so the median filter sees one channel
//! instead of three; brightness runs before contrast so the mean grey is
//! taken from the brightened image.
//!
//! Steps 3–5 share one formula, `out = base + factor × (pixel − base)`,
//! where `base` is black, the mean grey, or the smoothed pixel. Results are
//! clamped to `0..=255` and truncated. Alpha is never touched.

use crate::config::PreprocessConfig;
use image::{imageops, DynamicImage, ImageBuffer, Pixel};
use imageproc::filter::median_filter;
use tracing::debug;

/// 3×3 smoothing kernel used as the sharpness baseline (normalised by its sum).
const SMOOTH_KERNEL: [f32; 9] = [1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0];

/// Apply the configured adjustments and return a new image.
///
/// The input is never modified. With a neutral config the result is a
/// pixel-identical copy.
pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let mut img = image.clone();

    if config.grayscale {
        img = DynamicImage::ImageLuma8(img.to_luma8());
    }

    if config.denoise {
        img = denoise(&img);
    }

    if config.brightness != 1.0 {
        img = blend(&img, config.brightness, Baseline::Black);
    }

    if config.contrast != 1.0 {
        let mean = mean_grey(&img);
        img = blend(&img, config.contrast, Baseline::Grey(mean));
    }

    if config.sharpness != 1.0 {
        img = blend(&img, config.sharpness, Baseline::Smoothed);
    }

    debug!(
        "Preprocessed {}x{} image (grayscale={}, denoise={}, brightness={}, contrast={}, sharpness={})",
        img.width(),
        img.height(),
        config.grayscale,
        config.denoise,
        config.brightness,
        config.contrast,
        config.sharpness
    );
    img
}

/// 3×3 median filter, per channel.
fn denoise(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => DynamicImage::ImageLuma8(median_filter(buf, 1, 1)),
        DynamicImage::ImageLumaA8(buf) => DynamicImage::ImageLumaA8(median_filter(buf, 1, 1)),
        DynamicImage::ImageRgb8(buf) => DynamicImage::ImageRgb8(median_filter(buf, 1, 1)),
        DynamicImage::ImageRgba8(buf) => DynamicImage::ImageRgba8(median_filter(buf, 1, 1)),
        other => DynamicImage::ImageRgba8(median_filter(&other.to_rgba8(), 1, 1)),
    }
}

/// Mean luminance rounded to the nearest grey level.
fn mean_grey(image: &DynamicImage) -> u8 {
    let luma = image.to_luma8();
    let count = u64::from(luma.width()) * u64::from(luma.height());
    if count == 0 {
        return 0;
    }
    let sum: u64 = luma.as_raw().iter().map(|&v| u64::from(v)).sum();
    ((sum as f64 / count as f64) + 0.5) as u8
}

/// What an enhancement interpolates away from.
#[derive(Debug, Clone, Copy)]
enum Baseline {
    Black,
    Grey(u8),
    Smoothed,
}

fn blend(image: &DynamicImage, factor: f64, baseline: Baseline) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(buf) => {
            DynamicImage::ImageLuma8(blend_buffer(buf, factor, baseline))
        }
        DynamicImage::ImageLumaA8(buf) => {
            DynamicImage::ImageLumaA8(blend_buffer(buf, factor, baseline))
        }
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(blend_buffer(buf, factor, baseline))
        }
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(blend_buffer(buf, factor, baseline))
        }
        other => DynamicImage::ImageRgba8(blend_buffer(&other.to_rgba8(), factor, baseline)),
    }
}

fn blend_buffer<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    factor: f64,
    baseline: Baseline,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let color_channels = if P::HAS_ALPHA {
        usize::from(P::CHANNEL_COUNT) - 1
    } else {
        usize::from(P::CHANNEL_COUNT)
    };
    let (width, height) = src.dimensions();
    // filter3x3 leaves the one-pixel border black; border pixels keep
    // themselves as their baseline instead.
    let smoothed = match baseline {
        Baseline::Smoothed if width >= 3 && height >= 3 => {
            Some(imageops::filter3x3(src, &SMOOTH_KERNEL))
        }
        _ => None,
    };

    let mut out = src.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let channels = pixel.channels_mut();
        for (c, value) in channels.iter_mut().enumerate().take(color_channels) {
            let base = match (baseline, &smoothed) {
                (Baseline::Black, _) => 0.0,
                (Baseline::Grey(m), _) => f64::from(m),
                (Baseline::Smoothed, Some(s))
                    if x > 0 && y > 0 && x + 1 < width && y + 1 < height =>
                {
                    f64::from(s.get_pixel(x, y).channels()[c])
                }
                (Baseline::Smoothed, _) => f64::from(*value),
            };
            let v = base + factor * (f64::from(*value) - base);
            *value = v.clamp(0.0, 255.0) as u8;
        }
    }
    out
}
