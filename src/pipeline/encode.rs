//! Image encoding: `DynamicImage` → PNG bytes for the recognition engine.
//!
//! Tesseract reads images through leptonica, which accepts PNG on stdin.
//! PNG is lossless, so the preprocessed pixels reach the engine exactly as
//! computed.

use crate::error::OcrError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG.
///
/// Images with an exotic colour layout (16-bit, float) are converted to
/// 8-bit RGBA first, since the PNG encoder only supports 8/16-bit integers.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut buf = Vec::new();
    let result = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        }
        _ => img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png),
    };
    result.map_err(|e| OcrError::Internal(format!("PNG encoding failed: {e}")))?;

    debug!(
        "Encoded {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, Rgba32FImage, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let png = encode_png(&img).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).expect("valid PNG");
        assert_eq!(decoded.to_rgba8(), img.to_rgba8());
    }

    #[test]
    fn encode_grayscale_stays_lossless() {
        let img =
            DynamicImage::ImageLuma8(GrayImage::from_fn(7, 3, |x, y| Luma([(x * 30 + y) as u8])));
        let decoded = image::load_from_memory(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn encode_float_image_converts_to_8bit() {
        let pixel = Rgba([1.0, 0.0, 0.0, 1.0]);
        let img = DynamicImage::ImageRgba32F(Rgba32FImage::from_pixel(2, 2, pixel));
        let png = encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }
}
