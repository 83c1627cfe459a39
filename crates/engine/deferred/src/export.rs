//! PNG export of composited frames

use std::path::Path;

use image::RgbImage;
use tracing::info;

use crate::error::{Error, Result};

/// Quantize one channel: `clamp(v * 255, 0, 255)`, truncated
pub fn quantize(value: f32) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

/// Encode bottom-up RGB float pixels (GL readback order) as a top-down image
pub fn encode_rgb8(pixels: &[f32], width: usize, height: usize) -> Result<RgbImage> {
    let expected = width * height * 3;
    if pixels.len() != expected {
        return Err(Error::Export(format!(
            "{} floats for a {}x{} RGB image, expected {}",
            pixels.len(),
            width,
            height,
            expected
        )));
    }

    // Flip vertically (OpenGL has origin at bottom-left)
    let row = width * 3;
    let mut bytes = vec![0u8; expected];
    for y in 0..height {
        let src = &pixels[y * row..(y + 1) * row];
        let dst_offset = (height - 1 - y) * row;
        for (dst, &v) in bytes[dst_offset..dst_offset + row].iter_mut().zip(src) {
            *dst = quantize(v);
        }
    }

    RgbImage::from_raw(width as u32, height as u32, bytes)
        .ok_or_else(|| Error::Export("Failed to create image buffer".to_string()))
}

/// Write bottom-up RGB float pixels to a PNG file
pub fn write_png(path: &Path, pixels: &[f32], width: usize, height: usize) -> Result<()> {
    let img = encode_rgb8(pixels, width, height)?;
    img.save_with_format(path, image::ImageFormat::Png)?;
    info!("Exported {}x{} frame to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(1.0), 255);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(2.5), 255);
        assert_eq!(quantize(-0.5), 0);
        // Truncates rather than rounds
        assert_eq!(quantize(0.999), 254);
    }

    #[test]
    fn test_rows_are_flipped() {
        // Two rows, bottom row red, top row blue (bottom-up input)
        let pixels = [
            1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0,
        ];
        let img = encode_rgb8(&pixels, 1, 2).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            encode_rgb8(&[0.0; 5], 1, 2),
            Err(Error::Export(_))
        ));
    }

    #[test]
    fn test_write_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        write_png(&path, &[0.5; 4 * 4 * 3], 4, 4).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert_eq!(decoded.get_pixel(3, 3).0, [127, 127, 127]);
    }
}
