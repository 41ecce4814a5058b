//! # Label Images
//!
//! Turns an image file into a [`Bitmap`] in feed order for the installed
//! tape.
//!
//! The image is read the way it is meant to be seen: its height runs across
//! the tape, its width along it. Conversion steps:
//!
//! 1. Scale so the height equals the tape's printable width (aspect kept)
//! 2. Rotate 90° clockwise, then flip vertically, so image rows become
//!    scanlines across the tape
//! 3. Threshold: pixels darker than the threshold print; transparent
//!    pixels never print

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayAlphaImage, Luma};
use tracing::debug;

use crate::error::{PtouchError, Result};
use crate::printer::Bitmap;
use crate::protocol::TapeInfo;

/// Luminance below which a pixel prints
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Alpha below which a pixel counts as background
const ALPHA_CUTOFF: u8 = 128;

/// Load an image file and convert it for `tape`.
pub fn load<P: AsRef<Path>>(path: P, tape: &TapeInfo, threshold: u8) -> Result<Bitmap> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| PtouchError::Image(format!("{}: {}", path.display(), e)))?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded label image"
    );
    from_image(&image, tape, threshold)
}

/// Convert a decoded image for `tape`.
pub fn from_image(image: &DynamicImage, tape: &TapeInfo, threshold: u8) -> Result<Bitmap> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PtouchError::Image("image is empty".to_string()));
    }

    let target = u32::from(tape.printarea_width);
    let scaled = if image.height() == target {
        image.to_luma_alpha8()
    } else {
        let width = (u64::from(image.width()) * u64::from(target) / u64::from(image.height())).max(1);
        let width = u32::try_from(width)
            .map_err(|_| PtouchError::Image(format!("scaled width {} out of range", width)))?;
        image
            .resize_exact(width, target, FilterType::Triangle)
            .to_luma_alpha8()
    };

    let rotated = imageops::flip_vertical(&imageops::rotate90(&scaled));
    Ok(threshold_bitmap(&rotated, threshold))
}

fn threshold_bitmap(image: &GrayAlphaImage, threshold: u8) -> Bitmap {
    let mut bitmap = Bitmap::new(image.width() as usize, image.height() as usize);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [luma, alpha] = pixel.0;
        if alpha >= ALPHA_CUTOFF && luma < threshold {
            bitmap.set(x as usize, y as usize, true);
        }
    }
    bitmap
}

/// Grayscale test pattern the height of `tape`, `length` dots long.
///
/// A frame around the printable area; handy for checking margins.
pub fn test_pattern(tape: &TapeInfo, length: u32) -> DynamicImage {
    let height = u32::from(tape.printarea_width);
    let image = image::GrayImage::from_fn(length, height, |x, y| {
        let edge = x == 0 || y == 0 || x + 1 == length || y + 1 == height;
        if edge { Luma([0]) } else { Luma([255]) }
    });
    DynamicImage::ImageLuma8(image)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::tables::tape_info;
    use image::{GrayImage, LumaA, RgbaImage};
    use pretty_assertions::assert_eq;

    fn tape(code: u8) -> TapeInfo {
        tape_info(code).unwrap().unwrap()
    }

    #[test]
    fn test_orientation() {
        let mut image = GrayImage::from_pixel(10, 128, Luma([255]));
        image.put_pixel(0, 0, Luma([0]));

        let bitmap = from_image(&DynamicImage::ImageLuma8(image), &tape(24), DEFAULT_THRESHOLD).unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (128, 10));
        assert!(bitmap.get(127, 9));
        assert_eq!(bitmap.rows().flatten().filter(|b| **b != 0).count(), 1);
    }

    #[test]
    fn test_scales_to_printable_width() {
        let image = GrayImage::from_pixel(20, 64, Luma([0]));
        let bitmap = from_image(&DynamicImage::ImageLuma8(image), &tape(24), DEFAULT_THRESHOLD).unwrap();

        assert_eq!((bitmap.width(), bitmap.height()), (128, 40));
        assert!(bitmap.rows().all(|row| row.iter().all(|b| *b == 0xFF)));
    }

    #[test]
    fn test_transparent_pixels_do_not_print() {
        let image = RgbaImage::from_pixel(4, 24, image::Rgba([0, 0, 0, 0]));
        let bitmap = from_image(&DynamicImage::ImageRgba8(image), &tape(4), DEFAULT_THRESHOLD).unwrap();

        assert_eq!(bitmap.width(), 24);
        assert!(bitmap.rows().all(|row| row.iter().all(|b| *b == 0)));
    }

    #[test]
    fn test_threshold() {
        let mut image = GrayAlphaImage::from_pixel(2, 1, LumaA([255, 255]));
        image.put_pixel(0, 0, LumaA([100, 255]));
        image.put_pixel(1, 0, LumaA([200, 255]));

        assert!(threshold_bitmap(&image, 128).get(0, 0));
        assert!(!threshold_bitmap(&image, 128).get(1, 0));
        assert!(threshold_bitmap(&image, 201).get(1, 0));
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            from_image(&image, &tape(12), DEFAULT_THRESHOLD),
            Err(PtouchError::Image(_))
        ));
    }

    #[test]
    fn test_pattern_frame() {
        let tape = tape(12);
        let bitmap = from_image(&test_pattern(&tape, 30), &tape, DEFAULT_THRESHOLD).unwrap();

        assert_eq!((bitmap.width(), bitmap.height()), (70, 30));
        assert!(bitmap.get(0, 0));
        assert!(bitmap.get(69, 29));
        assert!(!bitmap.get(35, 15));
    }

    #[test]
    fn test_missing_file() {
        let err = load("/nonexistent/label.png", &tape(12), DEFAULT_THRESHOLD).unwrap_err();
        assert!(matches!(err, PtouchError::Image(_)));
    }
}
