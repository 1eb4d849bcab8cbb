/// Screenshot loading and normalization
///
/// A `Frame` is the colour screenshot stretched to the layout resolution plus
/// its grayscale view. Both share pixel addressing, so region coordinates
/// computed once apply to either.
use crate::config::ScoreboardLayout;
use crate::error::FrameError;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use std::path::Path;

pub struct Frame {
    pub color: RgbImage,
    pub gray: GrayImage,
}

impl Frame {
    /// Decode a `.png`/`.jpg` screenshot and normalize it to the layout size
    pub fn open(
        path: &Path,
        layout: &ScoreboardLayout,
        aspect_tolerance: f64,
    ) -> Result<Self, FrameError> {
        let decoded = image::open(path).map_err(|e| FrameError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        tracing::info!(
            "Loaded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );

        Self::from_rgb(decoded.to_rgb8(), layout, aspect_tolerance)
    }

    /// Build a frame from an already-decoded colour image.
    ///
    /// Rejects sources whose aspect ratio is off by more than
    /// `aspect_tolerance` (relative), then stretches to the layout size.
    pub fn from_rgb(
        color: RgbImage,
        layout: &ScoreboardLayout,
        aspect_tolerance: f64,
    ) -> Result<Self, FrameError> {
        let (width, height) = color.dimensions();
        if width == 0 || height == 0 {
            return Err(FrameError::Empty);
        }

        let expected = layout.aspect_ratio();
        let actual = width as f64 / height as f64;
        if (actual - expected).abs() / expected > aspect_tolerance {
            return Err(FrameError::AspectRatio {
                width,
                height,
                actual,
                expected,
            });
        }

        let color = if (width, height) == (layout.frame_width, layout.frame_height) {
            color
        } else {
            tracing::info!(
                "Resizing {}x{} -> {}x{}",
                width,
                height,
                layout.frame_width,
                layout.frame_height
            );
            imageops::resize(
                &color,
                layout.frame_width,
                layout.frame_height,
                FilterType::Triangle,
            )
        };

        let gray = to_grayscale(&color);
        Ok(Self { color, gray })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }
}

/// Luma conversion: 0.299*R + 0.587*G + 0.114*B in fixed point
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut gray = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let r = pixel[0] as u32;
        let g = pixel[1] as u32;
        let b = pixel[2] as u32;
        // (77*R + 150*G + 29*B) / 256, rounded
        let value = (77 * r + 150 * g + 29 * b + 128) >> 8;
        gray.put_pixel(x, y, Luma([value.min(255) as u8]));
    }

    gray
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_grayscale_conversion() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(2, 0, Rgb([255, 0, 0]));
        img.put_pixel(3, 0, Rgb([0, 255, 0]));

        let gray = to_grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        assert!((75..=78).contains(&gray.get_pixel(2, 0)[0]));
        assert!((148..=151).contains(&gray.get_pixel(3, 0)[0]));
    }

    #[test]
    fn test_native_resolution_is_kept() {
        let layout = ScoreboardLayout::default();
        let img = RgbImage::from_pixel(1920, 1080, Rgb([10, 20, 30]));
        let frame = Frame::from_rgb(img, &layout, 0.02).unwrap();
        assert_eq!(frame.dimensions(), (1920, 1080));
        assert_eq!(frame.gray.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_other_16_9_sizes_are_stretched() {
        let layout = ScoreboardLayout::default();
        let img = RgbImage::from_pixel(1280, 720, Rgb([200, 200, 200]));
        let frame = Frame::from_rgb(img, &layout, 0.02).unwrap();
        assert_eq!(frame.dimensions(), (1920, 1080));
        assert_eq!(frame.gray.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_wrong_aspect_ratio_is_rejected() {
        let layout = ScoreboardLayout::default();
        let img = RgbImage::new(1024, 768);
        let result = Frame::from_rgb(img, &layout, 0.02);
        assert!(matches!(result, Err(FrameError::AspectRatio { width: 1024, height: 768, .. })));
    }

    #[test]
    fn test_loose_tolerance_accepts_near_ratios() {
        let layout = ScoreboardLayout::default();
        // 16:10 is 10% off 16:9
        let img = RgbImage::new(1920, 1200);
        assert!(Frame::from_rgb(img.clone(), &layout, 0.02).is_err());
        assert!(Frame::from_rgb(img, &layout, 0.15).is_ok());
    }

    #[test]
    fn test_missing_file_fails() {
        let layout = ScoreboardLayout::default();
        let result = Frame::open(Path::new("/nonexistent/scoreboard.png"), &layout, 0.02);
        assert!(matches!(result, Err(FrameError::LoadFailed { .. })));
    }
}
