/// Field normalization for OCR
///
/// Names are read straight off the edge-detected strip: the name font is bold
/// enough that its outline is legible. Numeric columns are small, so the
/// thresholded strip is cropped, upscaled, then eroded and dilated once each.
use crate::config::{FieldSpan, NormalizerSettings};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::morphology::{dilate, erode};

/// Per-field image preprocessor
pub struct FieldNormalizer {
    settings: NormalizerSettings,
}

impl FieldNormalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    /// Blur and adaptively threshold a grayscale strip.
    ///
    /// Done once per strip; every numeric field is then cut from the result.
    pub fn threshold_strip(&self, strip_gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(strip_gray, self.settings.blur_sigma);
        adaptive_mean_threshold(
            &blurred,
            self.settings.threshold_block_radius,
            self.settings.threshold_offset,
        )
    }

    /// Name sub-region of the edge-detected strip, unmodified
    pub fn normalize_name(&self, strip_edges: &GrayImage, span: FieldSpan, height: u32) -> GrayImage {
        let (x, width) = span.resolve(strip_edges.width());
        let height = height.min(strip_edges.height());
        imageops::crop_imm(strip_edges, x, 0, width, height).to_image()
    }

    /// Numeric sub-region of a thresholded strip, upscaled and smoothed
    pub fn normalize_numeric_field(&self, strip_thresholded: &GrayImage, span: FieldSpan) -> GrayImage {
        let (x, width) = span.resolve(strip_thresholded.width());
        let field = imageops::crop_imm(strip_thresholded, x, 0, width, strip_thresholded.height()).to_image();

        // Nearest keeps the field binary, so the morphology below stays exact
        let factor = self.settings.upscale_factor;
        let upscaled = if factor > 1 && width > 0 {
            imageops::resize(&field, width * factor, field.height() * factor, FilterType::Nearest)
        } else {
            field
        };

        let radius = self.settings.morph_radius;
        let eroded = erode(&upscaled, Norm::LInf, radius);
        dilate(&eroded, Norm::LInf, radius)
    }
}

/// Mean-adaptive binary threshold.
///
/// A pixel becomes 255 when it exceeds the mean of its
/// `(2 * block_radius + 1)`-square neighbourhood minus `offset`, else 0.
/// The mean is rounded to the nearest integer; borders replicate edge pixels.
pub fn adaptive_mean_threshold(image: &GrayImage, block_radius: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let r = block_radius;
    let padded = GrayImage::from_fn(width + 2 * r, height + 2 * r, |x, y| {
        let sx = x.saturating_sub(r).min(width - 1);
        let sy = y.saturating_sub(r).min(height - 1);
        *image.get_pixel(sx, sy)
    });
    let integral = integral_image::<_, u32>(&padded);

    let side = 2 * r + 1;
    let area = side * side;
    GrayImage::from_fn(width, height, |x, y| {
        let sum = sum_image_pixels(&integral, x, y, x + side - 1, y + side - 1)[0];
        let mean = ((sum + area / 2) / area) as i32;
        let pixel = image.get_pixel(x, y)[0] as i32;
        Luma([if pixel - mean > -offset { 255 } else { 0 }])
    })
}
