/// Region segmentation
///
/// Carves the scoreboard out of a normalized frame, then cuts it into one
/// strip per player row. Geometry is unconditional and comes from the
/// `ScoreboardLayout`; nothing here looks at pixel content.
use crate::config::{NormalizerSettings, ScoreboardLayout};
use crate::frame::Frame;
use image::imageops;
use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Scoreboard crop in two views with identical addressing
pub struct Scoreboard {
    pub gray: GrayImage,
    pub edges: GrayImage,
}

pub struct Segmenter<'a> {
    layout: &'a ScoreboardLayout,
    canny_low: f32,
    canny_high: f32,
}

impl<'a> Segmenter<'a> {
    pub fn new(layout: &'a ScoreboardLayout, settings: &NormalizerSettings) -> Self {
        Self {
            layout,
            canny_low: settings.canny_low,
            canny_high: settings.canny_high,
        }
    }

    /// Crop the scoreboard from the grayscale view and edge-detect it
    pub fn segment(&self, frame: &Frame) -> Scoreboard {
        let rect = self.layout.crop_rect();
        let gray = imageops::crop_imm(&frame.gray, rect.x, rect.y, rect.width, rect.height).to_image();
        let edges = edge_map(&gray, self.canny_low, self.canny_high);

        tracing::debug!(
            "Scoreboard crop at ({}, {}) size {}x{}",
            rect.x,
            rect.y,
            gray.width(),
            gray.height()
        );

        Scoreboard { gray, edges }
    }

    /// Player strips of one scoreboard view, top to bottom
    pub fn strips<'v>(&self, view: &'v GrayImage) -> impl Iterator<Item = (usize, GrayImage)> + 'v
    where
        'a: 'v,
    {
        let layout: &'a ScoreboardLayout = self.layout;
        let offsets: &'v [u32] = &layout.strip_offsets;
        let width = layout.strip_width;
        let height = layout.strip_height;
        offsets
            .iter()
            .enumerate()
            .map(move |(index, &offset)| {
                let strip = imageops::crop_imm(view, 0, offset, width, height).to_image();
                (index, strip)
            })
    }
}

/// tan(22.5°), tan(67.5°): bounds of the horizontal and vertical gradient sectors
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edges of an unblurred image.
///
/// 3x3 Sobel gradients with L1 magnitude `|gx| + |gy|`, non-maximum
/// suppression along the quantized gradient direction, then 8-connected
/// hysteresis. A pixel is a weak edge above `low` and a strong one above
/// `high`. Returns 255 on edges, 0 elsewhere.
pub fn edge_map(image: &GrayImage, low: f32, high: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let magnitude: Vec<i32> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(h, v)| (h[0] as i32).abs() + (v[0] as i32).abs())
        .collect();

    // Magnitude outside the image is zero
    let mag_at = |x: i64, y: i64| -> i32 {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            0
        } else {
            magnitude[y as usize * width as usize + x as usize]
        }
    };

    const NONE: u8 = 0;
    const WEAK: u8 = 1;
    const STRONG: u8 = 2;

    let mut state = vec![NONE; magnitude.len()];
    let mut stack = Vec::new();

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let m = mag_at(x, y);
            if (m as f32) <= low {
                continue;
            }

            let dx = gx.get_pixel(x as u32, y as u32)[0] as i32;
            let dy = gy.get_pixel(x as u32, y as u32)[0] as i32;
            let (ax, ay) = (dx.abs() as f32, dy.abs() as f32);

            let is_peak = if ay < ax * TAN_22_5 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else {
                let s = if (dx < 0) != (dy < 0) { -1 } else { 1 };
                m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
            };
            if !is_peak {
                continue;
            }

            let idx = y as usize * width as usize + x as usize;
            if (m as f32) > high {
                state[idx] = STRONG;
                stack.push((x, y));
            } else {
                state[idx] = WEAK;
            }
        }
    }

    while let Some((x, y)) = stack.pop() {
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let idx = ny as usize * width as usize + nx as usize;
                if state[idx] == WEAK {
                    state[idx] = STRONG;
                    stack.push((nx, ny));
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let idx = y as usize * width as usize + x as usize;
        Luma([if state[idx] == STRONG { 255 } else { 0 }])
    })
}
