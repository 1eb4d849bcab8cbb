/// Result annotation
///
/// Draws each strip's name and its stats, as reconciled up to that strip,
/// onto a copy of the colour frame. Label positions come from `LabelLayout`;
/// x positions are the same for every strip, y steps down one row per strip.
use crate::config::LabelLayout;
use crate::pipeline::ScoreboardReading;
use crate::reconcile::StatField;
use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};

/// Fonts tried when no `font_path` is configured
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// One piece of text to draw, anchored at its baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

/// Labels for every strip, in strip order
pub fn build_labels(reading: &ScoreboardReading, layout: &LabelLayout) -> Vec<Label> {
    let mut labels = Vec::with_capacity(reading.strips.len() * 6);

    for strip in &reading.strips {
        let y = layout.row_y(strip.strip_index);
        let stats = &strip.stats;

        labels.push(Label {
            x: layout.name_x,
            y,
            text: strip.display_name.clone(),
        });
        for (field, x) in StatField::ALL.iter().zip(layout.stat_x) {
            labels.push(Label {
                x,
                y,
                text: format!("{}: {}", field.label(), stats.get(*field)),
            });
        }
    }

    labels
}

/// Load the label font: the configured path, else the first system font found
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    let candidates: Vec<PathBuf> = match configured {
        Some(path) => vec![path.to_path_buf()],
        None => SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
    };

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                tracing::debug!("Label font: {}", path.display());
                return Some(font);
            }
            Err(e) => tracing::warn!("Unusable font {}: {}", path.display(), e),
        }
    }

    None
}

/// Copy `frame` and draw every label onto it.
///
/// Without a font the copy is returned unannotated.
pub fn annotate(
    frame: &RgbImage,
    labels: &[Label],
    layout: &LabelLayout,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = frame.clone();

    let Some(font) = font else {
        tracing::warn!("No label font available, writing the result image without labels");
        return canvas;
    };

    let color = Rgb(layout.color);
    // draw_text_mut takes the top edge; labels are anchored at the baseline
    let ascent = (layout.font_scale * 0.75).round() as i32;
    for label in labels {
        draw_text_mut(
            &mut canvas,
            color,
            label.x,
            label.y - ascent,
            layout.font_scale,
            font,
            &label.text,
        );
    }

    canvas
}
