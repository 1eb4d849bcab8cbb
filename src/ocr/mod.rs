/// OCR for scoreboard fields
///
/// The module is split into focused submodules:
/// - `preprocessing`: per-field image normalization (edges for names,
///   threshold + upscale + morphology for numbers)
/// - `detection`: Tesseract integration
///
/// The pipeline only talks to the `TextRecognizer` trait, so the engine can be
/// swapped (or scripted in tests) without touching segmentation or
/// reconciliation.
pub mod detection;
pub mod preprocessing;

pub use detection::TesseractEngine;
pub use preprocessing::FieldNormalizer;

use crate::error::OcrError;
use crate::reconcile::StatField;
use image::GrayImage;

const NAME_WHITELIST: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const DIGIT_WHITELIST: &str = "0123456789";

/// Character set and page segmentation constraint for one recognition call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Alphanumeric, single text line
    Name,
    /// Digits, single word (score column)
    Number,
    /// Digits, single character (goals/assists/saves/shots)
    Glyph,
}

impl OcrMode {
    pub fn for_stat(field: StatField) -> Self {
        match field {
            StatField::Score => OcrMode::Number,
            _ => OcrMode::Glyph,
        }
    }

    /// Tesseract page segmentation mode
    pub fn page_seg_mode(&self) -> &'static str {
        match self {
            OcrMode::Name => "7",
            OcrMode::Number => "8",
            OcrMode::Glyph => "10",
        }
    }

    pub fn whitelist(&self) -> &'static str {
        match self {
            OcrMode::Name => NAME_WHITELIST,
            OcrMode::Number | OcrMode::Glyph => DIGIT_WHITELIST,
        }
    }
}

/// Recognizes text in a normalized field image.
///
/// Returns trimmed text. An empty string means "nothing recognized" and is not
/// an error; `Err` is reserved for engine failures.
pub trait TextRecognizer {
    fn recognize(&mut self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError>;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&mut self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError> {
        (**self).recognize(image, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_per_field() {
        assert_eq!(OcrMode::for_stat(StatField::Score), OcrMode::Number);
        for field in [StatField::Goals, StatField::Assists, StatField::Saves, StatField::Shots] {
            assert_eq!(OcrMode::for_stat(field), OcrMode::Glyph);
        }
    }

    #[test]
    fn test_mode_constraints() {
        assert_eq!(OcrMode::Name.page_seg_mode(), "7");
        assert_eq!(OcrMode::Number.page_seg_mode(), "8");
        assert_eq!(OcrMode::Glyph.page_seg_mode(), "10");

        assert_eq!(OcrMode::Name.whitelist().len(), 62);
        assert!(OcrMode::Number.whitelist().chars().all(|c| c.is_ascii_digit()));
        assert_eq!(OcrMode::Glyph.whitelist(), OcrMode::Number.whitelist());
    }
}
