/// Tesseract OCR detection
///
/// Owns the Tesseract instance. Page segmentation mode and character
/// whitelist are set per call, since one scoreboard row needs three
/// different configurations.
use super::{OcrMode, TextRecognizer};
use crate::config::OcrSettings;
use crate::error::OcrError;
use image::{GrayImage, ImageFormat};
use leptess::{LepTess, Variable};
use std::io::Cursor;

/// Tesseract-backed recognizer
pub struct TesseractEngine {
    tess: LepTess,
    mode: Option<OcrMode>,
}

impl TesseractEngine {
    /// Initialize Tesseract.
    ///
    /// Fails if the library or the language data cannot be found; the caller
    /// treats that as fatal.
    pub fn new(settings: &OcrSettings) -> Result<Self, OcrError> {
        tracing::info!("Initializing Tesseract OCR...");

        let datapath = settings
            .tessdata_dir
            .as_ref()
            .and_then(|p| p.to_str().map(|s| s.to_string()));

        let tess = match datapath.as_deref() {
            Some(path) => {
                tracing::info!("Initializing Tesseract with datapath: {}", path);
                LepTess::new(Some(path), &settings.language)
            }
            None => LepTess::new(None, &settings.language),
        }
        .map_err(|e| OcrError::InitFailed(format!("{:?}", e).into()))?;

        tracing::info!("✓ Tesseract OCR initialized (lang: {})", settings.language);

        Ok(Self { tess, mode: None })
    }

    fn apply_mode(&mut self, mode: OcrMode) -> Result<(), OcrError> {
        if self.mode == Some(mode) {
            return Ok(());
        }

        self.tess
            .set_variable(Variable::TesseditPagesegMode, mode.page_seg_mode())
            .map_err(|e| OcrError::ConfigureFailed(format!("page segmentation mode: {:?}", e)))?;
        self.tess
            .set_variable(Variable::TesseditCharWhitelist, mode.whitelist())
            .map_err(|e| OcrError::ConfigureFailed(format!("character whitelist: {:?}", e)))?;

        self.mode = Some(mode);
        Ok(())
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&mut self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError> {
        self.apply_mode(mode)?;

        // leptess takes encoded image bytes, not raw pixels
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::RecognitionFailed(Box::new(e)))?;

        self.tess
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::RecognitionFailed(format!("{:?}", e).into()))?;
        self.tess.set_source_resolution(300);

        let text = self
            .tess
            .get_utf8_text()
            .map_err(|e| OcrError::RecognitionFailed(e.to_string().into()))?;
        let text = text.trim().to_string();

        tracing::debug!("[ocr-detect][{:?}] {:?}", mode, text);

        Ok(text)
    }
}
