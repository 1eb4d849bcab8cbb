use crate::error::ConfigError;
use crate::reconcile::StatField;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Axis-aligned pixel rectangle `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Horizontal slice `[start, end)` of a player strip. `end: None` runs to the
/// strip's right edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpan {
    pub start: u32,
    pub end: Option<u32>,
}

impl FieldSpan {
    pub const fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub const fn to_edge(start: u32) -> Self {
        Self { start, end: None }
    }

    /// Resolve to `(x, width)` inside a strip of the given width
    pub fn resolve(&self, strip_width: u32) -> (u32, u32) {
        let start = self.start.min(strip_width);
        let end = self.end.unwrap_or(strip_width).clamp(start, strip_width);
        (start, end - start)
    }
}

/// Stat column spans, relative to the left edge of a strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSpans {
    pub score: FieldSpan,
    pub goals: FieldSpan,
    pub assists: FieldSpan,
    pub saves: FieldSpan,
    pub shots: FieldSpan,
}

impl StatSpans {
    pub fn get(&self, field: StatField) -> FieldSpan {
        match field {
            StatField::Score => self.score,
            StatField::Goals => self.goals,
            StatField::Assists => self.assists,
            StatField::Saves => self.saves,
            StatField::Shots => self.shots,
        }
    }
}

impl Default for StatSpans {
    fn default() -> Self {
        Self {
            score: FieldSpan::new(330, 395),
            goals: FieldSpan::new(425, 480),
            assists: FieldSpan::new(515, 560),
            saves: FieldSpan::new(605, 650),
            shots: FieldSpan::to_edge(690),
        }
    }
}

/// Fixed geometry of one scoreboard UI layout.
///
/// All coordinates assume the frame has already been resized to
/// `frame_width` x `frame_height`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreboardLayout {
    pub frame_width: u32,
    pub frame_height: u32,

    /// Scoreboard bounding box within the frame
    pub region: Rect,

    /// Top edge of each player strip, relative to the region, top to bottom.
    /// Spacing is uneven because of the gap between the two teams.
    pub strip_offsets: Vec<u32>,
    pub strip_width: u32,
    pub strip_height: u32,

    pub name: FieldSpan,
    /// Rows of the strip kept for name recognition
    pub name_height: u32,

    pub stats: StatSpans,
}

impl Default for ScoreboardLayout {
    fn default() -> Self {
        Self {
            frame_width: 1920,
            frame_height: 1080,
            region: Rect::new(725, 275, 730, 355),
            strip_offsets: vec![0, 60, 107, 235, 282, 332],
            strip_width: 725,
            strip_height: 35,
            name: FieldSpan::new(0, 290),
            name_height: 27,
            stats: StatSpans::default(),
        }
    }
}

impl ScoreboardLayout {
    /// Rectangle actually cropped out of the frame.
    ///
    /// Extends below `region` when the lowest strip overhangs it, so every
    /// strip keeps its full height. Clamped to the frame.
    pub fn crop_rect(&self) -> Rect {
        let height = self.region.height.max(self.strips_bottom());
        let height = height.min(self.frame_height.saturating_sub(self.region.y));
        let width = self.region.width.min(self.frame_width.saturating_sub(self.region.x));
        Rect::new(self.region.x, self.region.y, width, height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.frame_width as f64 / self.frame_height as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid("frame size must be non-zero".into()));
        }
        if self.region.right() > self.frame_width || self.region.bottom() > self.frame_height {
            return Err(ConfigError::Invalid(format!(
                "scoreboard region {:?} lies outside the {}x{} frame",
                self.region, self.frame_width, self.frame_height
            )));
        }
        if self.strip_offsets.is_empty() {
            return Err(ConfigError::Invalid("strip table is empty".into()));
        }
        if self.strip_width == 0 || self.strip_height == 0 {
            return Err(ConfigError::Invalid("strip size must be non-zero".into()));
        }
        if self.strip_width > self.region.width {
            return Err(ConfigError::Invalid(format!(
                "strip width {} exceeds region width {}",
                self.strip_width, self.region.width
            )));
        }
        if self.crop_rect().height < self.strips_bottom() {
            return Err(ConfigError::Invalid(
                "lowest strip runs past the bottom of the frame".into(),
            ));
        }
        if self.name_height == 0 || self.name_height > self.strip_height {
            return Err(ConfigError::Invalid(format!(
                "name height {} must be within 1..={}",
                self.name_height, self.strip_height
            )));
        }

        let spans = std::iter::once(("name", self.name)).chain(
            StatField::ALL
                .iter()
                .map(|field| (field.label(), self.stats.get(*field))),
        );
        for (label, span) in spans {
            let (_, width) = span.resolve(self.strip_width);
            if width == 0 || span.end.is_some_and(|end| end > self.strip_width) {
                return Err(ConfigError::Invalid(format!(
                    "{} span {:?} does not fit in a strip of width {}",
                    label, span, self.strip_width
                )));
            }
        }

        Ok(())
    }

    fn strips_bottom(&self) -> u32 {
        self.strip_offsets
            .iter()
            .map(|offset| offset + self.strip_height)
            .max()
            .unwrap_or(0)
    }
}

/// Image enhancement parameters, tuned for the scoreboard font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Gaussian sigma; 0.8 is what a 3x3 kernel implies
    pub blur_sigma: f32,
    /// Adaptive threshold block radius (block size = 2r + 1)
    pub threshold_block_radius: u32,
    /// A pixel is foreground when brighter than `local mean - threshold_offset`;
    /// -2 demands at least mean + 3
    pub threshold_offset: i32,
    pub upscale_factor: u32,
    /// Erode/dilate radius; 0 is a 1x1 kernel
    pub morph_radius: u8,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            blur_sigma: 0.8,
            threshold_block_radius: 2,
            threshold_offset: -2,
            upscale_factor: 2,
            morph_radius: 0,
        }
    }
}

impl NormalizerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blur_sigma <= 0.0 {
            return Err(ConfigError::Invalid("blur sigma must be positive".into()));
        }
        if self.threshold_block_radius == 0 {
            return Err(ConfigError::Invalid(
                "threshold block radius must be positive".into(),
            ));
        }
        if self.upscale_factor == 0 {
            return Err(ConfigError::Invalid("upscale factor must be positive".into()));
        }
        if self.canny_low > self.canny_high {
            return Err(ConfigError::Invalid(format!(
                "canny low threshold {} exceeds high threshold {}",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }
}

/// Where result labels go on the annotated image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelLayout {
    pub name_x: i32,
    /// x for score, goals, assists, saves, shots
    pub stat_x: [i32; 5],
    pub origin_y: i32,
    pub row_step: i32,
    pub color: [u8; 3],
    pub font_scale: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            name_x: 450,
            stat_x: [950, 1130, 1260, 1370, 1500],
            origin_y: 200,
            row_step: 20,
            color: [0, 255, 0],
            font_scale: 16.0,
            font_path: None,
        }
    }
}

impl LabelLayout {
    /// Baseline y of the labels for a strip
    pub fn row_y(&self, strip_index: usize) -> i32 {
        self.origin_y + self.row_step * strip_index as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub language: String,
    /// Tesseract data directory; `None` uses the system installation
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tessdata_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: ScoreboardLayout,
    pub normalizer: NormalizerSettings,
    pub labels: LabelLayout,
    pub ocr: OcrSettings,

    /// Allowed relative deviation from the layout's aspect ratio
    pub aspect_tolerance: f64,

    /// Directory (under the output root) receiving the player JSON
    pub json_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: ScoreboardLayout::default(),
            normalizer: NormalizerSettings::default(),
            labels: LabelLayout::default(),
            ocr: OcrSettings::default(),
            aspect_tolerance: 0.02,
            json_dir: "JSON".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?;
                let config: Config =
                    serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.display().to_string(),
                        source: Box::new(e),
                    })?;
                tracing::info!("Loaded config from: {}", path.display());
                config
            }
            None => Config::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.normalizer.validate()?;
        if self.aspect_tolerance.is_nan() || self.aspect_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "aspect tolerance must be non-negative".into(),
            ));
        }
        if self.json_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("json_dir must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.layout.region, Rect::new(725, 275, 730, 355));
        assert_eq!(config.layout.strip_offsets, vec![0, 60, 107, 235, 282, 332]);
        assert_eq!(config.layout.strip_height, 35);
        assert_eq!(config.normalizer.threshold_block_radius * 2 + 1, 5);
        assert_eq!(config.normalizer.threshold_offset, -2);
        assert_eq!(config.json_dir, "JSON");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stat_spans_are_strip_relative() {
        let layout = ScoreboardLayout::default();
        assert_eq!(layout.stats.score.resolve(layout.strip_width), (330, 65));
        assert_eq!(layout.stats.goals.resolve(layout.strip_width), (425, 55));
        assert_eq!(layout.stats.assists.resolve(layout.strip_width), (515, 45));
        assert_eq!(layout.stats.saves.resolve(layout.strip_width), (605, 45));
        assert_eq!(layout.stats.shots.resolve(layout.strip_width), (690, 35));
        assert_eq!(layout.name.resolve(layout.strip_width), (0, 290));
    }

    #[test]
    fn test_crop_rect_covers_lowest_strip() {
        let layout = ScoreboardLayout::default();
        let crop = layout.crop_rect();
        assert_eq!(crop.x, 725);
        assert_eq!(crop.y, 275);
        assert_eq!(crop.width, 730);
        assert_eq!(crop.height, 332 + 35);
    }

    #[test]
    fn test_validate_rejects_bad_layouts() {
        let mut layout = ScoreboardLayout::default();
        layout.strip_offsets.clear();
        assert!(layout.validate().is_err());

        let mut layout = ScoreboardLayout::default();
        layout.stats.goals = FieldSpan::new(700, 800);
        assert!(layout.validate().is_err());

        let mut layout = ScoreboardLayout::default();
        layout.region = Rect::new(1500, 275, 730, 355);
        assert!(layout.validate().is_err());

        let mut layout = ScoreboardLayout::default();
        layout.name_height = 40;
        assert!(layout.validate().is_err());

        let mut settings = NormalizerSettings::default();
        settings.blur_sigma = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "aspect_tolerance": 0.1, "layout": { "strip_height": 30 } }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.aspect_tolerance, 0.1);
        assert_eq!(config.layout.strip_height, 30);
        assert_eq!(config.layout.strip_offsets.len(), 6);
        assert_eq!(config.labels.origin_y, 200);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load(Some(Path::new("/nonexistent/scoreboard.json")));
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_label_rows() {
        let labels = LabelLayout::default();
        assert_eq!(labels.row_y(0), 200);
        assert_eq!(labels.row_y(5), 300);
    }
}
