/// Scoreboard decoding pipeline
///
/// Orchestrates one run:
/// 1. Segment the frame into scoreboard strips
/// 2. Normalize each field of a strip
/// 3. Run OCR per field
/// 4. Fold the strip's text into the player records
///
/// Strips are processed strictly in order; the record map is threaded through
/// the loop as an accumulator and returned at the end.
use crate::config::Config;
use crate::error::OcrError;
use crate::frame::Frame;
use crate::ocr::{FieldNormalizer, OcrMode, TextRecognizer};
use crate::reconcile::{self, FieldTexts, PlayerRecords, StatField, StatLine};
use crate::segment::Segmenter;
use image::GrayImage;

/// What was read from one strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripReading {
    pub strip_index: usize,
    pub texts: FieldTexts,
    /// Key the strip was reconciled under
    pub key: String,
    /// Name to show on the annotated image
    pub display_name: String,
    /// The record under `key` right after this strip was reconciled
    pub stats: StatLine,
}

/// Result of a full run
#[derive(Debug, Clone, Default)]
pub struct ScoreboardReading {
    pub records: PlayerRecords,
    pub strips: Vec<StripReading>,
}

pub struct ScoreboardReader<'c, R> {
    config: &'c Config,
    normalizer: FieldNormalizer,
    recognizer: R,
}

impl<'c, R: TextRecognizer> ScoreboardReader<'c, R> {
    pub fn new(config: &'c Config, recognizer: R) -> Self {
        Self {
            config,
            normalizer: FieldNormalizer::new(config.normalizer.clone()),
            recognizer,
        }
    }

    pub fn into_recognizer(self) -> R {
        self.recognizer
    }

    /// Decode every strip of the frame.
    ///
    /// Fails only if the OCR engine itself fails; unreadable fields just stay
    /// at their previous value.
    pub fn read(&mut self, frame: &Frame) -> Result<ScoreboardReading, OcrError> {
        let config = self.config;
        let segmenter = Segmenter::new(&config.layout, &config.normalizer);
        let scoreboard = segmenter.segment(frame);

        let mut strips = segmenter
            .strips(&scoreboard.gray)
            .zip(segmenter.strips(&scoreboard.edges));

        let reading = strips.try_fold(
            ScoreboardReading::default(),
            |mut acc, ((index, strip_gray), (_, strip_edges))| {
                let texts = self.read_strip(index, &strip_gray, &strip_edges)?;
                acc.records = reconcile::reconcile(acc.records, &texts, index);
                let key = reconcile::record_key(&texts.name, index);
                let stats = acc.records.get(&key).cloned().unwrap_or_default();
                acc.strips.push(StripReading {
                    strip_index: index,
                    display_name: reconcile::display_identity(&texts.name, index),
                    key,
                    stats,
                    texts,
                });
                Ok::<_, OcrError>(acc)
            },
        )?;

        tracing::info!(
            "Decoded {} strips into {} player records",
            reading.strips.len(),
            reading.records.len()
        );

        Ok(reading)
    }

    fn read_strip(
        &mut self,
        index: usize,
        strip_gray: &GrayImage,
        strip_edges: &GrayImage,
    ) -> Result<FieldTexts, OcrError> {
        let layout = &self.config.layout;

        let name_img = self
            .normalizer
            .normalize_name(strip_edges, layout.name, layout.name_height);
        let mut texts = FieldTexts {
            name: self.recognizer.recognize(&name_img, OcrMode::Name)?,
            ..FieldTexts::default()
        };

        let thresholded = self.normalizer.threshold_strip(strip_gray);
        for field in StatField::ALL {
            let field_img = self
                .normalizer
                .normalize_numeric_field(&thresholded, layout.stats.get(field));
            *texts.stat_mut(field) = self
                .recognizer
                .recognize(&field_img, OcrMode::for_stat(field))?;
        }

        tracing::debug!(strip = index, name = %texts.name, "strip read");
        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::collections::VecDeque;

    /// Hands out canned answers in call order and records the modes asked for
    struct Scripted {
        answers: VecDeque<String>,
        modes: Vec<OcrMode>,
        sizes: Vec<(u32, u32)>,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|s| s.to_string()).collect(),
                modes: Vec::new(),
                sizes: Vec::new(),
            }
        }
    }

    impl TextRecognizer for Scripted {
        fn recognize(&mut self, image: &GrayImage, mode: OcrMode) -> Result<String, OcrError> {
            self.modes.push(mode);
            self.sizes.push(image.dimensions());
            Ok(self.answers.pop_front().unwrap_or_default())
        }
    }

    struct Broken;

    impl TextRecognizer for Broken {
        fn recognize(&mut self, _: &GrayImage, _: OcrMode) -> Result<String, OcrError> {
            Err(OcrError::RecognitionFailed("engine crashed".into()))
        }
    }

    fn black_frame(config: &Config) -> Frame {
        Frame::from_rgb(RgbImage::from_pixel(1920, 1080, Rgb([0, 0, 0])), &config.layout, 0.02).unwrap()
    }

    #[test]
    fn test_six_fields_per_strip_in_order() {
        let config = Config::default();
        let mut reader = ScoreboardReader::new(&config, Scripted::new(&[]));
        let reading = reader.read(&black_frame(&config)).unwrap();
        let recognizer = reader.into_recognizer();

        assert_eq!(recognizer.modes.len(), 36);
        for row in recognizer.modes.chunks(6) {
            assert_eq!(
                row,
                &[
                    OcrMode::Name,
                    OcrMode::Number,
                    OcrMode::Glyph,
                    OcrMode::Glyph,
                    OcrMode::Glyph,
                    OcrMode::Glyph
                ]
            );
        }
        assert_eq!(recognizer.sizes[0], (290, 27));
        assert_eq!(recognizer.sizes[1], (130, 70));
        assert_eq!(recognizer.sizes[5], (70, 70));

        assert_eq!(reading.strips.len(), 6);
        assert_eq!(reading.records.len(), 6);
        for (index, key) in reading.records.keys().enumerate() {
            assert_eq!(key, format!("Unknown Player {}", index + 1));
        }
    }

    #[test]
    fn test_collision_across_strips() {
        let config = Config::default();
        let mut answers = vec!["Alice Smith", "3", "1", "0", "2", "4"];
        answers.extend(["Alice Jones", "7", "", "", "", ""]);
        let mut reader = ScoreboardReader::new(&config, Scripted::new(&answers));
        let reading = reader.read(&black_frame(&config)).unwrap();

        let alice = reading.records.get("Alice").unwrap();
        assert_eq!(alice.score, "7");
        assert_eq!(alice.goals, "1");
        assert_eq!(alice.assists, "0");

        // Both strips point at the shared record but keep their own label
        assert_eq!(reading.strips[0].key, "Alice");
        assert_eq!(reading.strips[0].display_name, "Alice Smith");
        assert_eq!(reading.strips[1].display_name, "Alice Jones");

        // Each strip keeps the record as it stood after its own update
        assert_eq!(reading.strips[0].stats.score, "3");
        assert_eq!(reading.strips[0].stats.shots, "4");
        assert_eq!(reading.strips[1].stats, *alice);

        // Alice + four unnamed strips
        assert_eq!(reading.records.len(), 5);
    }

    #[test]
    fn test_engine_failure_aborts_run() {
        let config = Config::default();
        let mut reader = ScoreboardReader::new(&config, Broken);
        assert!(reader.read(&black_frame(&config)).is_err());
    }
}
