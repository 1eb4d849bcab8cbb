//! Scoreboard screenshot decoding.
//!
//! Turns a 1920x1080 post-match scoreboard screenshot into per-player stats
//! (score, goals, assists, saves, shots) plus an annotated copy of the image.
//!
//! ```text
//! Frame ──► Segmenter ──► FieldNormalizer ──► TextRecognizer ──► reconcile ──► render / output
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod segment;

use anyhow::Context;
use std::path::Path;

pub use config::Config;
pub use error::AppResult;
pub use frame::Frame;
pub use ocr::{OcrMode, TesseractEngine, TextRecognizer};
pub use output::OutputPaths;
pub use pipeline::{ScoreboardReader, ScoreboardReading};
pub use reconcile::{PlayerRecords, StatLine};

/// Decode one screenshot and write its outputs under `root`.
///
/// Nothing is written unless loading and decoding both succeed.
pub fn process_screenshot<R: TextRecognizer>(
    input: &Path,
    root: &Path,
    config: &Config,
    recognizer: R,
) -> AppResult<ScoreboardReading> {
    let paths = OutputPaths::for_input(input, root, &config.json_dir)?;

    let frame = Frame::open(input, &config.layout, config.aspect_tolerance)
        .with_context(|| format!("Cannot use screenshot {}", input.display()))?;

    let mut reader = ScoreboardReader::new(config, recognizer);
    let reading = reader.read(&frame).context("OCR failed")?;

    let labels = render::build_labels(&reading, &config.labels);
    let font = render::load_font(config.labels.font_path.as_deref());
    let annotated = render::annotate(&frame.color, &labels, &config.labels, font.as_ref());

    output::write_outputs(&paths, &annotated, &reading.records)
        .context("Failed to write results")?;

    Ok(reading)
}
