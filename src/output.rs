/// Run output
///
/// Owns every side effect of a run: the annotated image, the players JSON
/// file and the JSON copy on stdout.
use crate::error::OutputError;
use crate::reconcile::PlayerRecords;
use image::RgbImage;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a run's files go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub json_dir: PathBuf,
    pub json: PathBuf,
}

impl OutputPaths {
    /// Derive output paths from the input file name.
    ///
    /// Image: `<root>/scoreboard_result<file name>`.
    /// JSON: `<root>/<json_dir>/players_<stem>.json`, where the stem drops a
    /// trailing ".png", then a trailing ".jpg" (case-sensitive).
    pub fn for_input(input: &Path, root: &Path, json_dir: &str) -> Result<Self, OutputError> {
        let file_name = input
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| OutputError::NoFileName(input.display().to_string()))?;

        let stem = file_name.strip_suffix(".png").unwrap_or(file_name);
        let stem = stem.strip_suffix(".jpg").unwrap_or(stem);

        let json_dir = root.join(json_dir);
        Ok(Self {
            image: root.join(format!("scoreboard_result{}", file_name)),
            json: json_dir.join(format!("players_{}.json", stem)),
            json_dir,
        })
    }
}

/// Records as a single-line JSON object
pub fn to_compact_json(records: &PlayerRecords) -> Result<String, OutputError> {
    serde_json::to_string(records).map_err(OutputError::SerializeFailed)
}

/// Records as JSON indented by four spaces
pub fn to_pretty_json(records: &PlayerRecords) -> Result<String, OutputError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    records
        .serialize(&mut serializer)
        .map_err(OutputError::SerializeFailed)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the annotated image and the players JSON file.
///
/// Both payloads are rendered before anything touches the disk. If a write
/// fails, whatever this call already put on disk is removed again.
pub fn write_outputs(
    paths: &OutputPaths,
    annotated: &RgbImage,
    records: &PlayerRecords,
) -> Result<(), OutputError> {
    let json = to_pretty_json(records)?;
    let created_dir = !paths.json_dir.is_dir();

    fs::create_dir_all(&paths.json_dir).map_err(|e| OutputError::DirectoryCreationFailed {
        path: paths.json_dir.display().to_string(),
        source: e,
    })?;

    if let Err(e) = annotated.save(&paths.image) {
        remove_partial_outputs(paths, created_dir);
        return Err(OutputError::ImageWriteFailed {
            path: paths.image.display().to_string(),
            source: e,
        });
    }
    tracing::info!("✓ Annotated image written to {}", paths.image.display());

    if let Err(e) = fs::write(&paths.json, json) {
        remove_partial_outputs(paths, created_dir);
        return Err(OutputError::JsonWriteFailed {
            path: paths.json.display().to_string(),
            source: e,
        });
    }
    tracing::info!("✓ Player JSON written to {}", paths.json.display());

    Ok(())
}

fn remove_partial_outputs(paths: &OutputPaths, created_dir: bool) {
    for file in [&paths.image, &paths.json] {
        match fs::remove_file(file) {
            Ok(()) => tracing::warn!("Removed partial output {}", file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove partial output {}: {}", file.display(), e),
        }
    }

    if created_dir {
        if let Err(e) = fs::remove_dir(&paths.json_dir) {
            tracing::warn!("Failed to remove {}: {}", paths.json_dir.display(), e);
        }
    }
}

/// Emit the compact JSON document, without a trailing newline
pub fn emit_json<W: Write>(out: &mut W, records: &PlayerRecords) -> Result<(), OutputError> {
    let json = to_compact_json(records)?;
    out.write_all(json.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| OutputError::JsonWriteFailed {
            path: "<stdout>".to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile, FieldTexts};

    fn sample_records() -> PlayerRecords {
        let texts = FieldTexts {
            name: "Merc".to_string(),
            score: "0".to_string(),
            goals: "1".to_string(),
            ..FieldTexts::default()
        };
        reconcile(PlayerRecords::new(), &texts, 0)
    }

    #[test]
    fn test_paths_for_png() {
        let paths = OutputPaths::for_input(Path::new("shots/match.png"), Path::new("."), "JSON").unwrap();
        assert_eq!(paths.image, Path::new("./scoreboard_resultmatch.png"));
        assert_eq!(paths.json, Path::new("./JSON/players_match.json"));
        assert_eq!(paths.json_dir, Path::new("./JSON"));
    }

    #[test]
    fn test_paths_for_jpg_and_case() {
        let paths = OutputPaths::for_input(Path::new("match.jpg"), Path::new("out"), "JSON").unwrap();
        assert_eq!(paths.json, Path::new("out/JSON/players_match.json"));

        // Only lowercase extensions are stripped
        let paths = OutputPaths::for_input(Path::new("match.PNG"), Path::new("out"), "JSON").unwrap();
        assert_eq!(paths.json, Path::new("out/JSON/players_match.PNG.json"));
        assert_eq!(paths.image, Path::new("out/scoreboard_resultmatch.PNG"));
    }

    #[test]
    fn test_paths_require_file_name() {
        assert!(OutputPaths::for_input(Path::new("/"), Path::new("."), "JSON").is_err());
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let json = to_pretty_json(&sample_records()).unwrap();
        assert!(json.starts_with("{\n    \"Merc\": [\n        \"0\","));
        let parsed: PlayerRecords = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample_records());
    }

    #[test]
    fn test_emit_json_is_single_line() {
        let mut out = Vec::new();
        emit_json(&mut out, &sample_records()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, r#"{"Merc":["0","1","-1","-1","-1"]}"#);
    }

    #[test]
    fn test_write_outputs_creates_json_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_input(Path::new("game.png"), dir.path(), "JSON").unwrap();
        let image = RgbImage::new(16, 9);

        write_outputs(&paths, &image, &sample_records()).unwrap();

        assert!(paths.image.exists());
        let written = fs::read_to_string(&paths.json).unwrap();
        let parsed: PlayerRecords = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample_records());
    }

    #[test]
    fn test_failed_json_write_removes_image() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_input(Path::new("game.png"), dir.path(), "JSON").unwrap();
        // A directory squatting on the JSON path makes the write fail
        fs::create_dir_all(&paths.json).unwrap();

        let result = write_outputs(&paths, &RgbImage::new(16, 9), &sample_records());

        assert!(matches!(result, Err(OutputError::JsonWriteFailed { .. })));
        assert!(!paths.image.exists());
        assert!(paths.json.is_dir());
    }

    #[test]
    fn test_failed_json_write_removes_created_dir() {
        let dir = tempfile::tempdir().unwrap();
        let json_dir = dir.path().join("JSON");
        let paths = OutputPaths {
            image: dir.path().join("scoreboard_resultgame.png"),
            json: json_dir.join("missing").join("players_game.json"),
            json_dir,
        };

        let result = write_outputs(&paths, &RgbImage::new(16, 9), &sample_records());

        assert!(matches!(result, Err(OutputError::JsonWriteFailed { .. })));
        assert!(!paths.image.exists());
        assert!(!paths.json_dir.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
