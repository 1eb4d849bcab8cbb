use thiserror::Error;

/// Domain errors for the scoreboard pipeline.
///
/// Every variant here is fatal for a run. An empty OCR read is not an error
/// and never shows up in this module.

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to load screenshot: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Screenshot is {width}x{height}, aspect ratio {actual:.3} does not match expected {expected:.3}")]
    AspectRatio {
        width: u32,
        height: u32,
        actual: f64,
        expected: f64,
    },

    #[error("Screenshot has no pixels")]
    Empty,
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine")]
    InitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to configure OCR engine: {0}")]
    ConfigureFailed(String),

    #[error("Failed to perform OCR on image")]
    RecognitionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write annotated image to {path}")]
    ImageWriteFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write player JSON to {path}")]
    JsonWriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize player records")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Input path has no file name: {0}")]
    NoFileName(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
