use anyhow::Context;
use clap::Parser;
use rl_scoreboard_ocr::{output, process_screenshot, AppResult, Config, TesseractEngine};
use std::path::{Path, PathBuf};

const LOG_TARGET_STARTUP: &str = "rl_scoreboard_ocr::startup";

#[derive(Parser)]
#[command(name = "rl-scoreboard-ocr")]
#[command(
    about = "Reads a post-match scoreboard screenshot and extracts player stats.",
    after_help = "1920x1080 resolution, 16:9 aspect ratio required. .png or .jpg format only."
)]
struct Cli {
    /// Path to the screenshot file
    #[arg(short = 'f', long)]
    filename: PathBuf,

    /// Optional JSON file overriding layout and tuning defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Initialize tracing
///
/// Logs go to stderr (stdout carries the JSON result) and to a daily-rotated
/// file in the user config folder:
/// - macOS: ~/Library/Application Support/RLScoreboardOCR/logs/
/// - Windows: %APPDATA%/RLScoreboardOCR/logs/
/// - Linux: ~/.config/RLScoreboardOCR/logs/
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("RLScoreboardOCR").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "rl-scoreboard-ocr.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(target: LOG_TARGET_STARTUP, "Log directory: {}", log_dir.display());
}

fn main() -> AppResult<()> {
    initialize_tracing();
    let cli = Cli::parse();

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "rl-scoreboard-ocr v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let engine = TesseractEngine::new(&config.ocr).context(
        "Tesseract is required. Install it with `brew install tesseract` (macOS) \
         or `sudo apt-get install tesseract-ocr` (Linux)",
    )?;

    let reading = process_screenshot(&cli.filename, Path::new("."), &config, engine)?;

    let stdout = std::io::stdout();
    output::emit_json(&mut stdout.lock(), &reading.records)?;

    Ok(())
}
