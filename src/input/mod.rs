pub mod log;

pub use log::{parse, parse_message, parse_single};

use crate::core::{FrameSequence, SavedSession};
use crate::error::ParseError;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Input format detection result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    /// Line-oriented MOT log
    Log,
    /// Saved session JSON document
    Session,
    Unknown,
}

/// Detect the format of an input by looking at its first characters
pub fn detect_format(data: &str) -> InputFormat {
    let trimmed = data.trim_start();
    if trimmed.is_empty() {
        return InputFormat::Unknown;
    }

    // Saved sessions are a single JSON object with a frames list
    if trimmed.starts_with('{') && trimmed.contains("\"sourceType\"") && trimmed.contains("\"frames\"") {
        return InputFormat::Session;
    }

    if trimmed.lines().take(5).any(|line| line.contains('{') || line.contains('[')) {
        return InputFormat::Log;
    }

    InputFormat::Unknown
}

/// Load a replay sequence from a file, auto-detecting format
pub fn load_file(path: impl AsRef<Path>) -> Result<FrameSequence> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let sequence = match detect_format(&content) {
        InputFormat::Session => SavedSession::from_json(&content)
            .with_context(|| format!("Invalid session file {}", path.display()))?
            .into_sequence(),
        InputFormat::Log => parse(&content),
        InputFormat::Unknown => return Err(ParseError::UnknownFormat.into()),
    };

    if sequence.is_empty() {
        return Err(ParseError::NoFrames.into());
    }

    info!(
        "Loaded {} frames ({:.1}s) from {}",
        sequence.len(),
        sequence.duration(),
        path.display()
    );
    Ok(sequence)
}
