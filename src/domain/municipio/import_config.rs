// ============================================================
// IMPORT CONFIGURATION
// ============================================================
// Sampling and reporting knobs for municipality file import

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

/// Encoding labels tried after the detected one, in order
pub const DEFAULT_FALLBACK_ENCODINGS: [&str; 4] = ["utf-8", "latin1", "iso-8859-1", "windows-1252"];

/// Configuration for municipality import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Bytes fed to encoding detection (default: 10_000)
    pub sample_bytes: usize,

    /// Lines read from the top of the file when sniffing (default: 10)
    pub sniff_max_lines: usize,

    /// Non-blank lines kept for sniffing (default: 5)
    pub sniff_keep_lines: usize,

    /// Detection confidence below this is logged as a warning (default: 0.7)
    pub confidence_threshold: f32,

    /// Emit a progress entry every N imported records (default: 100, 0 = never)
    pub progress_every: usize,

    /// Cap on rejected-line messages kept in the report (None = keep all)
    pub max_logged_errors: Option<usize>,

    /// WHATWG encoding labels tried after the detected encoding
    pub fallback_encodings: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            sample_bytes: 10_000,
            sniff_max_lines: 10,
            sniff_keep_lines: 5,
            confidence_threshold: 0.7,
            progress_every: 100,
            max_logged_errors: None,
            fallback_encodings: DEFAULT_FALLBACK_ENCODINGS
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }
}

impl ImportConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_bytes == 0 {
            return Err("sample_bytes must be > 0".to_string());
        }
        if self.sniff_max_lines == 0 || self.sniff_keep_lines == 0 {
            return Err("sniff_max_lines and sniff_keep_lines must be > 0".to_string());
        }
        if self.sniff_keep_lines > self.sniff_max_lines {
            return Err("sniff_keep_lines must be <= sniff_max_lines".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.fallback_encodings.is_empty() {
            return Err("fallback_encodings must not be empty".to_string());
        }
        if let Some(label) = self
            .fallback_encodings
            .iter()
            .find(|label| Encoding::for_label(label.trim().as_bytes()).is_none())
        {
            return Err(format!("unknown encoding label: {}", label));
        }
        Ok(())
    }
}
