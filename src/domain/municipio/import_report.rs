// ============================================================
// IMPORT REPORT
// ============================================================
// Outcome of one import call plus the recoverable per-line errors

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Field;

/// Import progress, linear with an aborted terminal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStage {
    #[default]
    Start,
    EncodingDetected,
    FormatSniffed,
    TablePrepared,
    LinesProcessed,
    Committed,
    Done,
    Aborted,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportStage::Start => "START",
            ImportStage::EncodingDetected => "ENCODING_DETECTED",
            ImportStage::FormatSniffed => "FORMAT_SNIFFED",
            ImportStage::TablePrepared => "TABLE_PREPARED",
            ImportStage::LinesProcessed => "LINES_PROCESSED",
            ImportStage::Committed => "COMMITTED",
            ImportStage::Done => "DONE",
            ImportStage::Aborted => "ABORTED",
        };
        write!(f, "{}", label)
    }
}

/// Why a single line was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineErrorKind {
    FieldCount { delimiter: char, found: usize },
    MissingTag(String),
    EmptyField(Field),
    InvalidUf(String),
}

impl fmt::Display for LineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineErrorKind::FieldCount { delimiter, found } => write!(
                f,
                "expected 3 fields separated by '{}', found {}",
                delimiter, found
            ),
            LineErrorKind::MissingTag(tag) => write!(f, "missing tag {}", tag),
            LineErrorKind::EmptyField(field) => write!(f, "empty {} field", field.label()),
            LineErrorKind::InvalidUf(uf) => {
                write!(f, "invalid UF '{}' (expected 2 letters)", uf)
            }
        }
    }
}

/// A malformed line; skipped and counted, never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineError {
    /// 1-based physical line number (0 when unknown)
    pub line_number: usize,
    pub line: String,
    pub kind: LineErrorKind,
}

impl LineError {
    pub fn new(line: &str, kind: LineErrorKind) -> Self {
        Self {
            line_number: 0,
            line: line.to_string(),
            kind,
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}: {}", self.line_number, self.kind, self.line)
    }
}

impl std::error::Error for LineError {}

/// Structured result of an import call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Non-blank lines examined
    pub total_lines: usize,

    /// Records written (upserts that replaced a duplicate key included)
    pub imported: usize,

    /// Rejected lines
    pub errors: usize,

    /// True iff at least one record was imported
    pub success: bool,

    /// Encoding used for the line pass
    pub encoding: Option<String>,

    /// Detected layout
    pub format: Option<String>,

    /// Last stage reached
    pub stage: ImportStage,

    /// Fatal reason, when the import aborted
    pub failure: Option<String>,

    /// One entry per rejected line (possibly capped)
    pub messages: Vec<String>,
}

impl ImportReport {
    /// Report for an import that aborted; nothing was written
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            stage: ImportStage::Aborted,
            failure: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Human-readable one-line outcome
    pub fn summary(&self) -> String {
        if let Some(reason) = &self.failure {
            return format!("Import failed: {}", reason);
        }
        if self.success {
            format!(
                "{} municipalities imported ({} lines, {} errors)",
                self.imported, self.total_lines, self.errors
            )
        } else {
            format!(
                "No municipalities imported ({} lines, {} errors); check the file format",
                self.total_lines, self.errors
            )
        }
    }
}
