// ============================================================
// FORMAT SNIFFER
// ============================================================
// Classify a municipality file into one of the known record layouts

use encoding_rs::Encoding;
use std::fmt;

use super::encoding_detector::decode_strict;
use super::line_reader::{physical_lines, split_fields};
use crate::domain::error::AppError;
use crate::domain::municipio::{
    is_uf_token, Delimiter, FieldOrder, FormatDescriptor, ImportConfig, RecordLayout,
};

pub const CODE_TAG: &str = "Código=";
pub const NAME_TAG: &str = "Município=";
pub const UF_TAG: &str = "UF=";
pub const PROCESSING_PREFIX: &str = "Processando: ";

/// Why a sample matched no layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unrecognized {
    /// No non-blank line in the sample
    Empty,

    /// No delimiter and no key-value markers
    NoMarkers(String),

    /// Delimited line without exactly 3 fields
    FieldCount {
        delimiter: char,
        found: usize,
        line: String,
    },

    /// Neither the first nor the last field looks like a UF
    AmbiguousOrder(String),
}

impl fmt::Display for Unrecognized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unrecognized::Empty => write!(f, "file is empty or has no non-blank lines"),
            Unrecognized::NoMarkers(line) => write!(f, "unsupported format: {}", line),
            Unrecognized::FieldCount {
                delimiter,
                found,
                line,
            } => write!(
                f,
                "expected 3 parts separated by '{}', found {}: {}",
                delimiter, found, line
            ),
            Unrecognized::AmbiguousOrder(line) => {
                write!(f, "could not determine column order: {}", line)
            }
        }
    }
}

/// Winning encoding/layout plus the fully decoded text
#[derive(Debug, Clone)]
pub struct SniffOutcome {
    pub descriptor: FormatDescriptor,
    pub text: String,

    /// One entry per rejected candidate, in attempt order
    pub rejected: Vec<String>,
}

/// Format sniffer over a sample of decoded lines
pub struct FormatSniffer {
    max_lines: usize,
    keep_lines: usize,
}

impl Default for FormatSniffer {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl FormatSniffer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            max_lines: config.sniff_max_lines,
            keep_lines: config.sniff_keep_lines,
        }
    }

    /// First non-blank, trimmed lines among the top `max_lines` of `text`
    pub fn sample_lines<'a>(&self, text: &'a str) -> Vec<&'a str> {
        physical_lines(text)
            .take(self.max_lines)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(self.keep_lines)
            .collect()
    }

    /// Classify a sample. Only the first line is inspected; the rest are
    /// validated later, line by line.
    pub fn sniff(sample_lines: &[&str]) -> Result<RecordLayout, Unrecognized> {
        let first = sample_lines
            .iter()
            .map(|line| line.trim())
            .find(|line| !line.is_empty())
            .ok_or(Unrecognized::Empty)?;

        if first.contains(';') {
            Self::sniff_delimited(first, Delimiter::Semicolon)
        } else if first.contains(',') && !first.contains(CODE_TAG) {
            Self::sniff_delimited(first, Delimiter::Comma)
        } else if first.contains(CODE_TAG) && first.contains(NAME_TAG) && first.contains(UF_TAG)
        {
            Ok(RecordLayout::KeyValue)
        } else {
            Err(Unrecognized::NoMarkers(first.to_string()))
        }
    }

    /// Positional heuristic: the UF is a two-letter token at either end
    fn sniff_delimited(line: &str, delimiter: Delimiter) -> Result<RecordLayout, Unrecognized> {
        let parts = split_fields(line, delimiter);
        if parts.len() != 3 {
            return Err(Unrecognized::FieldCount {
                delimiter: delimiter.as_char(),
                found: parts.len(),
                line: line.to_string(),
            });
        }

        let order = if is_uf_token(&parts[0]) {
            FieldOrder::UF_NAME_CODE
        } else if is_uf_token(&parts[2]) {
            FieldOrder::CODE_NAME_UF
        } else {
            return Err(Unrecognized::AmbiguousOrder(line.to_string()));
        };

        Ok(RecordLayout::Delimited { delimiter, order })
    }

    /// Try each candidate encoding until one decodes the file and yields a
    /// recognized layout.
    pub fn select(
        &self,
        raw: &[u8],
        candidates: &[&'static Encoding],
    ) -> Result<SniffOutcome, AppError> {
        let mut rejected = Vec::new();
        let mut last_unrecognized: Option<Unrecognized> = None;

        for &encoding in candidates {
            let Some(text) = decode_strict(encoding, raw) else {
                tracing::warn!(encoding = encoding.name(), "Could not decode file");
                rejected.push(format!("{}: decode failed", encoding.name()));
                continue;
            };

            let sniffed = Self::sniff(&self.sample_lines(&text));
            match sniffed {
                Ok(layout) => {
                    tracing::info!(
                        encoding = encoding.name(),
                        layout = %layout,
                        "Format detected"
                    );
                    return Ok(SniffOutcome {
                        descriptor: FormatDescriptor::new(layout, encoding),
                        text,
                        rejected,
                    });
                }
                Err(reason) => {
                    tracing::warn!(
                        encoding = encoding.name(),
                        reason = %reason,
                        "Format not recognized"
                    );
                    rejected.push(format!("{}: {}", encoding.name(), reason));
                    last_unrecognized = Some(reason);
                }
            }
        }

        match last_unrecognized {
            Some(reason) => Err(AppError::FormatUnrecognized(reason.to_string())),
            None => Err(AppError::EncodingExhausted(format!(
                "tried {}",
                candidates
                    .iter()
                    .map(|e| e.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}
