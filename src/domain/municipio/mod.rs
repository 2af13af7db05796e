// ============================================================
// MUNICIPIO DOMAIN LAYER
// ============================================================
// Core types for the municipality reference table and its import pipeline
// No I/O, no async

mod format;
mod import_config;
mod import_report;
mod record;

pub use format::{Delimiter, Field, FieldOrder, FormatDescriptor, RecordLayout};
pub use import_config::{ImportConfig, DEFAULT_FALLBACK_ENCODINGS};
pub use import_report::{ImportReport, ImportStage, LineError, LineErrorKind};
pub use record::{is_uf_token, MunicipioRecord};

/// Name of the municipality reference table
pub const MUNICIPIO_TABLE: &str = "tb_municipios";
