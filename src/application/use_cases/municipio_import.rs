// ============================================================
// MUNICIPIO IMPORT USE CASE
// ============================================================
// Orchestrate encoding detection, format sniffing, line parsing, and the
// full-replace write of the municipality table

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::error::{AppError, Result};
use crate::domain::municipio::{ImportConfig, ImportReport, ImportStage};
use crate::infrastructure::csv::{physical_lines, EncodingDetector, FormatSniffer, LineParser};
use crate::infrastructure::db::municipios::MunicipioSink;
use crate::shared::import_log::ImportLog;

/// Import coordinator for municipality reference files
pub struct MunicipioImporter {
    sink: Arc<dyn MunicipioSink>,
    config: ImportConfig,
}

impl MunicipioImporter {
    pub fn new(sink: Arc<dyn MunicipioSink>, config: ImportConfig) -> Self {
        Self { sink, config }
    }

    /// Import a file, replacing the whole table.
    ///
    /// Never returns an error: fatal failures come back as a report with
    /// `success == false`, `imported == 0` and the reason in `failure`.
    pub async fn import_file(&self, path: &Path, log: &mut ImportLog) -> ImportReport {
        let start = Instant::now();
        let mut report = ImportReport::default();

        log.info(&format!("Starting municipality import: {}", path.display()));

        if let Err(e) = self.run(path, log, &mut report).await {
            log.error(&format!("Import aborted at {}: {}", report.stage, e));
            return ImportReport {
                encoding: report.encoding,
                format: report.format,
                ..ImportReport::aborted(e.to_string())
            };
        }

        report.success = report.imported > 0;
        report.stage = ImportStage::Done;

        log.info(&format!(
            "Import finished in {} ms: {} imported, {} errors",
            start.elapsed().as_millis(),
            report.imported,
            report.errors
        ));
        if report.errors > 0 {
            log.warn(&format!("{} lines rejected during import", report.errors));
        }

        report
    }

    async fn run(&self, path: &Path, log: &mut ImportLog, report: &mut ImportReport) -> Result<()> {
        self.config
            .validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid import config: {}", e)))?;

        let raw = read_source(path).await?;

        // ENCODING_DETECTED
        let sample = &raw[..raw.len().min(self.config.sample_bytes)];
        let guess = EncodingDetector::detect(sample);
        log.info(&format!(
            "Encoding detected: {} (confidence {:.2}%)",
            guess.encoding.name(),
            guess.confidence * 100.0
        ));
        if guess.confidence < self.config.confidence_threshold {
            log.warn(&format!(
                "Low confidence for {}; fallback encodings will be tried",
                guess.encoding.name()
            ));
        }
        report.stage = ImportStage::EncodingDetected;

        // FORMAT_SNIFFED
        let candidates =
            EncodingDetector::candidates(Some(guess.encoding), &self.config.fallback_encodings);
        let outcome = FormatSniffer::new(&self.config).select(&raw, &candidates)?;
        for rejected in &outcome.rejected {
            log.warn(&format!("Candidate rejected: {}", rejected));
        }
        let descriptor = outcome.descriptor;
        log.info(&format!("Format detected: {}", descriptor));
        report.encoding = Some(descriptor.encoding.name().to_string());
        report.format = Some(descriptor.layout.to_string());
        report.stage = ImportStage::FormatSniffed;

        // TABLE_PREPARED
        let mut batch = self.sink.begin_replace().await?;
        log.info("Municipality table prepared; existing rows cleared");
        report.stage = ImportStage::TablePrepared;

        // LINES_PROCESSED
        let parser = LineParser::new(descriptor.layout);
        for (index, line) in physical_lines(&outcome.text).enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            report.total_lines += 1;

            match parser.parse(line) {
                Ok(record) => {
                    batch.upsert(&record).await?;
                    report.imported += 1;
                    if self.config.progress_every > 0
                        && report.imported % self.config.progress_every == 0
                    {
                        log.info(&format!("Processed {} municipalities...", report.imported));
                    }
                }
                Err(err) => {
                    let err = err.at_line(index + 1);
                    log.warn(&err.to_string());
                    report.errors += 1;
                    let keep = self
                        .config
                        .max_logged_errors
                        .map_or(true, |cap| report.messages.len() < cap);
                    if keep {
                        report.messages.push(err.to_string());
                    }
                }
            }
        }
        report.stage = ImportStage::LinesProcessed;

        // COMMITTED
        batch.commit().await?;
        report.stage = ImportStage::Committed;

        Ok(())
    }
}

async fn read_source(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(raw),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::FileNotFound(path.display().to_string()))
        }
        Err(e) => Err(AppError::IoError(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
