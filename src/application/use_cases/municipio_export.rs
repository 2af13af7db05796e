// ============================================================
// MUNICIPIO EXPORT USE CASE
// ============================================================
// Render the municipality table as a replayable SQL script or as a
// semicolon file the importer accepts back

use chrono::Local;
use std::sync::Arc;

use crate::domain::error::{AppError, Result};
use crate::domain::municipio::{MunicipioRecord, MUNICIPIO_TABLE};
use crate::infrastructure::db::municipios::MunicipioRepository;

pub struct MunicipioExporter {
    repo: Arc<MunicipioRepository>,
}

impl MunicipioExporter {
    pub fn new(repo: Arc<MunicipioRepository>) -> Self {
        Self { repo }
    }

    /// SQL script recreating the selected rows; `limit = 0` exports all
    pub async fn export_sql(&self, uf: Option<&str>, limit: usize) -> Result<String> {
        let rows = self.repo.list_all(uf, limit).await?;
        tracing::info!(rows = rows.len(), uf = ?uf, "Exporting municipalities as SQL");
        Ok(render_sql(&rows))
    }

    /// `CODIGO;NOME;UF` rows, no header and no quoting (the importer reads
    /// quotes as plain characters)
    pub async fn export_csv(&self, uf: Option<&str>) -> Result<String> {
        let rows = self.repo.list_all(uf, 0).await?;
        tracing::info!(rows = rows.len(), uf = ?uf, "Exporting municipalities as CSV");
        render_csv(&rows)
    }
}

fn render_sql(rows: &[MunicipioRecord]) -> String {
    let mut sql = String::new();
    sql.push_str("-- Municipality import script\n");
    sql.push_str(&format!(
        "-- Generated at: {}\n",
        Local::now().format("%d/%m/%Y %H:%M:%S")
    ));
    sql.push_str(&format!("-- Total municipalities: {}\n\n", rows.len()));

    sql.push_str(&format!("CREATE TABLE IF NOT EXISTS {} (\n", MUNICIPIO_TABLE));
    sql.push_str("    uf TEXT,\n");
    sql.push_str("    cod_municipio TEXT,\n");
    sql.push_str("    nome_municipio TEXT,\n");
    sql.push_str("    PRIMARY KEY (uf, cod_municipio)\n");
    sql.push_str(");\n\n");

    sql.push_str("BEGIN TRANSACTION;\n\n");
    for row in rows {
        sql.push_str(&format!(
            concat!(
                "INSERT OR REPLACE INTO {} (uf, cod_municipio, nome_municipio) ",
                "VALUES ('{}', '{}', '{}');\n"
            ),
            MUNICIPIO_TABLE,
            quote(&row.uf),
            quote(&row.cod_municipio),
            quote(&row.nome_municipio)
        ));
    }
    sql.push_str("\nCOMMIT;\n");
    sql
}

fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn render_csv(rows: &[MunicipioRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record([&row.cod_municipio, &row.nome_municipio, &row.uf])
            .map_err(|e| AppError::Internal(format!("Failed to write CSV row: {}", e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::municipio_import::MunicipioImporter;
    use crate::domain::municipio::ImportConfig;
    use crate::infrastructure::db::municipios::MunicipioSink;
    use crate::infrastructure::db::sqlite::{connect, db_path_to_url};
    use crate::shared::import_log::ImportLog;

    async fn seeded(dir: &tempfile::TempDir) -> Arc<MunicipioRepository> {
        let url = db_path_to_url(&dir.path().join("export.db")).unwrap();
        let repo = Arc::new(MunicipioRepository::new(connect(&url).await.unwrap()));
        let mut batch = repo.begin_replace().await.unwrap();
        for record in [
            MunicipioRecord::new("SP", "3550308", "São Paulo"),
            MunicipioRecord::new("SP", "3500105", "Adamantina"),
            MunicipioRecord::new("GO", "5200100", "Olhos d'Água"),
        ] {
            batch.upsert(&record).await.unwrap();
        }
        batch.commit().await.unwrap();
        repo
    }

    #[test]
    fn test_render_sql_escapes_quotes() {
        let sql = render_sql(&[MunicipioRecord::new("GO", "5200100", "Olhos d'Água")]);
        assert!(sql.contains("-- Total municipalities: 1"));
        assert!(sql.contains("VALUES ('GO', '5200100', 'OLHOS D''ÁGUA');"));
        assert!(sql.trim_end().ends_with("COMMIT;"));
    }

    #[tokio::test]
    async fn test_export_sql_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = MunicipioExporter::new(seeded(&dir).await);

        let sql = exporter.export_sql(Some("sp"), 1).await.unwrap();
        let inserts: Vec<&str> = sql.lines().filter(|l| l.starts_with("INSERT")).collect();
        assert_eq!(inserts.len(), 1);
        assert!(inserts[0].contains("ADAMANTINA"));

        let all = exporter.export_sql(None, 0).await.unwrap();
        assert_eq!(all.lines().filter(|l| l.starts_with("INSERT")).count(), 3);
    }

    #[tokio::test]
    async fn test_export_csv_reimports_to_same_table() {
        let dir = tempfile::tempdir().unwrap();
        let repo = seeded(&dir).await;
        let before = repo.list_all(None, 0).await.unwrap();

        let csv = MunicipioExporter::new(repo.clone()).export_csv(None).await.unwrap();
        assert!(csv.starts_with("5200100;OLHOS D'ÁGUA;GO\n"));

        let path = dir.path().join("roundtrip.csv");
        std::fs::write(&path, csv).unwrap();
        let importer = MunicipioImporter::new(repo.clone(), ImportConfig::default());
        let report = importer.import_file(&path, &mut ImportLog::new("TEST")).await;

        assert!(report.success);
        assert_eq!(repo.list_all(None, 0).await.unwrap(), before);
    }
}
