use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::domain::error::{AppError, Result};
use crate::domain::municipio::MunicipioRecord;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS tb_municipios (
        uf TEXT,
        cod_municipio TEXT,
        nome_municipio TEXT,
        PRIMARY KEY (uf, cod_municipio)
    )";

const UPSERT_SQL: &str = "INSERT OR REPLACE INTO tb_municipios
        (uf, cod_municipio, nome_municipio)
        VALUES (?, ?, ?)";

/// Destination of a full-replace import
#[async_trait]
pub trait MunicipioSink: Send + Sync {
    /// Open an exclusive batch: the table exists and is empty inside it.
    async fn begin_replace(&self) -> Result<Box<dyn MunicipioBatch>>;
}

/// One import transaction. Dropping it without `commit` discards every write.
#[async_trait]
pub trait MunicipioBatch: Send {
    async fn upsert(&mut self, record: &MunicipioRecord) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
}

pub struct MunicipioRepository {
    pool: SqlitePool,
}

impl MunicipioRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;
        Ok(())
    }

    /// Distinct state codes present in the table
    pub async fn list_ufs(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT uf FROM tb_municipios ORDER BY uf")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list UFs: {}", e)))
    }

    /// Municipalities of one state, ordered by name
    pub async fn list_by_uf(&self, uf: &str) -> Result<Vec<MunicipioRecord>> {
        let uf = normalize_uf(uf)?;
        sqlx::query_as::<_, MunicipioEntity>(
            "SELECT uf, cod_municipio, nome_municipio FROM tb_municipios
             WHERE uf = ? ORDER BY nome_municipio",
        )
        .bind(uf)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list municipalities: {}", e)))
        .map(|entities| entities.into_iter().map(Into::into).collect())
    }

    /// Lookup by code; non-digit characters are ignored
    pub async fn find_by_code(&self, code: &str) -> Result<Option<MunicipioRecord>> {
        let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Ok(None);
        }

        sqlx::query_as::<_, MunicipioEntity>(
            "SELECT uf, cod_municipio, nome_municipio FROM tb_municipios
             WHERE cod_municipio = ? ORDER BY uf LIMIT 1",
        )
        .bind(digits)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to find municipality: {}", e)))
        .map(|entity| entity.map(Into::into))
    }

    pub async fn count(&self, uf: Option<&str>) -> Result<i64> {
        let result = match uf {
            Some(uf) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tb_municipios WHERE uf = ?")
                    .bind(normalize_uf(uf)?)
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tb_municipios")
                    .fetch_one(&self.pool)
                    .await
            }
        };
        result.map_err(|e| {
            AppError::DatabaseError(format!("Failed to count municipalities: {}", e))
        })
    }

    /// Rows ordered by (uf, name); `limit = 0` means no limit
    pub async fn list_all(&self, uf: Option<&str>, limit: usize) -> Result<Vec<MunicipioRecord>> {
        let mut sql = String::from("SELECT uf, cod_municipio, nome_municipio FROM tb_municipios");
        if uf.is_some() {
            sql.push_str(" WHERE uf = ?");
        }
        sql.push_str(" ORDER BY uf, nome_municipio");
        if limit > 0 {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, MunicipioEntity>(&sql);
        if let Some(uf) = uf {
            query = query.bind(normalize_uf(uf)?);
        }
        if limit > 0 {
            query = query.bind(limit as i64);
        }

        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list municipalities: {}", e)))
            .map(|entities| entities.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl MunicipioSink for MunicipioRepository {
    async fn begin_replace(&self) -> Result<Box<dyn MunicipioBatch>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| {
                AppError::StorageUnavailable(format!("Failed to begin transaction: {}", e))
            })?;

        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("Failed to create table: {}", e)))?;

        sqlx::query("DELETE FROM tb_municipios")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::StorageUnavailable(format!("Failed to clear table: {}", e)))?;

        Ok(Box::new(SqliteMunicipioBatch { tx }))
    }
}

struct SqliteMunicipioBatch {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl MunicipioBatch for SqliteMunicipioBatch {
    async fn upsert(&mut self, record: &MunicipioRecord) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(&record.uf)
            .bind(&record.cod_municipio)
            .bind(&record.nome_municipio)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                AppError::TransactionFailure(format!("Failed to upsert municipality: {}", e))
            })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::TransactionFailure(format!("Failed to commit: {}", e)))
    }
}

fn normalize_uf(uf: &str) -> Result<String> {
    let uf = uf.trim();
    if uf.chars().count() != 2 {
        return Err(AppError::ValidationError(format!("Invalid UF: {}", uf)));
    }
    Ok(uf.to_uppercase())
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct MunicipioEntity {
    uf: String,
    cod_municipio: String,
    nome_municipio: String,
}

impl From<MunicipioEntity> for MunicipioRecord {
    fn from(e: MunicipioEntity) -> Self {
        Self {
            uf: e.uf,
            cod_municipio: e.cod_municipio,
            nome_municipio: e.nome_municipio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::sqlite::{connect, db_path_to_url};

    async fn repository(dir: &tempfile::TempDir) -> MunicipioRepository {
        let url = db_path_to_url(&dir.path().join("test.db")).unwrap();
        let repo = MunicipioRepository::new(connect(&url).await.unwrap());
        repo.ensure_table().await.unwrap();
        repo
    }

    async fn replace_with(repo: &MunicipioRepository, records: &[MunicipioRecord]) {
        let mut batch = repo.begin_replace().await.unwrap();
        for record in records {
            batch.upsert(record).await.unwrap();
        }
        batch.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_clears_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;

        replace_with(&repo, &[MunicipioRecord::new("GO", "01", "Acme")]).await;
        replace_with(&repo, &[MunicipioRecord::new("SP", "02", "Beta")]).await;

        assert_eq!(repo.count(None).await.unwrap(), 1);
        assert_eq!(repo.list_ufs().await.unwrap(), vec!["SP".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_same_key_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;

        replace_with(
            &repo,
            &[
                MunicipioRecord::new("GO", "01", "Old Name"),
                MunicipioRecord::new("GO", "01", "New Name"),
            ],
        )
        .await;

        let rows = repo.list_by_uf("go").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].nome_municipio, "NEW NAME");
    }

    #[tokio::test]
    async fn test_dropped_batch_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        replace_with(&repo, &[MunicipioRecord::new("GO", "01", "Acme")]).await;

        {
            let mut batch = repo.begin_replace().await.unwrap();
            batch
                .upsert(&MunicipioRecord::new("SP", "02", "Beta"))
                .await
                .unwrap();
        }

        let rows = repo.list_all(None, 0).await.unwrap();
        assert_eq!(rows, vec![MunicipioRecord::new("GO", "01", "Acme")]);
    }

    #[tokio::test]
    async fn test_find_by_code_strips_non_digits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        replace_with(&repo, &[MunicipioRecord::new("MG", "3106200", "Belo Horizonte")]).await;

        let found = repo.find_by_code("31.062-00").await.unwrap().unwrap();
        assert_eq!(found.uf, "MG");
        assert!(repo.find_by_code("abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_uf_rejects_invalid_uf() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        let err = repo.list_by_uf("GOI").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_list_all_orders_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repository(&dir).await;
        replace_with(
            &repo,
            &[
                MunicipioRecord::new("SP", "3", "Campinas"),
                MunicipioRecord::new("GO", "2", "Goiânia"),
                MunicipioRecord::new("GO", "1", "Anápolis"),
            ],
        )
        .await;

        let rows = repo.list_all(None, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].nome_municipio, "ANÁPOLIS");
        assert_eq!(rows[1].nome_municipio, "GOIÂNIA");

        let sp = repo.list_all(Some("sp"), 0).await.unwrap();
        assert_eq!(sp.len(), 1);
        assert_eq!(repo.count(Some("GO")).await.unwrap(), 2);
    }
}
