use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::domain::error::{AppError, Result};

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").unwrap());

/// Reduce a client-supplied name to a plain file name safe to join onto the
/// upload directory. Returns `None` when nothing usable remains.
pub fn secure_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

pub async fn ensure_upload_dir(upload_dir: &Path) -> Result<()> {
    if !upload_dir.exists() {
        tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
            AppError::IoError(format!(
                "Failed to create upload dir {}: {}",
                upload_dir.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Persist an uploaded body under `upload_dir`, overwriting a previous upload
/// with the same name
pub async fn save_upload(upload_dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = secure_filename(filename)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid file name: {}", filename)))?;
    ensure_upload_dir(upload_dir).await?;

    let path = upload_dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::IoError(format!("Failed to save {}: {}", path.display(), e)))?;
    Ok(path)
}
