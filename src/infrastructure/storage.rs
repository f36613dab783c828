use async_trait::async_trait;
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};

/// Raw upload persistence: store bytes, get back an opaque reference.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String>;
    async fn read(&self, reference: &str) -> Result<Vec<u8>>;
    async fn remove(&self, reference: &str) -> Result<()>;
}

/// Files kept under one directory; references are `uploads/<uuid>_<name>`.
pub struct LocalFileStore {
    root: PathBuf,
    prefix: String,
}

impl LocalFileStore {
    pub fn new(data_dir: &Path, upload_dir: &str) -> std::io::Result<Self> {
        let root = data_dir.join(upload_dir);
        ensure_dir(&root)?;
        Ok(Self {
            root,
            prefix: upload_dir.trim_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let relative = reference
            .strip_prefix(&self.prefix)
            .map(|rest| rest.trim_start_matches('/'))
            .ok_or_else(|| AppError::StorageError(format!("Unknown file reference: {}", reference)))?;

        let path = Path::new(relative);
        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::StorageError(format!(
                "Invalid file reference: {}",
                reference
            )));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let stored_name = format!(
            "{}_{}",
            &Uuid::new_v4().simple().to_string()[..12],
            sanitize_file_name(file_name)
        );
        let path = self.root.join(&stored_name);
        let tmp_path = self.root.join(format!(".{}.tmp", stored_name));

        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            AppError::StorageError(format!(
                "Failed to write upload {}: {e}",
                tmp_path.display()
            ))
        })?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::StorageError(format!(
                "Failed to move upload into place {}: {e}",
                path.display()
            )));
        }

        Ok(format!("{}/{}", self.prefix, stored_name))
    }

    async fn read(&self, reference: &str) -> Result<Vec<u8>> {
        let path = self.resolve(reference)?;
        tokio::fs::read(&path).await.map_err(|e| {
            AppError::StorageError(format!("Failed to read upload {}: {e}", path.display()))
        })
    }

    async fn remove(&self, reference: &str) -> Result<()> {
        let path = self.resolve(reference)?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            AppError::StorageError(format!("Failed to remove upload {}: {e}", path.display()))
        })
    }
}

/// Keeps `[A-Za-z0-9._-]`, maps whitespace to `_`, defaults to `upload.csv`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let mut out = String::new();
    for ch in base.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            out.push(ch);
        } else if ch.is_whitespace() {
            out.push('_');
        }
    }
    let out = out.trim_start_matches('.').to_string();
    if out.is_empty() {
        "upload.csv".to_string()
    } else {
        out
    }
}

pub fn ensure_data_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(data_dir)?;
    Ok(data_dir.to_path_buf())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("sample equipment.csv"), "sample_equipment.csv");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name(""), "upload.csv");
        assert_eq!(sanitize_file_name("..."), "upload.csv");
    }

    #[tokio::test]
    async fn test_store_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "uploads").unwrap();

        let reference = store.store("data.csv", b"Temperature\n1\n").await.unwrap();
        assert!(reference.starts_with("uploads/"));
        assert!(reference.ends_with("_data.csv"));
        assert_eq!(store.read(&reference).await.unwrap(), b"Temperature\n1\n");

        store.remove(&reference).await.unwrap();
        assert!(matches!(
            store.read(&reference).await,
            Err(AppError::StorageError(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_escaping_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "uploads").unwrap();
        assert!(store.read("uploads/../secret").await.is_err());
        assert!(store.read("elsewhere/file.csv").await.is_err());
    }
}
