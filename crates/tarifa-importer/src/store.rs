//! Local filesystem access to uploaded rate files

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tarifa_core::models::RateGroup;
use tarifa_core::traits::RateFileStore;
use tarifa_core::{AppError, AppResult};
use tracing::{debug, error, instrument};

/// Reads files from `{root}/{rate group id}/{base name}`
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl RateFileStore for LocalFileStore {
    #[instrument(skip(self, group), fields(rate_group_id = group.id))]
    async fn read(&self, group: &RateGroup) -> AppResult<Vec<u8>> {
        let path = group
            .file_path(&self.root)
            .ok_or(AppError::MissingFile(group.id))?;

        debug!("Reading rate file {}", path.display());

        tokio::fs::read(&path).await.map_err(|e| {
            error!("Failed to read rate file {}: {}", path.display(), e);
            match e.kind() {
                ErrorKind::NotFound => AppError::MissingFile(group.id),
                _ => AppError::Internal(format!("Failed to read {}: {}", path.display(), e)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarifa_core::models::{ImporterArguments, RateFile, RateGroupStatus};

    fn group(id: i32, base_name: Option<&str>) -> RateGroup {
        RateGroup {
            id,
            brand_id: 1,
            name: "test".to_string(),
            status: RateGroupStatus::Pending,
            file: base_name.map(|name| RateFile {
                base_name: name.to_string(),
                mime_type: None,
                file_size: None,
                importer_arguments: ImporterArguments::with_columns(["destinationPrefix"]).to_json(),
            }),
            last_execution_date: None,
            last_execution_error: None,
        }
    }

    #[tokio::test]
    async fn test_reads_file_under_group_directory() {
        let root = std::env::temp_dir().join(format!("tarifa-store-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(root.join("5")).await.unwrap();
        tokio::fs::write(root.join("5").join("rates.csv"), b"+34\n")
            .await
            .unwrap();

        let store = LocalFileStore::new(&root);
        let bytes = store.read(&group(5, Some("rates.csv"))).await.unwrap();
        assert_eq!(bytes, b"+34\n");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let store = LocalFileStore::new("/nonexistent/tarifa");

        let err = store.read(&group(5, None)).await.unwrap_err();
        assert!(matches!(err, AppError::MissingFile(5)));

        let err = store.read(&group(5, Some("rates.csv"))).await.unwrap_err();
        assert!(matches!(err, AppError::MissingFile(5)));
    }
}
