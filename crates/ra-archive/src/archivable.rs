//! Results that render themselves as standalone archive files.

use async_trait::async_trait;
use ra_common::FileResult;

use crate::archive::FileType;
use crate::{FileInfo, Result};

/// A result that can produce a file payload for the archive.
#[async_trait]
pub trait FileArchivable: Send + Sync {
    /// Build the file payload and its metadata.
    ///
    /// `step_path` is the path of the parent step. Returns `Ok(None)` when
    /// the result has nothing to archive.
    async fn build_archivable_file_data(
        &self,
        step_path: Option<&str>,
    ) -> Result<Option<(FileInfo, Vec<u8>)>>;
}

#[async_trait]
impl FileArchivable for FileResult {
    async fn build_archivable_file_data(
        &self,
        step_path: Option<&str>,
    ) -> Result<Option<(FileInfo, Vec<u8>)>> {
        let (Some(path), Some(filename)) = (self.path.as_deref(), self.file_name()) else {
            return Ok(None);
        };

        let data = tokio::fs::read(path).await?;

        let content_type = self
            .content_type
            .clone()
            .unwrap_or_else(|| FileType::from_path(filename).mime_type().to_string());
        let mut info = FileInfo::new(filename, self.start_date)
            .with_content_type(content_type)
            .with_identifier(self.identifier.clone())
            .with_step_path(step_path);
        if let Some(schema) = &self.json_schema {
            info = info.with_json_schema(schema.clone());
        }

        Ok(Some((info, data)))
    }
}
