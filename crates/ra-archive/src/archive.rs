//! Upload archive: accumulates files, then seals them into a ZIP.
//!
//! An archive is open until [`UploadArchive::complete`] writes the manifest
//! and every file into an in-memory ZIP. Sealing is one-way; a sealed archive
//! rejects further files.

use crate::manifest::{FileEntry, FileInfo, MANIFEST_FILE_NAME};
use crate::schema::JsonSchema;
use crate::{ArchiveError, ArchiveManifest, Result};
use ra_common::id::{validate_data_groups, validate_identifier};
use ra_common::{ClientInfo, ScheduleInfo};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// File type hints for content type assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Json,
    Csv,
    Text,
    Audio,
    Binary,
}

impl FileType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Json => "application/json",
            FileType::Csv => "text/csv",
            FileType::Text => "text/plain",
            FileType::Audio => "audio/mp4",
            FileType::Binary => "application/octet-stream",
        }
    }

    pub fn from_path(path: &str) -> Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => FileType::Json,
            Some("csv") => FileType::Csv,
            Some("txt") | Some("log") => FileType::Text,
            Some("m4a") | Some("aac") => FileType::Audio,
            _ => FileType::Binary,
        }
    }
}

enum State {
    Open { files: Vec<(String, Vec<u8>)> },
    Sealed { bytes: Vec<u8> },
}

/// Archive of assessment data queued for upload.
pub struct UploadArchive {
    manifest: ArchiveManifest,
    state: State,
}

impl std::fmt::Debug for UploadArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadArchive")
            .field("identifier", &self.manifest.identifier)
            .field("files", &self.manifest.file_count())
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl UploadArchive {
    /// Create an open archive.
    ///
    /// Fails if the identifier cannot name an archive, the schedule reference
    /// is incomplete, or a data group tag is empty.
    pub fn new(
        identifier: &str,
        schedule: Option<ScheduleInfo>,
        data_groups: Option<Vec<String>>,
    ) -> Result<Self> {
        validate_identifier(identifier)?;
        if let Some(schedule) = &schedule {
            schedule.validate()?;
        }
        if let Some(groups) = &data_groups {
            validate_data_groups(groups)?;
        }

        let manifest = ArchiveManifest::new(identifier)
            .with_schedule(schedule)
            .with_data_groups(data_groups);

        Ok(Self {
            manifest,
            state: State::Open { files: Vec::new() },
        })
    }

    /// Record the client that produced the archive in the manifest.
    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.manifest = self.manifest.with_client_info(client_info);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.manifest.identifier
    }

    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, State::Sealed { .. })
    }

    /// File count (not including the manifest).
    pub fn file_count(&self) -> usize {
        self.manifest.file_count()
    }

    /// Total size in bytes before compression.
    pub fn total_bytes(&self) -> u64 {
        self.manifest.total_bytes()
    }

    /// Returns true if a file with this name was added.
    pub fn contains(&self, filename: &str) -> bool {
        self.manifest.find_file(filename).is_some()
    }

    /// Add a file.
    ///
    /// When `local_schema` is given, the schema document is added as well,
    /// named by its `$id`, unless a file with that name already exists.
    pub fn add_file(
        &mut self,
        data: Vec<u8>,
        mut info: FileInfo,
        local_schema: Option<&JsonSchema>,
    ) -> Result<()> {
        let files = match &mut self.state {
            State::Open { files } => files,
            State::Sealed { .. } => {
                return Err(ArchiveError::ArchiveSealed(self.manifest.identifier.clone()))
            }
        };

        if info.filename.is_empty() {
            return Err(ArchiveError::CorruptedManifest(
                "file entry has empty path".to_string(),
            ));
        }
        if info.filename == MANIFEST_FILE_NAME || self.manifest.find_file(&info.filename).is_some() {
            return Err(ArchiveError::DuplicateFile(info.filename));
        }

        let schema_file = match local_schema {
            Some(schema) if self.manifest.find_file(&schema.id).is_none() => {
                if schema.id == info.filename || schema.id == MANIFEST_FILE_NAME {
                    return Err(ArchiveError::DuplicateFile(schema.id.clone()));
                }
                let schema_info = FileInfo::new(schema.id.clone(), info.timestamp)
                    .with_content_type("application/schema+json");
                Some((schema_info, schema.to_json_bytes()?))
            }
            _ => None,
        };

        if info.content_type.is_none() {
            info.content_type = Some(FileType::from_path(&info.filename).mime_type().to_string());
        }

        for (info, data) in std::iter::once((info, data)).chain(schema_file) {
            let entry = FileEntry::for_data(info, &data);
            debug!(
                archive = %self.manifest.identifier,
                path = %entry.path(),
                bytes = entry.bytes,
                "Added file to archive"
            );
            files.push((entry.path().to_string(), data));
            self.manifest.add_file(entry);
        }

        Ok(())
    }

    /// Seal the archive: write the manifest and all files into a ZIP.
    ///
    /// Files are written in path order after `manifest.json`.
    pub fn complete(&mut self) -> Result<()> {
        let files = match &mut self.state {
            State::Open { files } => files,
            State::Sealed { .. } => {
                return Err(ArchiveError::ArchiveSealed(self.manifest.identifier.clone()))
            }
        };

        self.manifest.sort_files();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let manifest_json = self.manifest.to_json()?;

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);

            let options: FileOptions<'_, ()> = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644);

            zip.start_file(MANIFEST_FILE_NAME, options)?;
            zip.write_all(manifest_json.as_bytes())?;

            for (file_path, data) in files.iter() {
                zip.start_file(file_path.as_str(), options)?;
                zip.write_all(data)?;
            }

            zip.finish()?;
        }

        let bytes = buffer.into_inner();

        info!(
            archive = %self.manifest.identifier,
            files = self.manifest.file_count(),
            compressed_bytes = bytes.len(),
            uncompressed_bytes = self.manifest.total_bytes(),
            "Archive completed"
        );

        self.state = State::Sealed { bytes };
        Ok(())
    }

    /// Sealed ZIP bytes.
    pub fn archive_bytes(&self) -> Result<&[u8]> {
        match &self.state {
            State::Sealed { bytes } => Ok(bytes),
            State::Open { .. } => Err(ArchiveError::NotCompleted(self.manifest.identifier.clone())),
        }
    }

    /// Consume the archive, returning the sealed ZIP bytes and manifest.
    pub fn into_parts(self) -> Result<(Vec<u8>, ArchiveManifest)> {
        match self.state {
            State::Sealed { bytes } => Ok((bytes, self.manifest)),
            State::Open { .. } => Err(ArchiveError::NotCompleted(self.manifest.identifier)),
        }
    }

    /// Persist the sealed archive for the upload queue.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.archive_bytes()?;
        tokio::fs::write(path, bytes).await?;
        info!(
            archive = %self.manifest.identifier,
            path = %path.display(),
            bytes = bytes.len(),
            "Archive written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ra_common::JsonType;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn info(name: &str) -> FileInfo {
        FileInfo::new(name, Utc::now())
    }

    fn open_archive() -> UploadArchive {
        UploadArchive::new("walk-test", None, None).unwrap()
    }

    #[test]
    fn test_archive_new_validates_identifier() {
        assert!(UploadArchive::new("walk-test", None, None).is_ok());
        let err = UploadArchive::new("bad id", None, None).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Model(ra_common::Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_archive_new_validates_schedule_and_groups() {
        assert!(UploadArchive::new("walk", Some(ScheduleInfo::new("")), None).is_err());
        assert!(UploadArchive::new("walk", None, Some(vec![String::new()])).is_err());

        let archive = UploadArchive::new(
            "walk",
            Some(ScheduleInfo::new("inst-1")),
            Some(vec!["test_user".to_string()]),
        )
        .unwrap();
        assert_eq!(archive.manifest().schedule.as_ref().unwrap().instance_guid, "inst-1");
        assert_eq!(archive.manifest().data_groups, Some(vec!["test_user".to_string()]));
    }

    #[test]
    fn test_add_file_assigns_content_type() {
        let mut archive = open_archive();
        archive.add_file(b"a,b".to_vec(), info("data.csv"), None).unwrap();
        archive.add_file(vec![0, 1], info("blob.bin"), None).unwrap();

        let csv = archive.manifest().find_file("data.csv").unwrap();
        assert_eq!(csv.info.content_type.as_deref(), Some("text/csv"));
        let bin = archive.manifest().find_file("blob.bin").unwrap();
        assert_eq!(bin.info.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(archive.file_count(), 2);
        assert_eq!(archive.total_bytes(), 5);
    }

    #[test]
    fn test_add_file_rejects_duplicates() {
        let mut archive = open_archive();
        archive.add_file(b"{}".to_vec(), info("a.json"), None).unwrap();

        let err = archive.add_file(b"{}".to_vec(), info("a.json"), None).unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateFile(ref p) if p == "a.json"));

        let err = archive
            .add_file(b"{}".to_vec(), info(MANIFEST_FILE_NAME), None)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateFile(_)));
        assert_eq!(archive.file_count(), 1);
    }

    #[test]
    fn test_add_file_with_local_schema() {
        let mut archive = open_archive();
        let mut properties = BTreeMap::new();
        properties.insert(
            "q1".to_string(),
            crate::schema::JsonSchemaProperty::primitive(JsonType::String, None),
        );
        let schema = JsonSchema::object("answers_schema.json", None, properties);

        archive
            .add_file(
                b"{}".to_vec(),
                info("answers.json").with_json_schema("answers_schema.json"),
                Some(&schema),
            )
            .unwrap();

        assert!(archive.contains("answers.json"));
        let schema_entry = archive.manifest().find_file("answers_schema.json").unwrap();
        assert_eq!(
            schema_entry.info.content_type.as_deref(),
            Some("application/schema+json")
        );
    }

    #[test]
    fn test_complete_seals_archive() {
        let mut archive = open_archive();
        archive.add_file(b"{\"total\":1}".to_vec(), info("summary.json"), None).unwrap();
        assert!(archive.archive_bytes().is_err());

        archive.complete().unwrap();
        assert!(archive.is_completed());
        assert_eq!(&archive.archive_bytes().unwrap()[0..2], b"PK");

        let err = archive.add_file(b"{}".to_vec(), info("late.json"), None).unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveSealed(_)));
        assert!(matches!(archive.complete(), Err(ArchiveError::ArchiveSealed(_))));
    }

    #[test]
    fn test_empty_archive_completes() {
        let mut archive = open_archive();
        archive.complete().unwrap();
        let (bytes, manifest) = archive.into_parts().unwrap();
        assert_eq!(&bytes[0..2], b"PK");
        assert_eq!(manifest.file_count(), 0);
    }

    #[test]
    fn test_deterministic_order() {
        let mut first = open_archive();
        first.add_file(b"z".to_vec(), info("z.txt"), None).unwrap();
        first.add_file(b"a".to_vec(), info("a.txt"), None).unwrap();

        let mut second = open_archive();
        second.add_file(b"a".to_vec(), info("a.txt"), None).unwrap();
        second.add_file(b"z".to_vec(), info("z.txt"), None).unwrap();

        first.complete().unwrap();
        second.complete().unwrap();

        let paths = |a: &UploadArchive| {
            a.manifest()
                .files
                .iter()
                .map(|f| f.path().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(paths(&first), vec!["a.txt", "z.txt"]);
        assert_eq!(paths(&first), paths(&second));
    }

    #[tokio::test]
    async fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("walk.zip");

        let mut archive = open_archive();
        assert!(archive.write_to(&path).await.is_err());

        archive.add_file(b"data".to_vec(), info("data.txt"), None).unwrap();
        archive.complete().unwrap();
        archive.write_to(&path).await.unwrap();

        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, archive.archive_bytes().unwrap());
    }

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path("a.JSON"), FileType::Json);
        assert_eq!(FileType::from_path("a.csv"), FileType::Csv);
        assert_eq!(FileType::from_path("a.m4a"), FileType::Audio);
        assert_eq!(FileType::from_path("noext"), FileType::Binary);
    }
}
