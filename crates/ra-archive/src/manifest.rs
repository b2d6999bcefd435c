//! Archive manifest types and serialization.
//!
//! The manifest is the source of truth for an archive's contents:
//! - Archive metadata (format version, creation time, identifier)
//! - Schedule reference and data groups used for study routing
//! - File listing with per-file metadata and SHA-256 checksums

use chrono::{DateTime, Utc};
use ra_common::{ClientInfo, ScheduleInfo};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current archive format version.
pub const ARCHIVE_FORMAT_VERSION: &str = "1.0.0";

/// Manifest file name within the archive.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Metadata describing one file offered to the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Name of the file within the archive.
    pub filename: String,

    /// When the data in the file was collected.
    pub timestamp: DateTime<Utc>,

    /// MIME type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Identifier of the result that produced the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Step path of the producing result within the result tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_path: Option<String>,

    /// Reference to a JSON schema describing the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<String>,
}

impl FileInfo {
    pub fn new(filename: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            filename: filename.into(),
            timestamp,
            content_type: None,
            identifier: None,
            step_path: None,
            json_schema: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_step_path(mut self, step_path: Option<&str>) -> Self {
        self.step_path = step_path.map(str::to_string);
        self
    }

    pub fn with_json_schema(mut self, schema: impl Into<String>) -> Self {
        self.json_schema = Some(schema.into());
        self
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    #[serde(flatten)]
    pub info: FileInfo,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,

    /// Size in bytes.
    pub bytes: u64,
}

impl FileEntry {
    /// Create an entry for `data`, computing its checksum.
    pub fn for_data(info: FileInfo, data: &[u8]) -> Self {
        Self {
            info,
            sha256: Self::compute_checksum(data),
            bytes: data.len() as u64,
        }
    }

    /// Path of the file within the archive.
    pub fn path(&self) -> &str {
        &self.info.filename
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}

/// Archive manifest containing metadata and file checksums.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveManifest {
    /// Archive format version.
    pub archive_version: String,

    /// When the archive was created.
    pub created_at: DateTime<Utc>,

    /// Archive identifier (the assessment identifier).
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_groups: Option<Vec<String>>,

    /// Client that produced the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,

    /// Files included in the archive with checksums.
    pub files: Vec<FileEntry>,
}

impl ArchiveManifest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            archive_version: ARCHIVE_FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            identifier: identifier.into(),
            schedule: None,
            data_groups: None,
            client_info: None,
            files: Vec::new(),
        }
    }

    pub fn with_schedule(mut self, schedule: Option<ScheduleInfo>) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_data_groups(mut self, data_groups: Option<Vec<String>>) -> Self {
        self.data_groups = data_groups;
        self
    }

    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = Some(client_info);
        self
    }

    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    /// Get total size of all files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Find a file by path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path() == path)
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> crate::Result<()> {
        if self.archive_version != ARCHIVE_FORMAT_VERSION {
            return Err(crate::ArchiveError::UnsupportedVersion {
                version: self.archive_version.clone(),
                supported: ARCHIVE_FORMAT_VERSION.to_string(),
            });
        }

        if self.identifier.is_empty() {
            return Err(crate::ArchiveError::CorruptedManifest(
                "identifier is empty".to_string(),
            ));
        }

        for file in &self.files {
            if file.path().is_empty() {
                return Err(crate::ArchiveError::CorruptedManifest(
                    "file entry has empty path".to_string(),
                ));
            }
            if file.path() == MANIFEST_FILE_NAME {
                return Err(crate::ArchiveError::CorruptedManifest(
                    "file entry shadows the manifest".to_string(),
                ));
            }
            if file.sha256.len() != 64 {
                return Err(crate::ArchiveError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum length",
                    file.path()
                )));
            }
        }

        Ok(())
    }

    /// Sort files for deterministic ordering.
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path().cmp(b.path()));
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, data: &[u8]) -> FileEntry {
        FileEntry::for_data(FileInfo::new(path, Utc::now()), data)
    }

    #[test]
    fn test_manifest_new() {
        let manifest = ArchiveManifest::new("walk-test");
        assert_eq!(manifest.identifier, "walk-test");
        assert_eq!(manifest.archive_version, ARCHIVE_FORMAT_VERSION);
        assert_eq!(manifest.file_count(), 0);
    }

    #[test]
    fn test_manifest_add_file() {
        let mut manifest = ArchiveManifest::new("walk-test");
        manifest.add_file(entry("answers.json", b"{}"));
        manifest.add_file(entry("motion.json", b"[1,2,3]"));

        assert_eq!(manifest.file_count(), 2);
        assert_eq!(manifest.total_bytes(), 9);
        assert!(manifest.find_file("motion.json").is_some());
        assert!(manifest.find_file("missing.json").is_none());
    }

    #[test]
    fn test_manifest_sort_files() {
        let mut manifest = ArchiveManifest::new("walk-test");
        manifest.add_file(entry("z.json", b"z"));
        manifest.add_file(entry("a.json", b"a"));
        manifest.add_file(entry("m.json", b"m"));

        manifest.sort_files();

        let paths: Vec<_> = manifest.files.iter().map(FileEntry::path).collect();
        assert_eq!(paths, vec!["a.json", "m.json", "z.json"]);
    }

    #[test]
    fn test_manifest_validate() {
        let mut manifest = ArchiveManifest::new("walk-test");
        manifest.add_file(entry("test.json", b"{}"));
        assert!(manifest.validate().is_ok());

        assert!(ArchiveManifest::new("").validate().is_err());

        let mut bad = ArchiveManifest::new("walk-test");
        let mut broken = entry("test.json", b"{}");
        broken.sha256 = "invalid".to_string();
        bad.add_file(broken);
        assert!(bad.validate().is_err());

        let mut shadow = ArchiveManifest::new("walk-test");
        shadow.add_file(entry(MANIFEST_FILE_NAME, b"{}"));
        assert!(shadow.validate().is_err());
    }

    #[test]
    fn test_file_entry_json_is_flat() {
        let info = FileInfo::new("motion.json", Utc::now())
            .with_content_type("application/json")
            .with_identifier("motion")
            .with_step_path(Some("walk"));
        let value = serde_json::to_value(FileEntry::for_data(info, b"[]")).unwrap();

        assert_eq!(value["filename"], "motion.json");
        assert_eq!(value["contentType"], "application/json");
        assert_eq!(value["stepPath"], "walk");
        assert_eq!(value["bytes"], 2);
        assert!(value.get("jsonSchema").is_none());
    }

    #[test]
    fn test_file_entry_verify() {
        let entry = entry("test.txt", b"test data");
        assert_eq!(entry.sha256.len(), 64);
        assert!(entry.verify(b"test data"));
        assert!(!entry.verify(b"different data"));
    }
}
