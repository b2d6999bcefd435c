//! Reader for sealed upload archives.
//!
//! Opening an archive checks that the manifest and the ZIP agree: every
//! listed file is present and no unlisted entry was slipped in. Every file
//! read is checked against the size and checksum recorded in the manifest,
//! so a consumer never sees bytes the manifest does not vouch for.

use crate::answers::ANSWERS_FILE_NAME;
use crate::manifest::MANIFEST_FILE_NAME;
use crate::policy::ASSESSMENT_RESULT_FILE_NAME;
use crate::{ArchiveError, ArchiveManifest, FileEntry, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Sealed archive opened for inspection.
pub struct ArchiveReader<R: Read + Seek> {
    manifest: ArchiveManifest,
    zip: ZipArchive<R>,
}

impl ArchiveReader<File> {
    /// Open an archive written by `UploadArchive::write_to`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(File::open(path)?)
    }
}

impl ArchiveReader<Cursor<Vec<u8>>> {
    /// Open sealed archive bytes, e.g. from `UploadArchive::into_parts`.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveReader<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut zip = ZipArchive::new(reader)?;

        let manifest_json = read_entry(&mut zip, MANIFEST_FILE_NAME)?
            .ok_or_else(|| ArchiveError::MissingFile(MANIFEST_FILE_NAME.to_string()))?;
        let manifest: ArchiveManifest = serde_json::from_slice(&manifest_json)
            .map_err(|err| ArchiveError::CorruptedManifest(err.to_string()))?;
        manifest.validate()?;
        check_listing(&manifest, &zip)?;

        debug!(
            archive = %manifest.identifier,
            files = manifest.file_count(),
            "Archive opened"
        );
        Ok(Self { manifest, zip })
    }

    pub fn manifest(&self) -> &ArchiveManifest {
        &self.manifest
    }

    pub fn identifier(&self) -> &str {
        &self.manifest.identifier
    }

    /// Manifest entries in archive order.
    pub fn files(&self) -> &[FileEntry] {
        &self.manifest.files
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.manifest.find_file(name).is_some()
    }

    /// Contents of a listed file, checked against its manifest entry.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .manifest
            .find_file(name)
            .ok_or_else(|| ArchiveError::FileNotFound(name.to_string()))?;
        let (expected, expected_bytes) = (entry.sha256.clone(), entry.bytes);

        let data = read_entry(&mut self.zip, name)?
            .ok_or_else(|| ArchiveError::MissingFile(name.to_string()))?;
        let actual = FileEntry::compute_checksum(&data);
        if data.len() as u64 != expected_bytes || actual != expected {
            return Err(ArchiveError::ChecksumMismatch {
                path: name.to_string(),
                expected,
                actual,
            });
        }
        Ok(data)
    }

    /// Check every listed file. Stops at the first failure.
    pub fn verify_all(&mut self) -> Result<()> {
        let names: Vec<String> = self.files().iter().map(|f| f.path().to_string()).collect();
        for name in &names {
            if let Err(err) = self.read_file(name) {
                warn!(
                    archive = %self.manifest.identifier,
                    path = %name,
                    error = %err,
                    "Archive file failed verification"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// A listed JSON file, decoded.
    pub fn read_json<T: serde::de::DeserializeOwned>(&mut self, name: &str) -> Result<T> {
        let data = self.read_file(name)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// The flattened answers, if the build produced any.
    pub fn read_answers(&mut self) -> Result<Option<Value>> {
        self.read_document(ANSWERS_FILE_NAME)
    }

    /// The encoded assessment result, if the result could encode itself.
    pub fn read_assessment_result(&mut self) -> Result<Option<Value>> {
        self.read_document(ASSESSMENT_RESULT_FILE_NAME)
    }

    fn read_document(&mut self, name: &str) -> Result<Option<Value>> {
        if !self.has_file(name) {
            return Ok(None);
        }
        self.read_json(name).map(Some)
    }
}

/// Raw bytes of a ZIP entry, or `None` if there is no entry by that name.
fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> Result<Option<Vec<u8>>> {
    let Some(index) = zip.index_for_name(name) else {
        return Ok(None);
    };
    let mut file = zip.by_index(index)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

/// The manifest and the ZIP directory must list the same files.
fn check_listing<R: Read + Seek>(manifest: &ArchiveManifest, zip: &ZipArchive<R>) -> Result<()> {
    let listed: HashSet<&str> = manifest.files.iter().map(FileEntry::path).collect();
    if let Some(unlisted) = zip
        .file_names()
        .find(|name| *name != MANIFEST_FILE_NAME && !listed.contains(name))
    {
        return Err(ArchiveError::UnlistedFile(unlisted.to_string()));
    }
    if let Some(missing) = manifest
        .files
        .iter()
        .find(|entry| zip.index_for_name(entry.path()).is_none())
    {
        return Err(ArchiveError::MissingFile(missing.path().to_string()));
    }
    Ok(())
}
