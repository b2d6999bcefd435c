//! Hooks that let applications reshape an archive.
//!
//! The builder consults an [`ArchivePolicy`] at two points: before adding a
//! recorder file, and when deciding on the top-level result document. The
//! default policy passes files through unchanged and encodes the result when
//! it supports self-serialization.

use ra_common::{AssessmentResult, FileResult};

use crate::{FileInfo, Result};

/// Name of the top-level assessment result document.
pub const ASSESSMENT_RESULT_FILE_NAME: &str = "assessmentResult.json";

/// Application hooks consulted during an archive build.
pub trait ArchivePolicy: Send + Sync {
    /// Metadata to use for a recorder file.
    ///
    /// Return `None` to leave the file out of the archive, or a modified
    /// `FileInfo` to rename or re-describe it.
    fn manifest_file_info(&self, result: &FileResult, info: FileInfo) -> Option<FileInfo> {
        let _ = result;
        Some(info)
    }

    /// The top-level assessment result document, if any.
    fn assessment_result_file(
        &self,
        result: &dyn AssessmentResult,
    ) -> Result<Option<(Vec<u8>, FileInfo)>> {
        encoded_result_file(result)
    }
}

/// Policy with every hook at its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultArchivePolicy;

impl ArchivePolicy for DefaultArchivePolicy {}

/// `assessmentResult.json` for results that can encode themselves.
pub fn encoded_result_file(result: &dyn AssessmentResult) -> Result<Option<(Vec<u8>, FileInfo)>> {
    let Some(encodable) = result.as_encodable() else {
        return Ok(None);
    };

    let data = encodable.json_encoded()?;
    let mut info = FileInfo::new(ASSESSMENT_RESULT_FILE_NAME, result.end_date())
        .with_content_type("application/json")
        .with_identifier(result.identifier());
    if let Some(schema) = encodable.json_schema() {
        info = info.with_json_schema(schema);
    }
    Ok(Some((data, info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ra_common::{AssessmentResultObject, ASSESSMENT_RESULT_SCHEMA};

    #[test]
    fn test_default_policy_passes_file_info() {
        let file = FileResult::new("motion", None);
        let info = FileInfo::new("motion.json", Utc::now());
        let mapped = DefaultArchivePolicy.manifest_file_info(&file, info.clone());
        assert_eq!(mapped, Some(info));
    }

    #[test]
    fn test_default_policy_encodes_result_object() {
        let result = AssessmentResultObject::new("survey", vec![]);
        let (data, info) = DefaultArchivePolicy
            .assessment_result_file(&result)
            .unwrap()
            .expect("result file");

        assert_eq!(info.filename, ASSESSMENT_RESULT_FILE_NAME);
        assert_eq!(info.identifier.as_deref(), Some("survey"));
        assert_eq!(info.json_schema.as_deref(), Some(ASSESSMENT_RESULT_SCHEMA));
        assert_eq!(info.timestamp, result.end_date);

        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["identifier"], "survey");
    }
}
