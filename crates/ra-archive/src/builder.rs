//! Archive builder for completed assessment results.
//!
//! The builder walks the result tree in document order (step history, then
//! recorder results, depth first) and turns it into one sealed
//! [`UploadArchive`]:
//! - recorder files are read and added under their own file names, qualified
//!   by step path when another recorder already used the name
//! - answers are flattened into `answers.json` plus `answers_schema.json`
//! - the result itself is added as `assessmentResult.json` when it can be
//!   encoded
//!
//! A builder is good for one build followed by one cleanup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ra_common::{
    AssessmentResult, ClientInfo, FileResult, ResultNode, ScheduleInfo, StepPath, TaskRunId,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::answers::{AnswersCollector, ANSWERS_FILE_NAME, ANSWERS_SCHEMA_FILE_NAME};
use crate::archivable::FileArchivable;
use crate::manifest::MANIFEST_FILE_NAME;
use crate::policy::{ArchivePolicy, DefaultArchivePolicy};
use crate::{ArchiveError, FileInfo, Result, UploadArchive};

/// Largest adherence payload an adherence record accepts, in encoded bytes.
pub const MAX_ADHERENCE_BYTES: usize = 64 * 1024;

/// Something that produces an upload archive.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    /// Unique ID used to track the build until it completes.
    fn uuid(&self) -> TaskRunId;

    /// Identifier used in logs and reports.
    fn identifier(&self) -> &str;

    /// Build and seal the archive. Call at most once.
    async fn build_archive(&mut self) -> Result<UploadArchive>;

    /// Remove scratch files. Call after `build_archive`, whatever its outcome.
    async fn cleanup(&self) -> Result<()>;
}

/// Archive builder that also feeds an adherence record.
pub trait ResultArchiveBuilder: ArchiveBuilder {
    fn started_on(&self) -> DateTime<Utc>;

    fn ended_on(&self) -> DateTime<Utc>;

    /// Data to store on the adherence record. At most [`MAX_ADHERENCE_BYTES`].
    fn adherence_data(&self) -> Option<&Value>;
}

/// Construction options for [`AssessmentArchiveBuilder`].
#[derive(Clone)]
pub struct BuilderOptions {
    pub schedule: Option<ScheduleInfo>,
    pub adherence_data: Option<Value>,
    /// Directory recorders wrote into; deleted by `cleanup`.
    pub output_directory: Option<PathBuf>,
    pub data_groups: Option<Vec<String>>,
    pub client_info: ClientInfo,
    pub policy: Arc<dyn ArchivePolicy>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            schedule: None,
            adherence_data: None,
            output_directory: None,
            data_groups: None,
            client_info: ClientInfo::current(),
            policy: Arc::new(DefaultArchivePolicy),
        }
    }
}

impl BuilderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(mut self, schedule: ScheduleInfo) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_adherence_data(mut self, data: Value) -> Self {
        self.adherence_data = Some(data);
        self
    }

    pub fn with_output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    pub fn with_data_groups(mut self, groups: Vec<String>) -> Self {
        self.data_groups = Some(groups);
        self
    }

    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = client_info;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn ArchivePolicy>) -> Self {
        self.policy = policy;
        self
    }
}

/// Builds the upload archive for one assessment result.
pub struct AssessmentArchiveBuilder {
    result: Arc<dyn AssessmentResult>,
    identifier: String,
    output_directory: Option<PathBuf>,
    adherence_data: Option<Value>,
    policy: Arc<dyn ArchivePolicy>,
    archive: Option<UploadArchive>,
}

impl std::fmt::Debug for AssessmentArchiveBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentArchiveBuilder")
            .field("identifier", &self.identifier)
            .field("output_directory", &self.output_directory)
            .finish_non_exhaustive()
    }
}

impl AssessmentArchiveBuilder {
    /// Create a builder.
    ///
    /// Fails if the archive cannot be created from the result identifier,
    /// schedule, and data groups.
    pub fn new(result: Arc<dyn AssessmentResult>, options: BuilderOptions) -> Result<Self> {
        let archive = UploadArchive::new(result.identifier(), options.schedule, options.data_groups)?
            .with_client_info(options.client_info.clone());

        let adherence_data = options
            .adherence_data
            .map(|data| options.client_info.stamp(data))
            .and_then(|data| within_adherence_limit(result.identifier(), data));

        Ok(Self {
            identifier: archive.identifier().to_string(),
            result,
            output_directory: options.output_directory,
            adherence_data,
            policy: options.policy,
            archive: Some(archive),
        })
    }

    /// The result being archived.
    pub fn assessment_result(&self) -> &dyn AssessmentResult {
        self.result.as_ref()
    }

    pub fn output_directory(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }

    fn add_answers(&self, archive: &mut UploadArchive, answers: &AnswersCollector) -> Result<()> {
        let data = answers.to_json_bytes()?;
        let schema = answers.schema(self.result.identifier());
        let info = FileInfo::new(ANSWERS_FILE_NAME, self.result.end_date())
            .with_content_type("application/json")
            .with_json_schema(ANSWERS_SCHEMA_FILE_NAME);
        archive.add_file(data, info, Some(&schema))
    }
}

fn within_adherence_limit(identifier: &str, data: Value) -> Option<Value> {
    match serde_json::to_vec(&data) {
        Ok(encoded) if encoded.len() <= MAX_ADHERENCE_BYTES => Some(data),
        Ok(encoded) => {
            warn!(
                archive = %identifier,
                bytes = encoded.len(),
                limit = MAX_ADHERENCE_BYTES,
                "Adherence data exceeds limit; dropped"
            );
            None
        }
        Err(err) => {
            warn!(archive = %identifier, error = %err, "Adherence data not encodable; dropped");
            None
        }
    }
}

/// Name under which a recorder file is stored in `archive`.
///
/// Recorders in different steps often write the same file name. The recorded
/// name is kept while it is free; otherwise it is qualified with the step
/// path (the result identifier at the top level), then numbered.
fn archive_file_name(archive: &UploadArchive, filename: &str, qualifier: &str) -> String {
    let taken = |name: &str| name == MANIFEST_FILE_NAME || archive.contains(name);
    if !taken(filename) {
        return filename.to_string();
    }
    let qualified = format!("{qualifier}_{filename}");
    if !taken(&qualified) {
        return qualified;
    }
    let (stem, extension) = match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (filename, None),
    };
    (2u32..)
        .map(|n| match extension {
            Some(extension) => format!("{qualifier}_{stem}-{n}.{extension}"),
            None => format!("{qualifier}_{stem}-{n}"),
        })
        .find(|name| !taken(name))
        .unwrap_or(qualified)
}

/// Archivable content found in one pass over the result tree.
#[derive(Default)]
struct TreeWalk<'a> {
    /// Recorder files with the path of their parent step.
    files: Vec<(&'a FileResult, StepPath)>,
    answers: AnswersCollector,
}

impl<'a> TreeWalk<'a> {
    fn branch(
        &mut self,
        step_history: &'a [ResultNode],
        async_results: Option<&'a [ResultNode]>,
        path: &StepPath,
    ) {
        self.nodes(step_history, path);
        if let Some(async_results) = async_results {
            self.nodes(async_results, path);
        }
    }

    fn nodes(&mut self, nodes: &'a [ResultNode], prefix: &StepPath) {
        for node in nodes {
            self.node(node, prefix);
        }
    }

    fn node(&mut self, node: &'a ResultNode, prefix: &StepPath) {
        let path = prefix.child(node.identifier());
        trace!(path = %path, kind = node.kind(), "Visiting result node");
        match node {
            ResultNode::Branch(branch) => {
                self.branch(&branch.step_history, branch.async_results.as_deref(), &path)
            }
            // Children keep the collection's prefix; its own identifier is not a segment.
            ResultNode::Collection(collection) => self.nodes(&collection.children, prefix),
            ResultNode::File(file) => self.files.push((file, prefix.clone())),
            ResultNode::Answer(answer) => {
                if !self.answers.record(&path, answer) {
                    trace!(path = %path, "Answer not representable; skipped");
                }
            }
            ResultNode::Opaque(_) => trace!(path = %path, "Opaque result skipped"),
        }
    }
}

#[async_trait]
impl ArchiveBuilder for AssessmentArchiveBuilder {
    fn uuid(&self) -> TaskRunId {
        self.result.task_run_id()
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn build_archive(&mut self) -> Result<UploadArchive> {
        let mut archive = self
            .archive
            .take()
            .ok_or_else(|| ArchiveError::AlreadyBuilt(self.identifier.clone()))?;
        let result = Arc::clone(&self.result);

        let mut walk = TreeWalk::default();
        walk.branch(result.step_history(), result.async_results(), &StepPath::root());

        debug!(
            archive = %self.identifier,
            run = %result.task_run_id(),
            files = walk.files.len(),
            answers = walk.answers.len(),
            "Result tree walked"
        );

        for (file, step_path) in &walk.files {
            let Some((mut info, data)) =
                file.build_archivable_file_data(step_path.as_option()).await?
            else {
                debug!(identifier = %file.identifier, "No file recorded; skipped");
                continue;
            };
            let qualifier = if step_path.is_root() {
                file.identifier.clone()
            } else {
                step_path.to_answer_key()
            };
            let filename = archive_file_name(&archive, &info.filename, &qualifier);
            if filename != info.filename {
                debug!(
                    identifier = %file.identifier,
                    recorded = %info.filename,
                    archived = %filename,
                    "Recorder file name already taken; renamed"
                );
                info.filename = filename;
            }
            match self.policy.manifest_file_info(file, info) {
                Some(info) => archive.add_file(data, info, None)?,
                None => debug!(identifier = %file.identifier, "File excluded by policy"),
            }
        }

        // The answers document is secondary; a failure here must not cost the upload.
        if !walk.answers.is_empty() {
            if let Err(err) = self.add_answers(&mut archive, &walk.answers) {
                warn!(
                    archive = %self.identifier,
                    error = %err,
                    "Failed to create answers file"
                );
            }
        }

        if let Some((data, info)) = self.policy.assessment_result_file(result.as_ref())? {
            archive.add_file(data, info, None)?;
        }

        archive.complete()?;

        info!(
            archive = %self.identifier,
            run = %result.task_run_id(),
            files = archive.file_count(),
            "Archive built"
        );

        Ok(archive)
    }

    async fn cleanup(&self) -> Result<()> {
        let Some(dir) = &self.output_directory else {
            return Ok(());
        };
        tokio::fs::remove_dir_all(dir).await?;
        debug!(archive = %self.identifier, dir = %dir.display(), "Output directory removed");
        Ok(())
    }
}

impl ResultArchiveBuilder for AssessmentArchiveBuilder {
    fn started_on(&self) -> DateTime<Utc> {
        self.result.start_date()
    }

    fn ended_on(&self) -> DateTime<Utc> {
        self.result.end_date()
    }

    fn adherence_data(&self) -> Option<&Value> {
        self.adherence_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_common::{AnswerResult, AnswerType, AssessmentResultObject, BranchResult};
    use serde_json::json;

    fn result() -> Arc<dyn AssessmentResult> {
        Arc::new(AssessmentResultObject::new(
            "survey",
            vec![BranchResult::new(
                "intro",
                vec![AnswerResult::new("age", Some(AnswerType::Integer), Some(json!(30))).into()],
            )
            .into()],
        ))
    }

    fn client() -> ClientInfo {
        ClientInfo::new("iOS", "17.4", "iPhone15,2", "3.1.0")
    }

    #[test]
    fn test_new_rejects_bad_identifier() {
        let bad: Arc<dyn AssessmentResult> = Arc::new(AssessmentResultObject::new("no spaces allowed", vec![]));
        assert!(AssessmentArchiveBuilder::new(bad, BuilderOptions::new()).is_err());
    }

    #[test]
    fn test_new_rejects_bad_schedule() {
        let options = BuilderOptions::new().with_schedule(ScheduleInfo::new(""));
        assert!(AssessmentArchiveBuilder::new(result(), options).is_err());
    }

    #[test]
    fn test_identity_accessors() {
        let result = result();
        let builder = AssessmentArchiveBuilder::new(Arc::clone(&result), BuilderOptions::new()).unwrap();
        assert_eq!(builder.uuid(), result.task_run_id());
        assert_eq!(builder.identifier(), "survey");
        assert_eq!(builder.started_on(), result.start_date());
        assert_eq!(builder.ended_on(), result.end_date());
        assert!(builder.adherence_data().is_none());
    }

    #[test]
    fn test_adherence_data_stamped() {
        let options = BuilderOptions::new()
            .with_client_info(client())
            .with_adherence_data(json!({"score": 3, "osName": "kept"}));
        let builder = AssessmentArchiveBuilder::new(result(), options).unwrap();

        let data = builder.adherence_data().unwrap();
        assert_eq!(data["score"], 3);
        assert_eq!(data["osName"], "kept");
        assert_eq!(data["appVersion"], "3.1.0");
    }

    #[test]
    fn test_adherence_data_over_limit_dropped() {
        let big = "x".repeat(MAX_ADHERENCE_BYTES);
        let options = BuilderOptions::new().with_adherence_data(json!({ "blob": big }));
        let builder = AssessmentArchiveBuilder::new(result(), options).unwrap();
        assert!(builder.adherence_data().is_none());
    }

    #[test]
    fn test_tree_walk_paths() {
        let tree = vec![
            BranchResult::new(
                "outer",
                vec![BranchResult::new(
                    "inner",
                    vec![AnswerResult::new("q1", None, Some(json!("a"))).into()],
                )
                .into()],
            )
            .into(),
            ra_common::CollectionResult::new(
                "grid",
                vec![AnswerResult::new("q2", None, Some(json!(1))).into()],
            )
            .into(),
            FileResult::new("motion", None).into(),
        ];

        let mut walk = TreeWalk::default();
        walk.branch(&tree, None, &StepPath::root());

        assert_eq!(walk.answers.keys().collect::<Vec<_>>(), vec!["outer_inner_q1", "q2"]);
        assert_eq!(walk.files.len(), 1);
        assert!(walk.files[0].1.is_root());
    }

    #[test]
    fn test_archive_file_name_disambiguates() {
        let mut archive = UploadArchive::new("walk", None, None).unwrap();
        assert_eq!(archive_file_name(&archive, "motion.json", "balance"), "motion.json");
        assert_eq!(archive_file_name(&archive, MANIFEST_FILE_NAME, "walk"), "walk_manifest.json");

        for name in ["motion.json", "balance_motion.json"] {
            archive
                .add_file(b"[]".to_vec(), FileInfo::new(name, Utc::now()), None)
                .unwrap();
        }
        assert_eq!(
            archive_file_name(&archive, "motion.json", "walk"),
            "walk_motion.json"
        );
        assert_eq!(
            archive_file_name(&archive, "motion.json", "balance"),
            "balance_motion-2.json"
        );

        archive
            .add_file(b"x".to_vec(), FileInfo::new("raw", Utc::now()), None)
            .unwrap();
        archive
            .add_file(b"x".to_vec(), FileInfo::new("tap_raw", Utc::now()), None)
            .unwrap();
        assert_eq!(archive_file_name(&archive, "raw", "tap"), "tap_raw-2");
    }

    #[tokio::test]
    async fn test_second_build_fails() {
        let mut builder = AssessmentArchiveBuilder::new(result(), BuilderOptions::new()).unwrap();
        builder.build_archive().await.unwrap();
        let err = builder.build_archive().await.unwrap_err();
        assert!(matches!(err, ArchiveError::AlreadyBuilt(_)));
    }

    #[tokio::test]
    async fn test_cleanup_without_directory_is_noop() {
        let builder = AssessmentArchiveBuilder::new(result(), BuilderOptions::new()).unwrap();
        assert!(builder.output_directory().is_none());
        builder.cleanup().await.unwrap();
    }
}
