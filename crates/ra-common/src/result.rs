//! Assessment result tree.
//!
//! A completed assessment is a tree: the root [`AssessmentResult`] holds an
//! ordered step history (plus optional asynchronous recorder results), and
//! each entry is a [`ResultNode`]. Node kinds form a closed set so that
//! archive traversal can classify every node with a single `match`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::id::TaskRunId;
use crate::json::AnswerType;
use crate::Result;

/// Schema reference stamped on encoded [`AssessmentResultObject`] documents.
pub const ASSESSMENT_RESULT_SCHEMA: &str = "AssessmentResultObject.json";

/// A node that owns an ordered sub-history of results.
pub trait BranchNode {
    /// Results in the order the steps were run.
    fn step_history(&self) -> &[ResultNode];

    /// Results from recorders that ran alongside the steps.
    fn async_results(&self) -> Option<&[ResultNode]>;
}

/// Root of a completed assessment result tree.
///
/// Implementations are immutable once the assessment finishes.
pub trait AssessmentResult: BranchNode + fmt::Debug + Send + Sync {
    /// Assessment identifier (also used to name the archive).
    fn identifier(&self) -> &str;

    /// Unique identifier of this run.
    fn task_run_id(&self) -> TaskRunId;

    /// When the session started.
    fn start_date(&self) -> DateTime<Utc>;

    /// When the session ended.
    fn end_date(&self) -> DateTime<Utc>;

    /// Self-serialization capability, if the concrete type supports it.
    fn as_encodable(&self) -> Option<&dyn EncodableResult> {
        None
    }
}

/// Capability of a result to encode itself as a standalone JSON document.
pub trait EncodableResult {
    /// Encoded document bytes.
    fn json_encoded(&self) -> Result<Vec<u8>>;

    /// Schema reference describing the encoded document.
    fn json_schema(&self) -> Option<&str>;
}

/// One node in the result tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResultNode {
    /// Nested task with its own step history.
    Branch(BranchResult),
    /// Ordered group of child results.
    Collection(CollectionResult),
    /// Result that renders itself as a standalone file.
    File(FileResult),
    /// Response to a single question.
    Answer(AnswerResult),
    /// Anything else; carried along but never archived.
    Opaque(OpaqueResult),
}

impl ResultNode {
    /// Identifier used as this node's path segment.
    pub fn identifier(&self) -> &str {
        match self {
            ResultNode::Branch(r) => &r.identifier,
            ResultNode::Collection(r) => &r.identifier,
            ResultNode::File(r) => &r.identifier,
            ResultNode::Answer(r) => &r.identifier,
            ResultNode::Opaque(r) => &r.identifier,
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ResultNode::Branch(_) => "branch",
            ResultNode::Collection(_) => "collection",
            ResultNode::File(_) => "file",
            ResultNode::Answer(_) => "answer",
            ResultNode::Opaque(_) => "opaque",
        }
    }
}

impl From<BranchResult> for ResultNode {
    fn from(result: BranchResult) -> Self {
        ResultNode::Branch(result)
    }
}

impl From<CollectionResult> for ResultNode {
    fn from(result: CollectionResult) -> Self {
        ResultNode::Collection(result)
    }
}

impl From<FileResult> for ResultNode {
    fn from(result: FileResult) -> Self {
        ResultNode::File(result)
    }
}

impl From<AnswerResult> for ResultNode {
    fn from(result: AnswerResult) -> Self {
        ResultNode::Answer(result)
    }
}

impl From<OpaqueResult> for ResultNode {
    fn from(result: OpaqueResult) -> Self {
        ResultNode::Opaque(result)
    }
}

/// Nested task result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub step_history: Vec<ResultNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_results: Option<Vec<ResultNode>>,
}

impl BranchResult {
    pub fn new(identifier: impl Into<String>, step_history: Vec<ResultNode>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            step_history,
            async_results: None,
        }
    }

    /// Attach recorder results.
    pub fn with_async_results(mut self, results: Vec<ResultNode>) -> Self {
        self.async_results = Some(results);
        self
    }
}

impl BranchNode for BranchResult {
    fn step_history(&self) -> &[ResultNode] {
        &self.step_history
    }

    fn async_results(&self) -> Option<&[ResultNode]> {
        self.async_results.as_deref()
    }
}

/// Ordered group of results without task semantics of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub children: Vec<ResultNode>,
}

impl CollectionResult {
    pub fn new(identifier: impl Into<String>, children: Vec<ResultNode>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            children,
        }
    }
}

/// Result whose payload was written to a file by a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Location of the recorded file. `None` when nothing was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<String>,
}

impl FileResult {
    pub fn new(identifier: impl Into<String>, path: Option<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            path,
            content_type: None,
            json_schema: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_json_schema(mut self, schema: impl Into<String>) -> Self {
        self.json_schema = Some(schema.into());
        self
    }

    /// File name of the recorded file, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
    }
}

/// Response to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Declared answer type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,
    /// Answer value; `None` when the question was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
}

impl AnswerResult {
    pub fn new(
        identifier: impl Into<String>,
        answer_type: Option<AnswerType>,
        value: Option<Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
            answer_type,
            value,
            question_text: None,
        }
    }

    pub fn with_question_text(mut self, text: impl Into<String>) -> Self {
        self.question_text = Some(text.into());
        self
    }
}

/// Result of a kind the archive does not know how to package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueResult {
    pub identifier: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl OpaqueResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            start_date: now,
            end_date: now,
        }
    }
}

/// Serializable assessment result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResultObject {
    pub identifier: String,
    #[serde(rename = "taskRunUUID")]
    pub task_run_id: TaskRunId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub step_history: Vec<ResultNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_results: Option<Vec<ResultNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema: Option<String>,
}

impl AssessmentResultObject {
    /// Create a result stamped with a fresh run ID and the current time.
    pub fn new(identifier: impl Into<String>, step_history: Vec<ResultNode>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            task_run_id: TaskRunId::new(),
            start_date: now,
            end_date: now,
            step_history,
            async_results: None,
            schema_identifier: None,
            version_string: None,
            json_schema: Some(ASSESSMENT_RESULT_SCHEMA.to_string()),
        }
    }

    pub fn with_task_run_id(mut self, id: TaskRunId) -> Self {
        self.task_run_id = id;
        self
    }

    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_async_results(mut self, results: Vec<ResultNode>) -> Self {
        self.async_results = Some(results);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version_string = Some(version.into());
        self
    }

    /// Parse a result tree from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl BranchNode for AssessmentResultObject {
    fn step_history(&self) -> &[ResultNode] {
        &self.step_history
    }

    fn async_results(&self) -> Option<&[ResultNode]> {
        self.async_results.as_deref()
    }
}

impl AssessmentResult for AssessmentResultObject {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn task_run_id(&self) -> TaskRunId {
        self.task_run_id
    }

    fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    fn as_encodable(&self) -> Option<&dyn EncodableResult> {
        Some(self)
    }
}

impl EncodableResult for AssessmentResultObject {
    fn json_encoded(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    fn json_schema(&self) -> Option<&str> {
        self.json_schema.as_deref()
    }
}
