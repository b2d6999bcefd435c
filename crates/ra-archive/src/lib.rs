//! Upload archive builder for research assessment results.
//!
//! When a participant finishes an assessment, the app hands the result tree
//! to an [`AssessmentArchiveBuilder`], which packages it into one sealed ZIP
//! ready for upload.
//!
//! # Archive Format
//!
//! Archives are ZIP files containing:
//! - `manifest.json`: archive metadata, schedule, client info, and a file
//!   listing with checksums
//! - recorder files (motion, audio, ...) under their own file names
//! - `answers.json` / `answers_schema.json`: flattened answers keyed by
//!   step path (only when the result has answers)
//! - `assessmentResult.json`: the whole result, when it can encode itself
//!
//! # Example
//!
//! ```no_run
//! use ra_archive::{ArchiveBuilder, ArchiveReader, AssessmentArchiveBuilder, BuilderOptions};
//! use ra_common::{AssessmentResult, AssessmentResultObject};
//! use std::sync::Arc;
//!
//! # async fn run() -> ra_archive::Result<()> {
//! let result: Arc<dyn AssessmentResult> = Arc::new(AssessmentResultObject::new("survey", vec![]));
//! let mut builder = AssessmentArchiveBuilder::new(result, BuilderOptions::new())?;
//!
//! let archive = builder.build_archive().await?;
//! archive.write_to(std::path::Path::new("survey.zip")).await?;
//! builder.cleanup().await?;
//!
//! let mut reader = ArchiveReader::open(std::path::Path::new("survey.zip"))?;
//! let answers = reader.read_answers()?;
//! # let _ = answers;
//! # Ok(())
//! # }
//! ```

pub mod answers;
pub mod archivable;
pub mod archive;
pub mod builder;
pub mod error;
pub mod manifest;
pub mod policy;
pub mod reader;
pub mod schema;

pub use answers::{
    flatten_answer, AnswersCollector, FlatAnswer, ANSWERS_FILE_NAME, ANSWERS_SCHEMA_FILE_NAME,
};
pub use archivable::FileArchivable;
pub use archive::{FileType, UploadArchive};
pub use builder::{
    ArchiveBuilder, AssessmentArchiveBuilder, BuilderOptions, ResultArchiveBuilder,
    MAX_ADHERENCE_BYTES,
};
pub use error::{ArchiveError, Result};
pub use manifest::{ArchiveManifest, FileEntry, FileInfo, ARCHIVE_FORMAT_VERSION, MANIFEST_FILE_NAME};
pub use policy::{encoded_result_file, ArchivePolicy, DefaultArchivePolicy, ASSESSMENT_RESULT_FILE_NAME};
pub use reader::ArchiveReader;
pub use schema::{JsonSchema, JsonSchemaProperty};
