//! Shared types for research assessment archives.
//!
//! This crate provides the pieces every archive component agrees on:
//! - The assessment result tree (closed set of node kinds)
//! - Identity and step-path types
//! - JSON answer typing
//! - Schedule references and client platform metadata
//! - Common error types
//! - Logging configuration for host applications

pub mod client;
pub mod error;
pub mod id;
pub mod json;
pub mod logging;
pub mod result;
pub mod schedule;

pub use client::ClientInfo;
pub use error::{Error, Result};
pub use id::{StepPath, TaskRunId};
pub use json::{AnswerType, JsonType};
pub use result::{
    AnswerResult, AssessmentResult, AssessmentResultObject, BranchNode, BranchResult,
    CollectionResult, EncodableResult, FileResult, OpaqueResult, ResultNode,
    ASSESSMENT_RESULT_SCHEMA,
};
pub use schedule::ScheduleInfo;
