//! Identity and path types for assessment results.
//!
//! A run is identified by its [`TaskRunId`]; a node inside the result tree is
//! addressed by a slash-delimited [`StepPath`] built from the identifiers of
//! its ancestors.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Error, Result};

/// Unique identifier of one assessment run.
///
/// Stable for the lifetime of the run; used to deduplicate in-flight archive
/// builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskRunId(pub Uuid);

impl TaskRunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        TaskRunId(Uuid::new_v4())
    }
}

impl Default for TaskRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TaskRunId {
    fn from(uuid: Uuid) -> Self {
        TaskRunId(uuid)
    }
}

/// Slash-delimited position of a node in the result tree.
///
/// Format: `<outer>/<inner>/<leaf>`
/// Example: `walk/motion/accelerometer`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepPath(String);

impl StepPath {
    /// The empty path at the root of the tree.
    pub fn root() -> Self {
        StepPath(String::new())
    }

    /// Path of a direct child with the given identifier.
    pub fn child(&self, identifier: &str) -> Self {
        if self.0.is_empty() {
            StepPath(identifier.to_string())
        } else {
            StepPath(format!("{}/{}", self.0, identifier))
        }
    }

    /// Returns true at the root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path as an optional string, `None` at the root.
    pub fn as_option(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(&self.0)
        }
    }

    /// Flattened key used in the answers document (`/` becomes `_`).
    pub fn to_answer_key(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl fmt::Display for StepPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that an identifier can name an archive.
///
/// Allowed characters: ASCII letters, digits, `.`, `_`, `-`.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    let valid = !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier(identifier.to_string()))
    }
}

/// Check that every data group tag is usable.
pub fn validate_data_groups(groups: &[String]) -> Result<()> {
    for group in groups {
        if group.trim().is_empty() || group.chars().any(char::is_control) {
            return Err(Error::InvalidDataGroup(group.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_path_child() {
        let root = StepPath::root();
        assert!(root.is_root());
        assert_eq!(root.as_option(), None);

        let outer = root.child("outer");
        assert_eq!(outer.as_str(), "outer");

        let leaf = outer.child("inner").child("q1");
        assert_eq!(leaf.as_str(), "outer/inner/q1");
        assert_eq!(leaf.as_option(), Some("outer/inner/q1"));
    }

    #[test]
    fn test_step_path_answer_key() {
        let path = StepPath::root().child("outer").child("inner").child("q1");
        assert_eq!(path.to_answer_key(), "outer_inner_q1");
    }

    #[test]
    fn test_task_run_id_display() {
        let uuid = Uuid::parse_str("9d2d4e20-8c2b-4a3a-a8a2-90bcb7a1d86f").unwrap();
        let id = TaskRunId::from(uuid);
        assert_eq!(id.to_string(), "9d2d4e20-8c2b-4a3a-a8a2-90bcb7a1d86f");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("walk-test_v2.1").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("slash/inside").is_err());
    }

    #[test]
    fn test_validate_data_groups() {
        assert!(validate_data_groups(&["test_user".to_string(), "cohort-a".to_string()]).is_ok());
        assert!(validate_data_groups(&[]).is_ok());
        assert!(validate_data_groups(&["  ".to_string()]).is_err());
        assert!(validate_data_groups(&["tab\there".to_string()]).is_err());
    }
}
