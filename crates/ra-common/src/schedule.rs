//! Schedule reference attached to an archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Which scheduled instance of an assessment a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    /// Scheduled assessment instance.
    pub instance_guid: String,

    /// Scheduled session instance that contains the assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_instance_guid: Option<String>,

    /// Assessment identifier as it appears in the schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_identifier: Option<String>,

    /// Start of the window the instance was scheduled for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_on: Option<DateTime<Utc>>,
}

impl ScheduleInfo {
    pub fn new(instance_guid: impl Into<String>) -> Self {
        Self {
            instance_guid: instance_guid.into(),
            session_instance_guid: None,
            assessment_identifier: None,
            scheduled_on: None,
        }
    }

    pub fn with_session_instance(mut self, guid: impl Into<String>) -> Self {
        self.session_instance_guid = Some(guid.into());
        self
    }

    pub fn with_assessment_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.assessment_identifier = Some(identifier.into());
        self
    }

    pub fn with_scheduled_on(mut self, scheduled_on: DateTime<Utc>) -> Self {
        self.scheduled_on = Some(scheduled_on);
        self
    }

    /// Validate the schedule reference.
    pub fn validate(&self) -> Result<()> {
        if self.instance_guid.trim().is_empty() {
            return Err(Error::InvalidSchedule(
                "instance_guid is empty".to_string(),
            ));
        }
        if matches!(&self.session_instance_guid, Some(guid) if guid.trim().is_empty()) {
            return Err(Error::InvalidSchedule(
                "session_instance_guid is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_validate() {
        assert!(ScheduleInfo::new("abc-123").validate().is_ok());
        assert!(ScheduleInfo::new("").validate().is_err());
        assert!(ScheduleInfo::new("abc")
            .with_session_instance(" ")
            .validate()
            .is_err());
    }

    #[test]
    fn test_schedule_json_shape() {
        let schedule = ScheduleInfo::new("inst-1").with_session_instance("sess-1");
        let value = serde_json::to_value(&schedule).unwrap();
        assert_eq!(value["instanceGuid"], "inst-1");
        assert_eq!(value["sessionInstanceGuid"], "sess-1");
        assert!(value.get("scheduledOn").is_none());
    }
}
