//! Platform metadata stamped onto adherence payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device and application details of the client that ran the assessment.
///
/// Passed explicitly to whoever needs it; there is no process-wide lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub os_name: String,
    pub os_version: String,
    pub device_name: String,
    pub app_version: String,
}

impl ClientInfo {
    pub fn new(
        os_name: impl Into<String>,
        os_version: impl Into<String>,
        device_name: impl Into<String>,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            os_name: os_name.into(),
            os_version: os_version.into(),
            device_name: device_name.into(),
            app_version: app_version.into(),
        }
    }

    /// Metadata known at compile time for the current platform.
    pub fn current() -> Self {
        Self {
            os_name: std::env::consts::OS.to_string(),
            os_version: "unknown".to_string(),
            device_name: std::env::consts::ARCH.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// [`ClientInfo::current`] with `RA_OS_VERSION`, `RA_DEVICE_NAME` and
    /// `RA_APP_VERSION` overrides.
    pub fn from_env() -> Self {
        let mut info = Self::current();
        if let Ok(val) = std::env::var("RA_OS_VERSION") {
            info.os_version = val;
        }
        if let Ok(val) = std::env::var("RA_DEVICE_NAME") {
            info.device_name = val;
        }
        if let Ok(val) = std::env::var("RA_APP_VERSION") {
            info.app_version = val;
        }
        info
    }

    /// Add client fields to a JSON object payload without overwriting keys the
    /// caller already set. Non-object payloads are returned unchanged.
    pub fn stamp(&self, payload: Value) -> Value {
        match payload {
            Value::Object(mut map) => {
                set_if_absent(&mut map, "osName", &self.os_name);
                set_if_absent(&mut map, "deviceName", &self.device_name);
                set_if_absent(&mut map, "osVersion", &self.os_version);
                set_if_absent(&mut map, "appVersion", &self.app_version);
                Value::Object(map)
            }
            other => other,
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::current()
    }
}

fn set_if_absent(map: &mut Map<String, Value>, key: &str, value: &str) {
    if !map.contains_key(key) {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> ClientInfo {
        ClientInfo::new("iOS", "17.4", "iPhone15,2", "3.1.0")
    }

    #[test]
    fn test_stamp_adds_missing_keys() {
        let stamped = info().stamp(json!({"score": 12}));
        assert_eq!(stamped["score"], 12);
        assert_eq!(stamped["osName"], "iOS");
        assert_eq!(stamped["osVersion"], "17.4");
        assert_eq!(stamped["deviceName"], "iPhone15,2");
        assert_eq!(stamped["appVersion"], "3.1.0");
    }

    #[test]
    fn test_stamp_keeps_existing_keys() {
        let stamped = info().stamp(json!({"osName": "custom", "appVersion": null}));
        assert_eq!(stamped["osName"], "custom");
        assert_eq!(stamped["appVersion"], Value::Null);
        assert_eq!(stamped["deviceName"], "iPhone15,2");
    }

    #[test]
    fn test_stamp_ignores_non_objects() {
        assert_eq!(info().stamp(json!([1, 2])), json!([1, 2]));
        assert_eq!(info().stamp(json!("text")), json!("text"));
    }

    #[test]
    fn test_current_uses_platform_constants() {
        let current = ClientInfo::current();
        assert_eq!(current.os_name, std::env::consts::OS);
        assert!(!current.app_version.is_empty());
    }
}
