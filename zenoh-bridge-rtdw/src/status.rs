//! Bridge status reporting.

use crate::config::RtdwBridgeConfig;
use serde::{Deserialize, Serialize};

/// Bridge status published on `<prefix>/@/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Bridge name ("rtdw").
    pub bridge: String,
    pub version: String,
    /// Current status ("running", "offline", "error").
    pub status: String,
    /// Additional metadata.
    #[serde(flatten)]
    pub metadata: serde_json::Value,
}

impl BridgeStatus {
    fn with_status(status: &str) -> Self {
        Self {
            bridge: "rtdw".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: status.to_string(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Create a new status with "running" state.
    pub fn running() -> Self {
        Self::with_status("running")
    }

    /// Create a status with "offline" state.
    pub fn offline() -> Self {
        Self::with_status("offline")
    }

    /// Create a status with "error" state.
    pub fn error(error: impl Into<String>) -> Self {
        Self::with_status("error").with_metadata(serde_json::json!({ "error": error.into() }))
    }

    /// Add metadata to the status.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Describe the polled device.
    pub fn with_device(self, config: &RtdwBridgeConfig) -> Self {
        let rtdw = &config.rtdw;
        self.with_metadata(serde_json::json!({
            "device": rtdw.device,
            "port": rtdw.serial.port,
            "slave": rtdw.serial.slave,
            "poll_interval_minutes": rtdw.poll.interval_minutes,
        }))
    }

    /// Publish this status to Zenoh.
    pub async fn publish(&self, session: &zenoh::Session, key: &str) -> rtdw_common::Result<()> {
        let payload = serde_json::to_vec(self)?;
        session.put(key, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_running() {
        let status = BridgeStatus::running();
        assert_eq!(status.bridge, "rtdw");
        assert_eq!(status.status, "running");
    }

    #[test]
    fn test_status_with_device() {
        let config: RtdwBridgeConfig = json5::from_str("{}").unwrap();
        let status = BridgeStatus::running().with_device(&config);

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"running\""));
        assert!(json.contains("\"device\":\"altherma\""));
        assert!(json.contains("\"port\":\"/dev/ttyUSB1\""));
    }

    #[test]
    fn test_status_error() {
        let status = BridgeStatus::error("serial port missing");
        assert_eq!(status.status, "error");
        assert_eq!(status.metadata["error"], "serial port missing");
    }

    #[test]
    fn test_status_offline_has_no_metadata() {
        let json = serde_json::to_value(BridgeStatus::offline()).unwrap();
        assert_eq!(json["status"], "offline");
        assert!(json.get("device").is_none());
    }
}
