use super::error::DriveError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Identity of this adapter package, recorded in every provenance file.
pub const ADAPTER: &str = env!("CARGO_PKG_NAME");
pub const ADAPTER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the provenance file inside a working directory.
pub const INFO_FILE: &str = "info.json";

/// The `info.json` provenance record of one drive.
///
/// Written with the start fields when the drive begins and amended in place
/// at completion; a scheduled drive is never amended on successful
/// submission because its completion is not observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveRecord {
    pub drive_number: usize,
    pub date: String,
    pub time: String,
    pub start_time: String,
    pub adapter: String,
    pub adapter_version: String,
    pub driver: String,
    /// Caller-supplied option echoes.
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip)]
    started_at: Option<DateTime<Local>>,
}

impl DriveRecord {
    pub fn begin(
        drive_number: usize,
        driver: &str,
        options: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let now = Local::now();
        Self {
            drive_number,
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            start_time: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            adapter: ADAPTER.to_string(),
            adapter_version: ADAPTER_VERSION.to_string(),
            driver: driver.to_string(),
            options,
            end_time: None,
            elapsed_time: None,
            success: None,
            started_at: Some(now),
        }
    }

    /// Stamps the completion fields: end time, elapsed `HH:MM:SS` and the
    /// success flag.
    pub fn finish(&mut self, success: bool) {
        let now = Local::now();
        self.end_time = Some(now.format("%Y-%m-%dT%H:%M:%S").to_string());
        let seconds = self
            .started_at
            .map(|started| now.signed_duration_since(started).num_seconds().max(0))
            .unwrap_or(0);
        self.elapsed_time = Some(format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            seconds % 3600 / 60,
            seconds % 60
        ));
        self.success = Some(success);
    }

    /// Writes (or rewrites) `info.json` inside `workdir`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write(&self, workdir: &Path) -> Result<(), DriveError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(workdir.join(INFO_FILE), json)?;
        Ok(())
    }

    /// Reads `info.json` back from `workdir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a valid record.
    pub fn read(workdir: &Path) -> Result<Self, DriveError> {
        let json = fs::read_to_string(workdir.join(INFO_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }
}
