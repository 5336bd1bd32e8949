//! Attendance domain types shared across the cache, sync and server crates.

use crate::error::CoreError;
use crate::time::UtcTimestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recognized attendance states for a `(class, student, day)` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "late" => Ok(Self::Late),
            "excused" => Ok(Self::Excused),
            other => Err(CoreError::invalid_status(other)),
        }
    }
}

/// The cached value stored under an attendance cache key.
///
/// A new mark for the same tuple on the same day overwrites the prior
/// record (last-write-wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub status: AttendanceStatus,
    pub marked_at: UtcTimestamp,
}

impl AttendanceRecord {
    pub fn new(status: AttendanceStatus, marked_at: UtcTimestamp) -> Self {
        Self { status, marked_at }
    }
}

/// An owned copy of a mark mutation, as carried by the offline queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub class_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
    pub marked_at: UtcTimestamp,
}
