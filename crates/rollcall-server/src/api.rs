//! Typed request and response bodies for the attendance surfaces.
//!
//! Both the REST handlers and the realtime gateway validate input at
//! the boundary through these structures; the core never sees a
//! structurally invalid payload.

use serde::{Deserialize, Serialize};

use rollcall_core::{AttendanceStatus, CoreError, validate_id};

/// Mutation payload accepted by `POST /attendance/mark` and the
/// realtime `markAttendance` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub class_id: String,
    pub student_id: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

impl MarkAttendanceRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_id(&self.class_id)?;
        validate_id(&self.student_id)?;
        Ok(())
    }
}

/// Subscription payload for the realtime `subscribeToClass` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeToClassRequest {
    pub class_id: String,
}

impl SubscribeToClassRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_id(&self.class_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkResponse {
    pub message: String,
    pub cache_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}
