//! JSON frame protocol spoken over the attendance WebSocket.
//!
//! Frames are `{"event": <name>, "data": <payload>}` in both directions.

use serde::{Deserialize, Serialize};

use rollcall_core::AttendanceStatus;

use crate::api::{MarkAttendanceRequest, SubscribeToClassRequest};

/// Client-to-server frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientFrame {
    SubscribeToClass(SubscribeToClassRequest),
    MarkAttendance(MarkAttendanceRequest),
}

/// Server-to-client frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerFrame {
    AttendanceUpdate(AttendanceUpdate),
    Ack(MarkAck),
    Error { message: String },
}

/// Broadcast to every member of a class room after a successful mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    pub student_id: String,
    pub status: AttendanceStatus,
}

/// Acknowledgment returned to the marking connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAck {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}
