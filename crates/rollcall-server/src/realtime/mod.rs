//! Real-time attendance surface: room registry, frame protocol and the
//! WebSocket endpoint.

pub mod broadcaster;
pub mod protocol;
pub mod socket;

pub use broadcaster::{ConnectionHandle, RealtimeBroadcaster, room_name};
pub use protocol::{AttendanceUpdate, ClientFrame, MarkAck, ServerFrame};
pub use socket::attendance_ws_handler;
