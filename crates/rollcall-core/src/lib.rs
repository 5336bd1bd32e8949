pub mod attendance;
pub mod error;
pub mod key;
pub mod time;

pub use attendance::{AttendanceMark, AttendanceRecord, AttendanceStatus};
pub use error::{CoreError, Result};
pub use key::{attendance_key, class_of_key, validate_id};
pub use time::{UtcTimestamp, now_utc};
