//! Class-scoped subscription rooms and broadcast fan-out.

use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::protocol::{AttendanceUpdate, ServerFrame};

/// Name of the room carrying updates for a class.
pub fn room_name(class_id: &str) -> String {
    format!("class_{class_id}")
}

/// Handle for sending frames to a connected client.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    sender: mpsc::Sender<ServerFrame>,
}

impl ConnectionHandle {
    pub fn new(id: Uuid, sender: mpsc::Sender<ServerFrame>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a frame for delivery without blocking the caller.
    ///
    /// A consumer that has stopped reading loses frames once its buffer
    /// fills; blocking the room on one slow member is not an option.
    pub fn send(&self, frame: ServerFrame) {
        match self.sender.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(connection_id = %self.id, "outbound buffer full, frame dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection_id = %self.id, "connection gone, frame dropped");
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Registry of class rooms and their member connections.
///
/// Rooms are created lazily on first join and dropped when the last
/// member leaves; membership lives only in this process.
#[derive(Default)]
pub struct RealtimeBroadcaster {
    rooms: RwLock<HashMap<String, Vec<ConnectionHandle>>>,
}

impl RealtimeBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a connection into a class room. Idempotent per connection:
    /// joining a room twice does not duplicate the membership.
    pub fn subscribe(&self, class_id: &str, handle: ConnectionHandle) {
        let room = room_name(class_id);
        let mut rooms = self.rooms.write();
        let members = rooms.entry(room.clone()).or_default();
        if members.iter().any(|m| m.id == handle.id) {
            tracing::debug!(room = %room, connection_id = %handle.id, "already subscribed");
            return;
        }
        members.push(handle);

        tracing::debug!(room = %room, "connection subscribed");
    }

    /// Drop a connection from every room it joined; empty rooms are
    /// removed along with it.
    pub fn leave_all(&self, connection_id: Uuid) {
        let mut rooms = self.rooms.write();
        for members in rooms.values_mut() {
            members.retain(|m| m.id != connection_id && !m.is_closed());
        }
        rooms.retain(|_, members| !members.is_empty());

        tracing::debug!(connection_id = %connection_id, "connection unsubscribed from all rooms");
    }

    /// Fan an update out to every member of a class room, the sender
    /// included if subscribed.
    pub fn broadcast(&self, class_id: &str, update: AttendanceUpdate) {
        let room = room_name(class_id);
        let handles: Vec<ConnectionHandle> = {
            let rooms = self.rooms.read();
            rooms.get(&room).cloned().unwrap_or_default()
        };

        metrics::counter!("rollcall_broadcast_fanout_total").increment(handles.len() as u64);

        for handle in handles {
            handle.send(ServerFrame::AttendanceUpdate(update.clone()));
        }
    }

    /// Number of live members in a class room.
    pub fn room_size(&self, class_id: &str) -> usize {
        let rooms = self.rooms.read();
        rooms
            .get(&room_name(class_id))
            .map(|members| members.iter().filter(|m| !m.is_closed()).count())
            .unwrap_or(0)
    }

    /// Total members across all rooms (a connection in two rooms counts
    /// twice).
    pub fn total_memberships(&self) -> usize {
        let rooms = self.rooms.read();
        rooms.values().map(|members| members.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::AttendanceStatus;

    fn connection() -> (ConnectionHandle, mpsc::Receiver<ServerFrame>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(Uuid::new_v4(), tx), rx)
    }

    fn update(student_id: &str) -> AttendanceUpdate {
        AttendanceUpdate {
            student_id: student_id.into(),
            status: AttendanceStatus::Present,
        }
    }

    #[tokio::test]
    async fn test_subscribe_is_idempotent() {
        let broadcaster = RealtimeBroadcaster::new();
        let (handle, _rx) = connection();

        broadcaster.subscribe("123", handle.clone());
        broadcaster.subscribe("123", handle);

        assert_eq!(broadcaster.room_size("123"), 1);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_members_only() {
        let broadcaster = RealtimeBroadcaster::new();
        let (member, mut member_rx) = connection();
        let (outsider, mut outsider_rx) = connection();

        broadcaster.subscribe("123", member);
        broadcaster.subscribe("999", outsider);

        broadcaster.broadcast("123", update("456"));

        let frame = member_rx.try_recv().unwrap();
        assert!(matches!(frame, ServerFrame::AttendanceUpdate(u) if u.student_id == "456"));
        assert!(outsider_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_room_is_noop() {
        let broadcaster = RealtimeBroadcaster::new();
        broadcaster.broadcast("123", update("456"));
        assert_eq!(broadcaster.room_size("123"), 0);
    }

    #[tokio::test]
    async fn test_leave_all_prunes_membership() {
        let broadcaster = RealtimeBroadcaster::new();
        let (a, _a_rx) = connection();
        let (b, _b_rx) = connection();
        let a_id = a.id();

        broadcaster.subscribe("123", a.clone());
        broadcaster.subscribe("456", a);
        broadcaster.subscribe("123", b);

        broadcaster.leave_all(a_id);

        assert_eq!(broadcaster.room_size("123"), 1);
        assert_eq!(broadcaster.room_size("456"), 0);
        assert_eq!(broadcaster.total_memberships(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_joins_keep_all_members() {
        let broadcaster = std::sync::Arc::new(RealtimeBroadcaster::new());
        let mut receivers = Vec::new();
        let mut tasks = Vec::new();

        for _ in 0..16 {
            let (handle, rx) = connection();
            receivers.push(rx);
            let broadcaster = broadcaster.clone();
            tasks.push(tokio::spawn(async move {
                broadcaster.subscribe("123", handle);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(broadcaster.room_size("123"), 16);

        broadcaster.broadcast("123", update("456"));
        for rx in &mut receivers {
            assert!(rx.try_recv().is_ok());
        }
    }
}
