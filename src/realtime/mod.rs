pub mod ws;

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Per-room broadcast buffer; receivers further behind than this lag and skip.
const ROOM_BUFFER: usize = 64;

/// Server-initiated events pushed over a user's realtime channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum FanoutEvent {
    #[serde(rename = "PRIVATE_MESSAGE")]
    PrivateMessage(PrivateMessagePayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    /// Sender's display name, so clients can render without a profile fetch.
    pub from: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// In-process registry mapping a user id to their delivery room. Created once
/// at startup and handed to the messaging engine as an explicit capability.
///
/// Delivery is best effort: no queueing, no retry, no durability. A user with
/// no open channel simply misses the live event and sees the message on the
/// next conversation fetch.
pub struct Fanout {
    rooms: RwLock<HashMap<Uuid, broadcast::Sender<FanoutEvent>>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Joins the user's room, creating it on first use. Every receiver for
    /// the same id sees every event, so multiple devices fan out naturally.
    pub fn register(&self, user_id: Uuid) -> broadcast::Receiver<FanoutEvent> {
        let mut rooms = self.rooms.write();
        rooms
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0)
            .subscribe()
    }

    /// Disconnect hook. The room stays up while other devices still hold a
    /// receiver and is dropped once the last one is gone.
    pub fn unregister(&self, user_id: Uuid) {
        let mut rooms = self.rooms.write();
        if let Some(tx) = rooms.get(&user_id) {
            if tx.receiver_count() == 0 {
                rooms.remove(&user_id);
            }
        }
    }

    /// Delivers the event to every channel currently registered for the user
    /// and returns how many there were. Nobody listening is not an error.
    pub fn publish(&self, user_id: Uuid, event: FanoutEvent) -> usize {
        let rooms = self.rooms.read();
        match rooms.get(&user_id) {
            Some(tx) => tx.send(event).unwrap_or(0),
            None => 0,
        }
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod fanout_tests {
    use super::*;

    fn sample_event(receiver_id: Uuid) -> FanoutEvent {
        FanoutEvent::PrivateMessage(PrivateMessagePayload {
            id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            receiver_id,
            from: "Marta Nilsen".into(),
            content: "hello".into(),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    #[test]
    fn publish_without_listeners_delivers_to_zero() {
        let fanout = Fanout::new();
        let user = Uuid::new_v4();
        assert_eq!(fanout.publish(user, sample_event(user)), 0);
    }

    #[tokio::test]
    async fn registered_channel_receives_events() {
        let fanout = Fanout::new();
        let user = Uuid::new_v4();
        let mut rx = fanout.register(user);

        assert_eq!(fanout.publish(user, sample_event(user)), 1);
        let event = rx.recv().await.expect("event");
        let FanoutEvent::PrivateMessage(payload) = event;
        assert_eq!(payload.receiver_id, user);
        assert_eq!(payload.content, "hello");
    }

    #[tokio::test]
    async fn every_device_in_the_room_gets_the_event() {
        let fanout = Fanout::new();
        let user = Uuid::new_v4();
        let mut phone = fanout.register(user);
        let mut laptop = fanout.register(user);

        assert_eq!(fanout.publish(user, sample_event(user)), 2);
        assert!(phone.recv().await.is_ok());
        assert!(laptop.recv().await.is_ok());
    }

    #[test]
    fn events_do_not_leak_across_rooms() {
        let fanout = Fanout::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let mut alice_rx = fanout.register(alice);

        assert_eq!(fanout.publish(bob, sample_event(bob)), 0);
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn unregister_keeps_the_room_while_devices_remain() {
        let fanout = Fanout::new();
        let user = Uuid::new_v4();
        let phone = fanout.register(user);
        let laptop = fanout.register(user);

        drop(phone);
        fanout.unregister(user);
        // laptop is still connected
        assert_eq!(fanout.publish(user, sample_event(user)), 1);

        drop(laptop);
        fanout.unregister(user);
        assert_eq!(fanout.publish(user, sample_event(user)), 0);
        assert!(fanout.rooms.read().is_empty());
    }

    #[test]
    fn private_message_wire_shape() {
        let user = Uuid::new_v4();
        let json = serde_json::to_value(sample_event(user)).expect("serialize");
        assert_eq!(json["event"], "PRIVATE_MESSAGE");
        let data = &json["data"];
        assert!(data.get("_id").is_some());
        assert!(data.get("senderId").is_some());
        assert!(data.get("receiverId").is_some());
        assert_eq!(data["from"], "Marta Nilsen");
        assert!(data.get("createdAt").is_some());
    }
}
