use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::EngineError,
    identity::repo_types::{User, UserSummary},
    messaging::{dto::ConversationSummary, repo_types::DirectMessage},
    realtime::{Fanout, FanoutEvent, PrivateMessagePayload},
};

/// Owns message persistence, conversation aggregation and the read-state
/// transition. Live delivery goes through the injected fan-out capability.
#[derive(Clone)]
pub struct MessagingEngine {
    db: PgPool,
    fanout: Arc<Fanout>,
}

impl MessagingEngine {
    pub fn new(db: PgPool, fanout: Arc<Fanout>) -> Self {
        Self { db, fanout }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        content: &str,
    ) -> Result<DirectMessage, EngineError> {
        if sender_id.is_nil() || receiver_id.is_nil() {
            return Err(EngineError::Validation(
                "senderId and receiverId are required".into(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(EngineError::Validation("content must not be empty".into()));
        }

        // Only the sender is checked. The receiver may be gone; the message
        // still lands in the history.
        let sender = User::find_summary(&self.db, sender_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("sender not found".into()))?;

        let message = DirectMessage::insert(&self.db, sender_id, receiver_id, content).await?;

        let from = sender.fullname.unwrap_or(sender.username);
        let delivered = self.fanout.publish(
            receiver_id,
            FanoutEvent::PrivateMessage(PrivateMessagePayload {
                id: message.id,
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
                from,
                content: message.content.clone(),
                created_at: message.created_at,
            }),
        );
        debug!(message_id = %message.id, receiver_id = %receiver_id, delivered, "private message published");

        Ok(message)
    }

    /// Marks everything the counterpart sent to `sender_id` as read, then
    /// returns the whole history oldest first. The side effect is the point:
    /// opening a conversation is what clears the unread counters.
    pub async fn fetch_conversation_marking_read(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<Vec<DirectMessage>, EngineError> {
        if sender_id.is_nil() || receiver_id.is_nil() {
            return Err(EngineError::Validation(
                "senderId and receiverId are required".into(),
            ));
        }

        let (sender_exists, receiver_exists) = tokio::try_join!(
            User::exists(&self.db, sender_id),
            User::exists(&self.db, receiver_id),
        )?;
        if !sender_exists || !receiver_exists {
            return Err(EngineError::NotFound("user not found".into()));
        }

        let flipped =
            DirectMessage::mark_conversation_read(&self.db, sender_id, receiver_id).await?;
        if flipped > 0 {
            debug!(reader_id = %sender_id, counterpart_id = %receiver_id, flipped, "messages marked read");
        }

        Ok(DirectMessage::conversation(&self.db, sender_id, receiver_id).await?)
    }

    pub async fn list_conversation_summaries(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ConversationSummary>, EngineError> {
        if user_id.is_nil() {
            return Err(EngineError::Validation("userId is required".into()));
        }
        if !User::exists(&self.db, user_id).await? {
            return Err(EngineError::NotFound("user not found".into()));
        }

        let messages = DirectMessage::all_touching(&self.db, user_id).await?;
        let groups = summarize_conversations(user_id, messages);

        let ids: Vec<Uuid> = groups.iter().map(|g| g.counterpart_id).collect();
        let profiles: HashMap<Uuid, UserSummary> = User::find_summaries(&self.db, &ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        // counterparts whose user row vanished drop out of the joined list
        let summaries = groups
            .into_iter()
            .filter_map(|g| {
                profiles
                    .get(&g.counterpart_id)
                    .cloned()
                    .map(|contact| ConversationSummary {
                        contact,
                        last_message: g.last_message,
                        unread_count: g.unread_count,
                    })
            })
            .collect();
        Ok(summaries)
    }
}

pub(crate) struct ConversationGroup {
    pub counterpart_id: Uuid,
    pub last_message: DirectMessage,
    pub unread_count: i64,
}

/// Single grouping pass keyed by "the other party". The newest message per
/// counterpart wins `last_message`; unread counts only messages addressed to
/// `user_id`. Result is ordered by last message, newest first.
pub(crate) fn summarize_conversations(
    user_id: Uuid,
    messages: Vec<DirectMessage>,
) -> Vec<ConversationGroup> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut groups: HashMap<Uuid, ConversationGroup> = HashMap::new();

    for message in messages {
        let counterpart_id = if message.sender_id == user_id {
            message.receiver_id
        } else {
            message.sender_id
        };
        let unread = i64::from(message.receiver_id == user_id && !message.read);

        match groups.get_mut(&counterpart_id) {
            Some(group) => {
                group.unread_count += unread;
                if message.created_at > group.last_message.created_at {
                    group.last_message = message;
                }
            }
            None => {
                order.push(counterpart_id);
                groups.insert(
                    counterpart_id,
                    ConversationGroup {
                        counterpart_id,
                        last_message: message,
                        unread_count: unread,
                    },
                );
            }
        }
    }

    let mut result: Vec<ConversationGroup> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .collect();
    result.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    result
}
