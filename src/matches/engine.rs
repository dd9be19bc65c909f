use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{conflict_on_unique, EngineError},
    identity::repo_types::{User, UserSummary},
    matches::{
        dto::{PendingMatch, PendingRequests},
        repo_types::{MatchRequest, MatchStatus},
    },
};

/// Owns the request/accept/reject state machine:
/// `pending --accept--> accepted` (terminal), `pending --reject--> deleted`.
#[derive(Clone)]
pub struct MatchEngine {
    db: PgPool,
}

impl MatchEngine {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn request_match(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<MatchRequest, EngineError> {
        if sender_id.is_nil() || receiver_id.is_nil() {
            return Err(EngineError::Validation(
                "senderId and receiverId are required".into(),
            ));
        }

        let (sender_exists, receiver_exists) = tokio::try_join!(
            User::exists(&self.db, sender_id),
            User::exists(&self.db, receiver_id),
        )?;
        if !sender_exists {
            return Err(EngineError::NotFound("sender not found".into()));
        }
        if !receiver_exists {
            return Err(EngineError::NotFound("receiver not found".into()));
        }

        // No pre-check for an existing pair: the insert itself is the race
        // arbiter via the unique index.
        let request = MatchRequest::insert(&self.db, sender_id, receiver_id)
            .await
            .map_err(|e| conflict_on_unique(e, "match request already exists"))?;

        info!(sender_id = %sender_id, receiver_id = %receiver_id, "match requested");
        Ok(request)
    }

    pub async fn respond_to_match(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
        accept: bool,
    ) -> Result<MatchStatus, EngineError> {
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

        if accept {
            match MatchRequest::accept(&self.db, sender_id, receiver_id).await? {
                Some(request) => {
                    info!(sender_id = %sender_id, receiver_id = %receiver_id, "match accepted");
                    Ok(request.status)
                }
                None => Err(EngineError::NotFound("match request not found".into())),
            }
        } else if MatchRequest::delete_pending(&self.db, sender_id, receiver_id).await? {
            info!(sender_id = %sender_id, receiver_id = %receiver_id, "match rejected");
            Ok(MatchStatus::Rejected)
        } else {
            Err(EngineError::NotFound("match request not found".into()))
        }
    }

    /// Everyone connected to the user through an accepted request, as the
    /// other party's minimal profile.
    pub async fn list_connections(&self, user_id: Uuid) -> Result<Vec<UserSummary>, EngineError> {
        if !User::exists(&self.db, user_id).await? {
            return Err(EngineError::NotFound("user not found".into()));
        }

        let rows = MatchRequest::list_accepted_for(&self.db, user_id).await?;
        let profiles = self.counterpart_profiles(user_id, &rows).await?;
        Ok(join_connections(user_id, rows, &profiles))
    }

    /// Pending rows touching the user, partitioned by which side they are on.
    pub async fn list_pending(&self, user_id: Uuid) -> Result<PendingRequests, EngineError> {
        if !User::exists(&self.db, user_id).await? {
            return Err(EngineError::NotFound("user not found".into()));
        }

        let rows = MatchRequest::list_pending_for(&self.db, user_id).await?;
        let profiles = self.counterpart_profiles(user_id, &rows).await?;
        Ok(partition_pending(user_id, rows, &profiles))
    }

    async fn counterpart_profiles(
        &self,
        user_id: Uuid,
        rows: &[MatchRequest],
    ) -> Result<HashMap<Uuid, UserSummary>, EngineError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| counterpart_of(r, user_id)).collect();
        let summaries = User::find_summaries(&self.db, &ids).await?;
        Ok(summaries.into_iter().map(|s| (s.id, s)).collect())
    }
}

fn counterpart_of(request: &MatchRequest, user_id: Uuid) -> Uuid {
    if request.sender_id == user_id {
        request.receiver_id
    } else {
        request.sender_id
    }
}

/// Keeps the row order of `rows`; counterparts whose user row has vanished
/// are dropped from the result.
fn join_connections(
    user_id: Uuid,
    rows: Vec<MatchRequest>,
    profiles: &HashMap<Uuid, UserSummary>,
) -> Vec<UserSummary> {
    rows.iter()
        .filter_map(|row| profiles.get(&counterpart_of(row, user_id)).cloned())
        .collect()
}

fn partition_pending(
    user_id: Uuid,
    rows: Vec<MatchRequest>,
    profiles: &HashMap<Uuid, UserSummary>,
) -> PendingRequests {
    let mut sent_by_me = Vec::new();
    let mut received_by_me = Vec::new();

    for request in rows {
        let Some(counterpart) = profiles.get(&counterpart_of(&request, user_id)).cloned() else {
            continue;
        };
        let sent = request.sender_id == user_id;
        let entry = PendingMatch {
            request,
            counterpart,
        };
        if sent {
            sent_by_me.push(entry);
        } else {
            received_by_me.push(entry);
        }
    }

    PendingRequests {
        sent_by_me,
        received_by_me,
    }
}

#[cfg(test)]
mod engine_tests {
    use super::*;
    use crate::state::AppState;
    use time::OffsetDateTime;

    fn row(sender_id: Uuid, receiver_id: Uuid, status: MatchStatus) -> MatchRequest {
        MatchRequest {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn summary(id: Uuid, username: &str) -> UserSummary {
        UserSummary {
            id,
            username: username.into(),
            fullname: None,
            avatar_id: None,
        }
    }

    #[tokio::test]
    async fn nil_ids_are_rejected_before_touching_the_store() {
        let state = AppState::fake();
        let engine = MatchEngine::new(state.db.clone());

        let err = engine
            .request_match(Uuid::nil(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = engine
            .respond_to_match(Uuid::new_v4(), Uuid::nil(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn connections_expose_the_other_party() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let rows = vec![
            row(me, alice, MatchStatus::Accepted),
            row(bob, me, MatchStatus::Accepted),
        ];
        let profiles: HashMap<_, _> = [
            (alice, summary(alice, "alice")),
            (bob, summary(bob, "bob")),
        ]
        .into_iter()
        .collect();

        let connections = join_connections(me, rows, &profiles);
        let usernames: Vec<_> = connections.iter().map(|c| c.username.as_str()).collect();
        assert_eq!(usernames, vec!["alice", "bob"]);
    }

    #[test]
    fn connections_drop_vanished_counterparts() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let rows = vec![
            row(me, ghost, MatchStatus::Accepted),
            row(me, alice, MatchStatus::Accepted),
        ];
        let profiles: HashMap<_, _> = [(alice, summary(alice, "alice"))].into_iter().collect();

        let connections = join_connections(me, rows, &profiles);
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].username, "alice");
    }

    #[test]
    fn pending_rows_partition_by_side() {
        let me = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let rows = vec![
            row(me, alice, MatchStatus::Pending),
            row(bob, me, MatchStatus::Pending),
        ];
        let profiles: HashMap<_, _> = [
            (alice, summary(alice, "alice")),
            (bob, summary(bob, "bob")),
        ]
        .into_iter()
        .collect();

        let pending = partition_pending(me, rows, &profiles);
        assert_eq!(pending.sent_by_me.len(), 1);
        assert_eq!(pending.sent_by_me[0].counterpart.username, "alice");
        assert_eq!(pending.received_by_me.len(), 1);
        assert_eq!(pending.received_by_me[0].counterpart.username, "bob");
    }
}
