//! In-memory store implementation
//!
//! Same semantics as the PostgreSQL backend, held behind a single lock so
//! every operation is atomic. Data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::core::directory::is_potential_match;
use crate::models::{Match, MatchStatus, Message, NewUser, ProfileUpdate, User, UserId};
use crate::services::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    matches: BTreeMap<i64, Match>,
    messages: BTreeMap<i64, Message>,
    next_user_id: i64,
    next_match_id: i64,
    next_message_id: i64,
}

impl Inner {
    fn pair_match(&self, a: UserId, b: UserId) -> Option<&Match> {
        self.matches.values().find(|m| {
            (m.initiator_id == a && m.recipient_id == b) || (m.initiator_id == b && m.recipient_id == a)
        })
    }
}

/// In-memory store for users, matches and messages
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner
            .users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(StoreError::Duplicate(new_user.username));
        }

        inner.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: inner.next_user_id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            birth_date: new_user.birth_date,
            department: new_user.department,
            job_title: new_user.job_title,
            bio: None,
            profile_image_url: None,
            gender: new_user.gender,
            interested_in_genders: new_user.interested_in_genders,
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };

        user.first_name = update.first_name.clone();
        user.last_name = update.last_name.clone();
        user.bio = update.bio.clone();
        user.department = update.department.clone();
        user.job_title = update.job_title.clone();
        user.profile_image_url = update.profile_image_url.clone();
        user.interested_in_genders = update.interested_in_genders.clone();
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn find_potential_matches(&self, viewer: &User) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|candidate| is_potential_match(viewer, candidate))
            .cloned()
            .collect())
    }

    async fn find_match_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Match>> {
        Ok(self.inner.read().await.pair_match(a, b).cloned())
    }

    async fn insert_pending_match(&self, initiator: UserId, recipient: UserId) -> StoreResult<Option<Match>> {
        let mut inner = self.inner.write().await;

        if inner.pair_match(initiator, recipient).is_some() {
            return Ok(None);
        }

        inner.next_match_id += 1;
        let record = Match {
            id: inner.next_match_id,
            initiator_id: initiator,
            recipient_id: recipient,
            status: MatchStatus::Pending,
            created_at: Utc::now(),
            matched_at: None,
        };
        inner.matches.insert(record.id, record.clone());

        Ok(Some(record))
    }

    async fn transition_match(&self, id: i64, from: MatchStatus, to: MatchStatus) -> StoreResult<Option<Match>> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.matches.get_mut(&id) else {
            return Ok(None);
        };

        if record.status != from {
            return Ok(None);
        }

        record.status = to;
        if to == MatchStatus::Matched {
            record.matched_at = Some(Utc::now());
        }

        Ok(Some(record.clone()))
    }

    async fn find_matched_for_user(&self, user_id: UserId) -> StoreResult<Vec<Match>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matches
            .values()
            .filter(|m| m.involves(user_id) && m.status == MatchStatus::Matched)
            .cloned()
            .collect())
    }

    async fn find_pending_for_recipient(&self, user_id: UserId) -> StoreResult<Vec<Match>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matches
            .values()
            .filter(|m| m.recipient_id == user_id && m.status == MatchStatus::Pending)
            .cloned()
            .collect())
    }

    async fn insert_message(&self, sender: UserId, recipient: UserId, content: &str) -> StoreResult<Message> {
        let mut inner = self.inner.write().await;

        inner.next_message_id += 1;
        let message = Message {
            id: inner.next_message_id,
            sender_id: sender,
            recipient_id: recipient,
            content: content.to_string(),
            sent_at: Utc::now(),
            read_at: None,
        };
        inner.messages.insert(message.id, message.clone());

        Ok(message)
    }

    async fn find_messages_between(&self, a: UserId, b: UserId) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .values()
            .filter(|m| {
                (m.sender_id == a && m.recipient_id == b) || (m.sender_id == b && m.recipient_id == a)
            })
            .cloned()
            .collect();

        messages.sort_by(|x, y| x.sent_at.cmp(&y.sent_at).then(x.id.cmp(&y.id)));

        Ok(messages)
    }

    async fn mark_read(&self, recipient: UserId, ids: &[i64], read_at: DateTime<Utc>) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let mut stamped = 0;

        for id in ids {
            if let Some(message) = inner.messages.get_mut(id) {
                if message.is_unread_by(recipient) {
                    message.read_at = Some(read_at);
                    stamped += 1;
                }
            }
        }

        Ok(stamped)
    }

    async fn find_unread_for(&self, user_id: UserId) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        Ok(inner
            .messages
            .values()
            .filter(|m| m.is_unread_by(user_id))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}
