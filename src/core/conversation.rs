use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::core::directory::Directory;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{MatchStatus, Message, MessageView, PublicUser, SendMessageRequest, UserId};
use crate::services::Store;

/// Messages between matched users
#[derive(Clone)]
pub struct Conversations {
    store: Arc<dyn Store>,
    directory: Directory,
}

impl Conversations {
    pub fn new(store: Arc<dyn Store>, directory: Directory) -> Self {
        Self { store, directory }
    }

    /// Send a message to a matched user
    pub async fn send(&self, sender: UserId, request: SendMessageRequest) -> ServiceResult<MessageView> {
        request.validate()?;

        let sender_profile = PublicUser::from(self.directory.resolve(sender).await?);
        let recipient_profile = PublicUser::from(self.directory.resolve(request.recipient_id).await?);

        self.require_matched(sender, request.recipient_id).await?;

        let message = self
            .store
            .insert_message(sender, request.recipient_id, &request.content)
            .await?;

        tracing::info!(
            "User {} sent message {} to user {}",
            sender,
            message.id,
            request.recipient_id
        );

        Ok(MessageView {
            id: message.id,
            sender: sender_profile,
            recipient: recipient_profile,
            content: message.content,
            sent_at: message.sent_at,
            read_at: message.read_at,
        })
    }

    /// The conversation between `viewer` and `other`, oldest first.
    ///
    /// Viewing acknowledges receipt: every message addressed to the viewer
    /// that is still unread is stamped before the list is returned.
    pub async fn conversation(&self, viewer: UserId, other: UserId) -> ServiceResult<Vec<MessageView>> {
        let mut messages = self.fetch_conversation(viewer, other).await?;
        self.acknowledge(viewer, &mut messages).await?;

        let profiles = self.directory.public_profiles(&[viewer, other]).await?;
        Ok(render(messages, &profiles))
    }

    /// Fetch phase of [`Conversations::conversation`]: no side effects
    pub async fn fetch_conversation(&self, viewer: UserId, other: UserId) -> ServiceResult<Vec<Message>> {
        self.require_matched(viewer, other).await?;
        Ok(self.store.find_messages_between(viewer, other).await?)
    }

    /// Mark-read phase: stamp every message in `messages` that is unread and
    /// addressed to `viewer`, in the store and in place.
    pub async fn acknowledge(&self, viewer: UserId, messages: &mut [Message]) -> ServiceResult<u64> {
        let unread: Vec<i64> = messages
            .iter()
            .filter(|m| m.is_unread_by(viewer))
            .map(|m| m.id)
            .collect();

        if unread.is_empty() {
            return Ok(0);
        }

        let read_at = Utc::now();
        let stamped = self.store.mark_read(viewer, &unread, read_at).await?;

        for message in messages.iter_mut().filter(|m| m.is_unread_by(viewer)) {
            message.read_at = Some(read_at);
        }

        tracing::debug!("User {} read {} messages", viewer, stamped);

        Ok(stamped)
    }

    /// Unread messages addressed to the user
    pub async fn unread(&self, user_id: UserId) -> ServiceResult<Vec<MessageView>> {
        let messages = self.store.find_unread_for(user_id).await?;

        let ids: Vec<UserId> = messages
            .iter()
            .flat_map(|m| [m.sender_id, m.recipient_id])
            .collect();
        let profiles = self.directory.public_profiles(&ids).await?;

        Ok(render(messages, &profiles))
    }

    async fn require_matched(&self, a: UserId, b: UserId) -> ServiceResult<()> {
        match self.store.find_match_between(a, b).await? {
            Some(record) if record.status == MatchStatus::Matched => Ok(()),
            _ => Err(ServiceError::InvalidOperation(
                "You can only message matched users".to_string(),
            )),
        }
    }
}

fn render(messages: Vec<Message>, profiles: &HashMap<UserId, PublicUser>) -> Vec<MessageView> {
    messages
        .into_iter()
        .filter_map(|m| {
            Some(MessageView {
                id: m.id,
                sender: profiles.get(&m.sender_id)?.clone(),
                recipient: profiles.get(&m.recipient_id)?.clone(),
                content: m.content,
                sent_at: m.sent_at,
                read_at: m.read_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MatchEngine;
    use crate::models::{Gender, NewUser};
    use crate::services::MemoryStore;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            first_name: username.to_string(),
            last_name: "Test".to_string(),
            birth_date: None,
            department: Some("Engineering".to_string()),
            job_title: None,
            gender: Gender::Female,
            interested_in_genders: vec![Gender::Female],
        }
    }

    async fn setup() -> (Arc<dyn Store>, MatchEngine, Conversations, UserId, UserId) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let a = store.create_user(new_user("ann")).await.unwrap().id;
        let b = store.create_user(new_user("bea")).await.unwrap().id;
        let directory = Directory::new(store.clone());
        let engine = MatchEngine::new(store.clone(), directory.clone());
        let conversations = Conversations::new(store.clone(), directory);
        (store, engine, conversations, a, b)
    }

    fn request(recipient_id: UserId, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            recipient_id,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_requires_match() {
        let (store, engine, conversations, a, b) = setup().await;

        let err = conversations.send(a, request(b, "hi")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));

        // A pending like is not enough either
        engine.like(a, b).await.unwrap();
        let err = conversations.send(b, request(a, "hi")).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));

        assert!(store.find_messages_between(a, b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_to_unknown_user_is_not_found() {
        let (_, _, conversations, a, _) = setup().await;

        let err = conversations.send(a, request(999, "hi")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_content_rejected() {
        let (_, engine, conversations, a, b) = setup().await;
        engine.like(a, b).await.unwrap();
        engine.like(b, a).await.unwrap();

        let err = conversations.send(a, request(b, "")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_fetch_has_no_side_effects_and_acknowledge_stamps() {
        let (store, engine, conversations, a, b) = setup().await;
        engine.like(a, b).await.unwrap();
        engine.like(b, a).await.unwrap();

        conversations.send(b, request(a, "one")).await.unwrap();
        conversations.send(a, request(b, "two")).await.unwrap();

        let mut messages = conversations.fetch_conversation(a, b).await.unwrap();
        assert_eq!(store.find_unread_for(a).await.unwrap().len(), 1);

        let stamped = conversations.acknowledge(a, &mut messages).await.unwrap();
        assert_eq!(stamped, 1);
        assert!(messages[0].read_at.is_some());
        // The viewer's own outbound message stays unread for the other side
        assert!(messages[1].read_at.is_none());
        assert_eq!(store.find_unread_for(b).await.unwrap().len(), 1);
    }
}
