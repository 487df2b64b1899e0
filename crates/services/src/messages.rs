//! Private messaging between two users.
//!
//! A sent message is persisted, announced to the receiver as a `message`
//! notification and, when the receiver is connected, pushed live as
//! `new_message`. Blocking in either direction closes the channel.

use std::sync::Arc;

use domains::{
    ConversationMessage, ConversationSummary, DomainError, DomainResult, LiveDelivery, LiveEvent,
    Message, MessageId, MessageRepository, NewMessage, NotificationTarget, SocialGraphRepository,
    User, UserId, UserRepository, UserSummary,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::notifications::NotificationService;

/// One thread as seen by `user`.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub contact: UserSummary,
    pub messages: Vec<ConversationMessage>,
}

pub struct MessageService {
    users: Arc<dyn UserRepository>,
    graph: Arc<dyn SocialGraphRepository>,
    messages: Arc<dyn MessageRepository>,
    live: Arc<dyn LiveDelivery>,
    notifications: Arc<NotificationService>,
}

impl MessageService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        graph: Arc<dyn SocialGraphRepository>,
        messages: Arc<dyn MessageRepository>,
        live: Arc<dyn LiveDelivery>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            graph,
            messages,
            live,
            notifications,
        }
    }

    #[instrument(skip(self, content, attachment_url))]
    pub async fn send(
        &self,
        sender: UserId,
        receiver: UserId,
        content: Option<String>,
        attachment_url: Option<String>,
    ) -> DomainResult<Message> {
        if sender == receiver {
            return Err(DomainError::self_reference("message"));
        }
        let content = content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if content.is_none() && attachment_url.is_none() {
            return Err(DomainError::Validation(
                "Message must have content or an attachment".into(),
            ));
        }
        let sender_user = self.existing(sender).await?;
        self.existing(receiver).await?;
        self.ensure_not_blocked(sender, receiver).await?;

        let message = self
            .messages
            .insert(NewMessage {
                sender_id: sender,
                receiver_id: receiver,
                content,
                attachment_url,
            })
            .await?;
        info!(message = %message.id, "message stored");

        self.live.push(
            receiver,
            LiveEvent::NewMessage {
                message: message.content.clone().unwrap_or_default(),
                sender_id: sender,
                timestamp: message.created_at,
            },
        );
        self.notifications
            .notify(
                receiver,
                NotificationTarget::Message(sender),
                format!("New message from {}", sender_user.username),
            )
            .await;

        Ok(message)
    }

    /// The thread between `user` and `peer`, oldest first. Opening it marks
    /// the peer's messages as read.
    #[instrument(skip(self))]
    pub async fn conversation(&self, user: UserId, peer: UserId) -> DomainResult<Conversation> {
        let contact = self.existing(peer).await?;
        let marked = self.messages.mark_conversation_read(peer, user).await?;
        debug!(marked, "conversation opened");

        let messages = self
            .messages
            .conversation(user, peer)
            .await?
            .into_iter()
            .map(|message| ConversationMessage {
                is_outgoing: message.sender_id == user,
                message,
            })
            .collect();

        Ok(Conversation {
            contact: UserSummary {
                id: contact.id,
                username: contact.username,
                bio: contact.bio,
            },
            messages,
        })
    }

    pub async fn conversations(&self, user: UserId) -> DomainResult<Vec<ConversationSummary>> {
        self.messages.conversations(user).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: MessageId, user: UserId) -> DomainResult<()> {
        let message = self
            .messages
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message"))?;
        if message.sender_id != user {
            return Err(DomainError::NotAuthorized(
                "Only the sender can delete a message".into(),
            ));
        }
        self.messages.delete(id).await
    }

    /// Forwards a live-only message typed on the socket. Nothing is stored.
    /// Returns whether the receiver was connected.
    pub async fn relay(&self, sender: UserId, receiver: UserId, text: String) -> DomainResult<bool> {
        self.ensure_not_blocked(sender, receiver).await?;
        Ok(self.live.push(
            receiver,
            LiveEvent::NewMessage {
                message: text,
                sender_id: sender,
                timestamp: chrono::Utc::now(),
            },
        ))
    }

    async fn existing(&self, id: UserId) -> DomainResult<User> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }

    async fn ensure_not_blocked(&self, a: UserId, b: UserId) -> DomainResult<()> {
        if self.graph.is_blocked(a, b).await? || self.graph.is_blocked(b, a).await? {
            return Err(DomainError::NotAuthorized(
                "You cannot message this user".into(),
            ));
        }
        Ok(())
    }
}
