//! # InteractionStore
//!
//! Typed (post, user, kind) facts and per-conversation read state.
//!
//! The interest toggle is two atomic statements: remove, and only when
//! nothing was removed, insert-or-ignore. Concurrent toggles by the same user
//! therefore never leave a duplicate fact, and the count is always re-queried
//! instead of being carried as a mutable field.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, InteractionKind, InteractionRepository, MessageId,
    MessageRepository, NotificationTarget, Post, PostId, PostRepository, UserId, UserRepository,
};
use tracing::{debug, instrument};

use crate::notifications::NotificationService;
use crate::username_of;

pub struct InteractionService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    interactions: Arc<dyn InteractionRepository>,
    messages: Arc<dyn MessageRepository>,
    notifications: Arc<NotificationService>,
}

impl InteractionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        interactions: Arc<dyn InteractionRepository>,
        messages: Arc<dyn MessageRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            posts,
            interactions,
            messages,
            notifications,
        }
    }

    /// Flips the user's interest in the post and returns the new total.
    ///
    /// Only a newly created fact notifies the owner, and never for the owner's
    /// own post.
    #[instrument(skip(self))]
    pub async fn toggle_interest(&self, post_id: PostId, user: UserId) -> DomainResult<i64> {
        let post = self.visible_post(post_id).await?;

        let removed = self
            .interactions
            .remove(post_id, user, InteractionKind::Interested)
            .await?;
        let created = if removed {
            false
        } else {
            self.interactions
                .insert(post_id, user, InteractionKind::Interested)
                .await?
        };
        debug!(removed, created, "interest toggled");

        if created && post.owner != user {
            if let Some(name) = username_of(self.users.as_ref(), user).await {
                self.notifications
                    .notify(
                        post.owner,
                        NotificationTarget::Interest(post_id),
                        format!("{name} showed interest in your post"),
                    )
                    .await;
            }
        }

        self.interactions
            .count(post_id, InteractionKind::Interested)
            .await
    }

    /// Idempotent: saving twice leaves one fact.
    #[instrument(skip(self))]
    pub async fn save(&self, post_id: PostId, user: UserId) -> DomainResult<()> {
        self.visible_post(post_id).await?;
        self.interactions
            .insert(post_id, user, InteractionKind::Saved)
            .await?;
        Ok(())
    }

    /// Marks every unread message from `peer` to `user` as read.
    pub async fn mark_conversation_read(&self, peer: UserId, user: UserId) -> DomainResult<u64> {
        self.messages.mark_conversation_read(peer, user).await
    }

    /// Only the receiver may mark a message read.
    #[instrument(skip(self))]
    pub async fn mark_message_read(&self, id: MessageId, user: UserId) -> DomainResult<()> {
        let message = self
            .messages
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Message"))?;
        if message.receiver_id != user {
            return Err(DomainError::NotAuthorized(
                "Not authorized to mark this message as read".into(),
            ));
        }
        self.messages.mark_read(id).await
    }

    pub async fn unread_messages(&self, user: UserId) -> DomainResult<i64> {
        self.messages.unread_count(user).await
    }

    async fn visible_post(&self, id: PostId) -> DomainResult<Post> {
        self.posts
            .find(id)
            .await?
            .filter(Post::is_visible)
            .ok_or_else(|| DomainError::not_found("Post"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, fixed_now, post, stored, user};
    use domains::{
        Message, MockInteractionRepository, MockLiveDelivery, MockMessageRepository,
        MockNotificationRepository, MockPostRepository, MockUserRepository,
    };
    use mockall::predicate::eq;

    struct Mocks {
        users: MockUserRepository,
        posts: MockPostRepository,
        interactions: MockInteractionRepository,
        messages: MockMessageRepository,
        notes: MockNotificationRepository,
    }

    impl Mocks {
        fn new() -> Self {
            let mut users = MockUserRepository::new();
            users
                .expect_find()
                .returning(|id| Ok(Some(user(id.get(), "alice"))));
            Self {
                users,
                posts: MockPostRepository::new(),
                interactions: MockInteractionRepository::new(),
                messages: MockMessageRepository::new(),
                notes: MockNotificationRepository::new(),
            }
        }

        fn with_post(mut self, owner: i64, archived: bool) -> Self {
            self.posts.expect_find().returning(move |id| {
                let mut p = post(id.get(), owner, "hello");
                p.is_archived = archived;
                Ok(Some(p))
            });
            self
        }

        fn build(self) -> InteractionService {
            let mut live = MockLiveDelivery::new();
            live.expect_push().return_const(true);
            let notifications = Arc::new(NotificationService::new(
                Arc::new(self.notes),
                Arc::new(live),
                clock(),
            ));
            InteractionService::new(
                Arc::new(self.users),
                Arc::new(self.posts),
                Arc::new(self.interactions),
                Arc::new(self.messages),
                notifications,
            )
        }
    }

    #[tokio::test]
    async fn first_interest_inserts_and_notifies_owner() {
        let mut m = Mocks::new().with_post(2, false);
        m.interactions.expect_remove().returning(|_, _, _| Ok(false));
        m.interactions
            .expect_insert()
            .with(eq(PostId(5)), eq(UserId(1)), eq(InteractionKind::Interested))
            .times(1)
            .returning(|_, _, _| Ok(true));
        m.interactions.expect_count().returning(|_, _| Ok(1));
        m.notes
            .expect_insert()
            .withf(|n| {
                n.recipient == UserId(2)
                    && n.target == NotificationTarget::Interest(PostId(5))
                    && n.content == "alice showed interest in your post"
            })
            .times(1)
            .returning(|n| Ok(stored(n)));

        let count = m.build().toggle_interest(PostId(5), UserId(1)).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn second_toggle_removes_without_notification() {
        let mut m = Mocks::new().with_post(2, false);
        m.interactions.expect_remove().returning(|_, _, _| Ok(true));
        m.interactions.expect_insert().never();
        m.interactions.expect_count().returning(|_, _| Ok(0));
        m.notes.expect_insert().never();

        let count = m.build().toggle_interest(PostId(5), UserId(1)).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn interest_in_own_post_is_silent() {
        let mut m = Mocks::new().with_post(1, false);
        m.interactions.expect_remove().returning(|_, _, _| Ok(false));
        m.interactions.expect_insert().returning(|_, _, _| Ok(true));
        m.interactions.expect_count().returning(|_, _| Ok(1));
        m.notes.expect_insert().never();

        m.build().toggle_interest(PostId(5), UserId(1)).await.unwrap();
    }

    #[tokio::test]
    async fn archived_post_behaves_as_missing() {
        let mut m = Mocks::new().with_post(2, true);
        m.interactions.expect_remove().never();
        m.interactions.expect_insert().never();
        let svc = m.build();

        assert!(matches!(
            svc.toggle_interest(PostId(5), UserId(1)).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            svc.save(PostId(5), UserId(1)).await,
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_receiver_marks_message_read() {
        let mut m = Mocks::new();
        m.messages.expect_find().returning(|id| {
            Ok(Some(Message {
                id,
                sender_id: UserId(1),
                receiver_id: UserId(2),
                content: Some("hi".into()),
                attachment_url: None,
                is_read: false,
                created_at: fixed_now(),
            }))
        });
        m.messages
            .expect_mark_read()
            .with(eq(MessageId(3)))
            .times(1)
            .returning(|_| Ok(()));
        let svc = m.build();

        assert!(matches!(
            svc.mark_message_read(MessageId(3), UserId(1)).await,
            Err(DomainError::NotAuthorized(_))
        ));
        svc.mark_message_read(MessageId(3), UserId(2)).await.unwrap();
    }
}
