//! # NotificationCenter
//!
//! Records social events and hands them to the live channel.
//!
//! Lifecycle per entry: created → (unread) → read → deleted, or created →
//! deleted. There is deliberately no way back from read to unread.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    Clock, DomainError, DomainResult, LiveDelivery, LiveEvent, NewNotification, Notification,
    NotificationId, NotificationRepository, NotificationTarget, UserId,
};
use tracing::{debug, instrument, warn};

/// Maximum number of entries returned by a listing.
pub const LIST_LIMIT: i64 = 50;

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
    live: Arc<dyn LiveDelivery>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    pub fn new(
        repo: Arc<dyn NotificationRepository>,
        live: Arc<dyn LiveDelivery>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, live, clock }
    }

    /// Pure insert. Recipient existence is the caller's responsibility: it is
    /// always derived from an already validated actor or target.
    pub async fn record(
        &self,
        recipient: UserId,
        target: NotificationTarget,
        content: String,
        scheduled_time: Option<DateTime<Utc>>,
    ) -> DomainResult<Notification> {
        self.repo
            .insert(NewNotification {
                recipient,
                target,
                content,
                scheduled_time,
            })
            .await
    }

    /// Records a derived notification and pushes it to the recipient if they
    /// are connected.
    ///
    /// Best-effort: the primary action that triggered it has already
    /// succeeded, so a failed insert is logged and swallowed.
    pub async fn notify(
        &self,
        recipient: UserId,
        target: NotificationTarget,
        content: String,
    ) -> Option<Notification> {
        match self.record(recipient, target, content, None).await {
            Ok(notification) => {
                self.push_live(&notification);
                Some(notification)
            }
            Err(err) => {
                warn!(
                    recipient = %recipient,
                    kind = target.type_name(),
                    error = %err,
                    "dropping derived notification"
                );
                None
            }
        }
    }

    /// Pushes a persisted entry as `new_notification`. Returns whether a
    /// connection took it.
    pub fn push_live(&self, notification: &Notification) -> bool {
        let delivered = self
            .live
            .push(notification.recipient, LiveEvent::NewNotification(notification.clone()));
        debug!(id = %notification.id, delivered, "live notification push");
        delivered
    }

    /// Newest first, at most [`LIST_LIMIT`], only entries already due.
    pub async fn list(&self, recipient: UserId) -> DomainResult<Vec<Notification>> {
        self.repo
            .list_due(recipient, self.clock.now(), LIST_LIMIT)
            .await
    }

    pub async fn unread_count(&self, recipient: UserId) -> DomainResult<i64> {
        self.repo.unread_count(recipient, self.clock.now()).await
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: NotificationId, recipient: UserId) -> DomainResult<()> {
        self.owned(id, recipient).await?;
        self.repo.mark_read(id).await
    }

    /// Returns the number of entries that were unread.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, recipient: UserId) -> DomainResult<u64> {
        self.repo.mark_all_read(recipient, self.clock.now()).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: NotificationId, recipient: UserId) -> DomainResult<()> {
        self.owned(id, recipient).await?;
        self.repo.delete(id).await
    }

    /// Returns the number of entries removed.
    #[instrument(skip(self))]
    pub async fn clear_all(&self, recipient: UserId) -> DomainResult<u64> {
        self.repo.clear_all(recipient).await
    }

    async fn owned(&self, id: NotificationId, recipient: UserId) -> DomainResult<Notification> {
        let notification = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification"))?;
        if notification.recipient != recipient {
            return Err(DomainError::NotAuthorized(
                "Notification does not belong to you".into(),
            ));
        }
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::clock;
    use domains::{MockLiveDelivery, MockNotificationRepository, PostId};
    use mockall::predicate::eq;

    fn sample(id: i64, recipient: i64) -> Notification {
        Notification {
            id: NotificationId(id),
            recipient: UserId(recipient),
            target: NotificationTarget::Follow(UserId(99)),
            content: "bob started following you".into(),
            is_read: false,
            scheduled_time: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn notify_records_then_pushes_live() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .withf(|n| n.recipient == UserId(2) && n.target == NotificationTarget::Interest(PostId(5)))
            .returning(|_| Ok(sample(1, 2)));
        let mut live = MockLiveDelivery::new();
        live.expect_push()
            .withf(|user, event| *user == UserId(2) && matches!(event, LiveEvent::NewNotification(_)))
            .times(1)
            .return_const(false);

        let svc = NotificationService::new(Arc::new(repo), Arc::new(live), clock());
        let recorded = svc
            .notify(UserId(2), NotificationTarget::Interest(PostId(5)), "x".into())
            .await;
        assert!(recorded.is_some());
    }

    #[tokio::test]
    async fn notify_swallows_store_failures() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_insert()
            .returning(|_| Err(DomainError::Store("disk full".into())));
        let mut live = MockLiveDelivery::new();
        live.expect_push().never();

        let svc = NotificationService::new(Arc::new(repo), Arc::new(live), clock());
        let recorded = svc
            .notify(UserId(2), NotificationTarget::Follow(UserId(1)), "x".into())
            .await;
        assert!(recorded.is_none());
    }

    #[tokio::test]
    async fn mark_read_rejects_foreign_notification() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_find()
            .with(eq(NotificationId(7)))
            .returning(|_| Ok(Some(sample(7, 3))));
        repo.expect_mark_read().never();

        let svc = NotificationService::new(
            Arc::new(repo),
            Arc::new(MockLiveDelivery::new()),
            clock(),
        );
        let err = svc.mark_read(NotificationId(7), UserId(4)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn delete_of_missing_notification_is_not_found() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_find().returning(|_| Ok(None));
        repo.expect_delete().never();

        let svc = NotificationService::new(
            Arc::new(repo),
            Arc::new(MockLiveDelivery::new()),
            clock(),
        );
        let err = svc.delete(NotificationId(1), UserId(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
