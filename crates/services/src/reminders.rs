//! # ReminderScheduler
//!
//! A reminder is a notification addressed to its own creator with a
//! `scheduled_time` in the future. Listings hide it until that time; the
//! sweeper then pushes it live once.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use domains::{
    Clock, DomainError, DomainResult, Notification, NotificationId, NotificationRepository,
    NotificationTarget, Post, PostId, PostRepository, Reminder, UserId, UserRepository,
};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::notifications::NotificationService;

const PREVIEW_CHARS: usize = 50;

pub struct ReminderService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    repo: Arc<dyn NotificationRepository>,
    notifications: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        repo: Arc<dyn NotificationRepository>,
        notifications: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            posts,
            repo,
            notifications,
            clock,
        }
    }

    /// Schedules a reminder about `post_id` for `user`, `delay_hours` from now.
    #[instrument(skip(self))]
    pub async fn schedule(
        &self,
        user: UserId,
        post_id: PostId,
        delay_hours: i64,
    ) -> DomainResult<Reminder> {
        if delay_hours < 1 {
            return Err(DomainError::Validation(
                "Reminder delay must be at least one hour".into(),
            ));
        }
        let scheduled_time = Duration::try_hours(delay_hours)
            .and_then(|delay| self.clock.now().checked_add_signed(delay))
            .ok_or_else(|| DomainError::Validation("Reminder delay is too large".into()))?;
        let post = self
            .posts
            .find(post_id)
            .await?
            .filter(Post::is_visible)
            .ok_or_else(|| DomainError::not_found("Post"))?;
        let owner = self
            .users
            .find(post.owner)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        let recorded = self
            .notifications
            .record(
                user,
                NotificationTarget::Reminder(post_id),
                format!("Reminder for post by {owner}: \"{}\"", preview(&post.content)),
                Some(scheduled_time),
            )
            .await?;
        info!(id = %recorded.id, %scheduled_time, "reminder scheduled");

        Ok(Reminder {
            id: recorded.id,
            scheduled_time,
        })
    }

    /// All of the user's reminders, soonest first, including future ones.
    pub async fn list(&self, user: UserId) -> DomainResult<Vec<Notification>> {
        self.repo.reminders(user).await
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, id: NotificationId, user: UserId) -> DomainResult<()> {
        if !self.repo.delete_reminder(id, user).await? {
            return Err(DomainError::NotFound(
                "Reminder not found or not authorized to delete".into(),
            ));
        }
        Ok(())
    }

    /// Pushes every reminder that became due since the last sweep. Returns
    /// how many were claimed.
    pub async fn sweep(&self) -> DomainResult<usize> {
        let due = self.repo.claim_due_reminders(self.clock.now()).await?;
        for reminder in &due {
            self.notifications.push_live(reminder);
        }
        if !due.is_empty() {
            info!(count = due.len(), "due reminders delivered");
        }
        Ok(due.len())
    }
}

/// Runs [`ReminderService::sweep`] every `every` until the task is aborted.
pub fn spawn_sweeper(service: Arc<ReminderService>, every: StdDuration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.sweep().await {
                error!(error = %err, "reminder sweep failed");
            }
        }
    })
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
