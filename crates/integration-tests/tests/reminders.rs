use chrono::Duration;
use domains::{Clock, DomainError, NotificationTarget};
use integration_tests::Harness;

#[tokio::test]
async fn reminder_is_scheduled_delay_hours_from_now() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);
    let post = h.post(bob, "Conference talk on async Rust next week").await;

    let reminder = h.services.reminders.schedule(alice, post.id, 3).await.unwrap();
    assert_eq!(reminder.scheduled_time, h.clock.now() + Duration::hours(3));

    let listed = h.services.reminders.list(alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, reminder.id);
    assert_eq!(listed[0].target, NotificationTarget::Reminder(post.id));
    assert_eq!(
        listed[0].content,
        "Reminder for post by bob: \"Conference talk on async Rust next week\""
    );
}

#[tokio::test]
async fn long_content_is_truncated_in_the_preview() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let post = h.post(alice, &"x".repeat(80)).await;

    h.services.reminders.schedule(alice, post.id, 1).await.unwrap();
    let listed = h.services.reminders.list(alice).await.unwrap();
    let expected = format!("Reminder for post by alice: \"{}...\"", "x".repeat(50));
    assert_eq!(listed[0].content, expected);
}

#[tokio::test]
async fn invalid_delay_and_archived_posts_are_rejected() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);
    let post = h.post(bob, "soon archived").await;

    assert!(matches!(
        h.services.reminders.schedule(alice, post.id, 0).await,
        Err(DomainError::Validation(_))
    ));
    h.services.posts.archive(post.id, bob).await.unwrap();
    assert!(matches!(
        h.services.reminders.schedule(alice, post.id, 2).await,
        Err(DomainError::NotFound(_))
    ));
    assert!(h.services.reminders.list(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn reminders_stay_hidden_until_due_then_sweep_once() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let post = h.post(alice, "note to self").await;
    let notifications = &h.services.notifications;

    h.services.reminders.schedule(alice, post.id, 2).await.unwrap();
    assert!(notifications.list(alice).await.unwrap().is_empty());
    assert_eq!(notifications.unread_count(alice).await.unwrap(), 0);
    assert_eq!(notifications.mark_all_read(alice).await.unwrap(), 0);
    assert_eq!(h.services.reminders.sweep().await.unwrap(), 0);

    h.clock.advance(Duration::hours(2));
    let inbox = notifications.list(alice).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(!inbox[0].is_read);
    assert_eq!(notifications.unread_count(alice).await.unwrap(), 1);

    assert_eq!(h.services.reminders.sweep().await.unwrap(), 1);
    assert_eq!(h.services.reminders.sweep().await.unwrap(), 0);
}

#[tokio::test]
async fn only_the_owner_cancels_a_reminder() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);
    let post = h.post(bob, "event").await;
    let reminder = h.services.reminders.schedule(alice, post.id, 1).await.unwrap();

    assert!(matches!(
        h.services.reminders.cancel(reminder.id, bob).await,
        Err(DomainError::NotFound(_))
    ));
    h.services.reminders.cancel(reminder.id, alice).await.unwrap();
    assert!(h.services.reminders.list(alice).await.unwrap().is_empty());
}
