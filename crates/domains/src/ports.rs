//! # Ports
//!
//! Every adapter must implement these traits to be wired into the binary.
//! Services only ever see `Arc<dyn Port>`; with the `testing` feature the
//! `MockXxx` doubles generated by mockall are exported as well.
//!
//! Boolean returns on mutations report whether a row actually changed, which
//! is how duplicate actions are detected without a read-modify-write cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::DomainResult;
use crate::ids::{CommunityId, EventId, MessageId, NotificationId, PostId, UserId};
use crate::models::{
    AttendanceStatus, Attendee, Community, ConversationSummary, Event, EventUpdate, EventView,
    FeedPost, FeedQuery, FollowOutcome, InteractionKind, LiveEvent, Message, NewCommunity, NewEvent, NewMessage, NewNotification,
    NewPost, NewUser, Notification, Post, PostUpdate, ProfileUpdate, User, UserSummary,
};

/// User rows and profile fields.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> DomainResult<User>;
    async fn find(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> DomainResult<bool>;
    /// Summaries for the given ids; unknown ids are skipped.
    async fn summaries(&self, ids: &[UserId]) -> DomainResult<Vec<UserSummary>>;
    /// Count of non-archived posts.
    async fn post_count(&self, id: UserId) -> DomainResult<i64>;
}

/// The follow and block edge sets.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SocialGraphRepository: Send + Sync {
    /// Inserts the edge unless either user blocks the other. The block check
    /// and the insert are one statement, so a concurrent block cannot slip
    /// between them.
    async fn insert_follow(&self, follower: UserId, followee: UserId)
        -> DomainResult<FollowOutcome>;
    /// Removes the edge; `false` if there was none.
    async fn delete_follow(&self, follower: UserId, followee: UserId) -> DomainResult<bool>;
    async fn is_following(&self, follower: UserId, followee: UserId) -> DomainResult<bool>;
    /// Users `user` follows.
    async fn following(&self, user: UserId) -> DomainResult<Vec<UserId>>;
    /// Users following `user`.
    async fn followers(&self, user: UserId) -> DomainResult<Vec<UserId>>;
    /// Atomically records the block and removes follow edges in both
    /// directions. `false` (and no change at all) if already blocked.
    async fn block_and_sever(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool>;
    async fn delete_block(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool>;
    async fn is_blocked(&self, blocker: UserId, blocked: UserId) -> DomainResult<bool>;
    /// Users `blocker` has blocked.
    async fn blocked_by(&self, blocker: UserId) -> DomainResult<Vec<UserId>>;
    /// Users who have blocked `user`.
    async fn blockers_of(&self, user: UserId) -> DomainResult<Vec<UserId>>;
}

/// Posts, their viewer-relative read shapes and poll votes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> DomainResult<Post>;
    /// Returns archived posts too; callers decide visibility.
    async fn find(&self, id: PostId) -> DomainResult<Option<Post>>;
    async fn update(&self, id: PostId, update: PostUpdate) -> DomainResult<()>;
    async fn archive(&self, id: PostId) -> DomainResult<()>;
    /// Hard delete, including interactions and votes.
    async fn delete(&self, id: PostId) -> DomainResult<()>;
    async fn feed(&self, query: FeedQuery) -> DomainResult<Vec<FeedPost>>;
    /// A single non-archived post with aggregates for `viewer`.
    async fn find_for_viewer(&self, id: PostId, viewer: UserId) -> DomainResult<Option<FeedPost>>;
    async fn by_author(&self, author: UserId, viewer: UserId) -> DomainResult<Vec<FeedPost>>;
    async fn saved_by(&self, user: UserId) -> DomainResult<Vec<FeedPost>>;
    /// `false` if the user already voted on this poll.
    async fn insert_vote(&self, post: PostId, user: UserId, option: i64) -> DomainResult<bool>;
    /// Vote count per option index, `options` entries long.
    async fn vote_counts(&self, post: PostId, options: usize) -> DomainResult<Vec<i64>>;
    async fn vote_of(&self, post: PostId, user: UserId) -> DomainResult<Option<i64>>;
}

/// Typed (post, user, kind) facts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Insert-or-ignore; `true` only when a new fact was created.
    async fn insert(&self, post: PostId, user: UserId, kind: InteractionKind) -> DomainResult<bool>;
    async fn remove(&self, post: PostId, user: UserId, kind: InteractionKind) -> DomainResult<bool>;
    async fn count(&self, post: PostId, kind: InteractionKind) -> DomainResult<i64>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> DomainResult<Message>;
    async fn find(&self, id: MessageId) -> DomainResult<Option<Message>>;
    async fn delete(&self, id: MessageId) -> DomainResult<()>;
    async fn mark_read(&self, id: MessageId) -> DomainResult<()>;
    /// Marks unread messages from `peer` to `receiver`; returns rows changed.
    async fn mark_conversation_read(&self, peer: UserId, receiver: UserId) -> DomainResult<u64>;
    async fn unread_count(&self, receiver: UserId) -> DomainResult<i64>;
    /// Both directions, oldest first.
    async fn conversation(&self, user: UserId, peer: UserId) -> DomainResult<Vec<Message>>;
    async fn conversations(&self, user: UserId) -> DomainResult<Vec<ConversationSummary>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> DomainResult<Notification>;
    async fn find(&self, id: NotificationId) -> DomainResult<Option<Notification>>;
    /// Entries due at `now`, newest first.
    async fn list_due(
        &self,
        recipient: UserId,
        now: DateTime<Utc>,
        limit: i64,
    ) -> DomainResult<Vec<Notification>>;
    async fn unread_count(&self, recipient: UserId, now: DateTime<Utc>) -> DomainResult<i64>;
    async fn mark_read(&self, id: NotificationId) -> DomainResult<()>;
    async fn mark_all_read(&self, recipient: UserId, now: DateTime<Utc>) -> DomainResult<u64>;
    async fn delete(&self, id: NotificationId) -> DomainResult<()>;
    async fn clear_all(&self, recipient: UserId) -> DomainResult<u64>;
    /// Every reminder of the recipient, soonest first, due or not.
    async fn reminders(&self, recipient: UserId) -> DomainResult<Vec<Notification>>;
    async fn delete_reminder(&self, id: NotificationId, recipient: UserId) -> DomainResult<bool>;
    /// Marks elapsed, undelivered reminders as delivered and returns them.
    /// A reminder is returned by at most one call.
    async fn claim_due_reminders(&self, now: DateTime<Utc>) -> DomainResult<Vec<Notification>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// Creates the community with its admin as first member.
    async fn create(&self, community: NewCommunity) -> DomainResult<Community>;
    async fn find(&self, id: CommunityId) -> DomainResult<Option<Community>>;
    /// Every community, largest first.
    async fn list(&self) -> DomainResult<Vec<Community>>;
    /// Communities `user` belongs to, by name.
    async fn for_member(&self, user: UserId) -> DomainResult<Vec<Community>>;
    async fn is_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool>;
    async fn add_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool>;
    async fn remove_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Creates the event and adds each invitee as `pending`.
    async fn create(&self, event: NewEvent, invitees: &[UserId]) -> DomainResult<Event>;
    async fn find(&self, id: EventId) -> DomainResult<Option<Event>>;
    /// `find` plus the creator's name and `viewer`'s own status.
    async fn view(&self, id: EventId, viewer: UserId) -> DomainResult<Option<EventView>>;
    /// Events `user` created or was invited to, soonest first.
    async fn for_user(&self, user: UserId) -> DomainResult<Vec<EventView>>;
    async fn attendees(&self, id: EventId) -> DomainResult<Vec<Attendee>>;
    async fn update(&self, id: EventId, update: EventUpdate) -> DomainResult<()>;
    /// Deletes the event together with its attendee rows.
    async fn delete(&self, id: EventId) -> DomainResult<()>;
    async fn set_attendance(
        &self,
        id: EventId,
        user: UserId,
        status: AttendanceStatus,
    ) -> DomainResult<()>;
}

/// Best-effort push to a connected client. Returns whether a live connection
/// accepted the event; callers never treat `false` as an error.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait LiveDelivery: Send + Sync {
    fn push(&self, user: UserId, event: LiveEvent) -> bool;
}

/// Resolves a bearer token to the authenticated user.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> DomainResult<UserId>;
}

/// Source of "now", injected so reminder and trending windows are testable.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
