//! # services
//!
//! Business logic of Innovate, written against the ports in `domains`.
//!
//! A mutating action performs its primary write first, then derives
//! notifications through [`notifications::NotificationService`], which in
//! turn pushes to the live channel. Reads (feed, counts) never mutate.

pub mod communities;
pub mod events;
pub mod feed;
pub mod graph;
pub mod interactions;
pub mod live;
pub mod messages;
pub mod notifications;
pub mod posts;
pub mod profiles;
pub mod reminders;

use std::sync::Arc;

use domains::{
    Clock, CommunityRepository, EventRepository, InteractionRepository, LiveDelivery,
    MessageRepository, NotificationRepository, PostRepository, SocialGraphRepository, UserId,
    UserRepository,
};
use tracing::warn;

pub use communities::CommunityService;
pub use events::EventService;
pub use feed::{FeedService, FeedSettings};
pub use graph::SocialGraphService;
pub use interactions::InteractionService;
pub use live::{LiveRegistry, LiveSender};
pub use messages::{Conversation, MessageService};
pub use notifications::NotificationService;
pub use posts::PostService;
pub use profiles::ProfileService;
pub use reminders::{spawn_sweeper, ReminderService};

/// Every adapter the services need, already type-erased.
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserRepository>,
    pub graph: Arc<dyn SocialGraphRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub interactions: Arc<dyn InteractionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub communities: Arc<dyn CommunityRepository>,
    pub events: Arc<dyn EventRepository>,
    pub live: Arc<dyn LiveDelivery>,
    pub clock: Arc<dyn Clock>,
}

/// The assembled service layer, shared by the HTTP adapter and the binary.
#[derive(Clone)]
pub struct Services {
    pub graph: Arc<SocialGraphService>,
    pub profiles: Arc<ProfileService>,
    pub interactions: Arc<InteractionService>,
    pub notifications: Arc<NotificationService>,
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub messages: Arc<MessageService>,
    pub reminders: Arc<ReminderService>,
    pub communities: Arc<CommunityService>,
    pub events: Arc<EventService>,
}

impl Services {
    pub fn new(ports: Ports, feed: FeedSettings) -> Self {
        let notifications = Arc::new(NotificationService::new(
            ports.notifications.clone(),
            ports.live.clone(),
            ports.clock.clone(),
        ));

        Self {
            graph: Arc::new(SocialGraphService::new(
                ports.users.clone(),
                ports.graph.clone(),
                notifications.clone(),
            )),
            profiles: Arc::new(ProfileService::new(ports.users.clone(), ports.graph.clone())),
            interactions: Arc::new(InteractionService::new(
                ports.users.clone(),
                ports.posts.clone(),
                ports.interactions.clone(),
                ports.messages.clone(),
                notifications.clone(),
            )),
            feed: Arc::new(FeedService::new(
                ports.graph.clone(),
                ports.posts.clone(),
                ports.clock.clone(),
                feed,
            )),
            posts: Arc::new(PostService::new(ports.posts.clone(), ports.graph.clone())),
            messages: Arc::new(MessageService::new(
                ports.users.clone(),
                ports.graph.clone(),
                ports.messages.clone(),
                ports.live.clone(),
                notifications.clone(),
            )),
            reminders: Arc::new(ReminderService::new(
                ports.users.clone(),
                ports.posts.clone(),
                ports.notifications.clone(),
                notifications.clone(),
                ports.clock.clone(),
            )),
            communities: Arc::new(CommunityService::new(
                ports.users.clone(),
                ports.communities.clone(),
                notifications.clone(),
            )),
            events: Arc::new(EventService::new(
                ports.users,
                ports.events,
                notifications.clone(),
            )),
            notifications,
        }
    }
}

/// Username of the actor of a derived notification. A failed lookup skips
/// the notification rather than failing the action.
pub(crate) async fn username_of(users: &dyn UserRepository, id: UserId) -> Option<String> {
    match users.find(id).await {
        Ok(Some(user)) => Some(user.username),
        Ok(None) => {
            warn!(user = %id, "actor missing, skipping notification");
            None
        }
        Err(err) => {
            warn!(user = %id, error = %err, "actor lookup failed, skipping notification");
            None
        }
    }
}
