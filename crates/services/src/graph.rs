//! # UserGraphStore
//!
//! Follow, follower and block relationships.
//!
//! Edges are single rows keyed by the (source, target) pair, so every
//! mutation is one atomic statement and the follower/following views can
//! never disagree. Blocking is the only multi-statement change; the
//! repository runs it inside a transaction.

use std::collections::HashSet;
use std::sync::Arc;

use domains::{
    DomainError, DomainResult, FollowOutcome, GraphEntry, NotificationTarget,
    SocialGraphRepository, UserId, UserRepository,
};
use tracing::{info, instrument};

use crate::notifications::NotificationService;
use crate::username_of;

pub struct SocialGraphService {
    users: Arc<dyn UserRepository>,
    graph: Arc<dyn SocialGraphRepository>,
    notifications: Arc<NotificationService>,
}

impl SocialGraphService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        graph: Arc<dyn SocialGraphRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            graph,
            notifications,
        }
    }

    /// `follower` starts following `target`. The edge is one-directional;
    /// nothing is created the other way.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower: UserId, target: UserId) -> DomainResult<()> {
        if follower == target {
            return Err(DomainError::self_reference("follow"));
        }
        self.ensure_exists(target).await?;
        match self.graph.insert_follow(follower, target).await? {
            FollowOutcome::Created => info!("follow edge created"),
            FollowOutcome::Blocked => {
                return Err(DomainError::NotAuthorized(
                    "You cannot follow this user".into(),
                ))
            }
            FollowOutcome::AlreadyFollowing => {
                return Err(DomainError::Conflict("Already following this user".into()))
            }
        }

        if let Some(name) = username_of(self.users.as_ref(), follower).await {
            self.notifications
                .notify(
                    target,
                    NotificationTarget::Follow(follower),
                    format!("{name} started following you"),
                )
                .await;
        }
        Ok(())
    }

    /// Removes the edge. No notification.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower: UserId, target: UserId) -> DomainResult<()> {
        if follower == target {
            return Err(DomainError::self_reference("unfollow"));
        }
        if !self.graph.delete_follow(follower, target).await? {
            return Err(DomainError::Conflict("Not following this user".into()));
        }
        info!("follow edge removed");
        Ok(())
    }

    /// Blocks `target` and severs any follow edge between the two users, in
    /// both directions.
    ///
    /// No notification is raised: the blocked user must not learn about it.
    #[instrument(skip(self))]
    pub async fn block(&self, blocker: UserId, target: UserId) -> DomainResult<()> {
        if blocker == target {
            return Err(DomainError::self_reference("block"));
        }
        self.ensure_exists(target).await?;
        if !self.graph.block_and_sever(blocker, target).await? {
            return Err(DomainError::Conflict("User is already blocked".into()));
        }
        info!("block recorded");
        Ok(())
    }

    /// Lifts the block. Follow edges severed by it are not restored.
    #[instrument(skip(self))]
    pub async fn unblock(&self, blocker: UserId, target: UserId) -> DomainResult<()> {
        if !self.graph.delete_block(blocker, target).await? {
            return Err(DomainError::Conflict("User is not blocked".into()));
        }
        info!("block lifted");
        Ok(())
    }

    pub async fn is_blocked_either_direction(&self, a: UserId, b: UserId) -> DomainResult<bool> {
        Ok(self.graph.is_blocked(a, b).await? || self.graph.is_blocked(b, a).await?)
    }

    pub async fn is_following(&self, follower: UserId, target: UserId) -> DomainResult<bool> {
        self.graph.is_following(follower, target).await
    }

    /// Users following `profile`, flagged with whether `viewer` follows them.
    pub async fn followers(&self, profile: UserId, viewer: UserId) -> DomainResult<Vec<GraphEntry>> {
        self.ensure_exists(profile).await?;
        let ids = self.graph.followers(profile).await?;
        self.annotate(ids, viewer).await
    }

    /// Users `profile` follows, flagged with whether `viewer` follows them.
    pub async fn following(&self, profile: UserId, viewer: UserId) -> DomainResult<Vec<GraphEntry>> {
        self.ensure_exists(profile).await?;
        let ids = self.graph.following(profile).await?;
        self.annotate(ids, viewer).await
    }

    async fn annotate(&self, ids: Vec<UserId>, viewer: UserId) -> DomainResult<Vec<GraphEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let viewer_following: HashSet<UserId> =
            self.graph.following(viewer).await?.into_iter().collect();
        let users = self.users.summaries(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| GraphEntry {
                is_following: viewer_following.contains(&user.id),
                user,
            })
            .collect())
    }

    async fn ensure_exists(&self, user: UserId) -> DomainResult<()> {
        self.users
            .find(user)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("User"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, user};
    use domains::{
        MockLiveDelivery, MockNotificationRepository, MockSocialGraphRepository,
        MockUserRepository, Notification, NotificationId, UserSummary,
    };
    use mockall::predicate::eq;

    fn notifications(repo: MockNotificationRepository) -> Arc<NotificationService> {
        let mut live = MockLiveDelivery::new();
        live.expect_push().return_const(false);
        Arc::new(NotificationService::new(Arc::new(repo), Arc::new(live), clock()))
    }

    fn users_with(ids: &'static [i64]) -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users
            .expect_find()
            .returning(move |id| Ok(ids.contains(&id.get()).then(|| user(id.get(), "u"))));
        users
    }

    fn svc(
        users: MockUserRepository,
        graph: MockSocialGraphRepository,
        notes: MockNotificationRepository,
    ) -> SocialGraphService {
        SocialGraphService::new(Arc::new(users), Arc::new(graph), notifications(notes))
    }

    #[tokio::test]
    async fn self_follow_is_rejected_before_any_io() {
        let graph = MockSocialGraphRepository::new();
        let err = svc(MockUserRepository::new(), graph, MockNotificationRepository::new())
            .follow(UserId(1), UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn follow_inserts_edge_and_notifies_target() {
        let mut graph = MockSocialGraphRepository::new();
        graph.expect_is_blocked().never();
        graph
            .expect_insert_follow()
            .with(eq(UserId(1)), eq(UserId(2)))
            .times(1)
            .returning(|_, _| Ok(FollowOutcome::Created));

        let mut notes = MockNotificationRepository::new();
        notes
            .expect_insert()
            .withf(|n| {
                n.recipient == UserId(2)
                    && n.target == NotificationTarget::Follow(UserId(1))
                    && n.content == "u started following you"
            })
            .times(1)
            .returning(|n| {
                Ok(Notification {
                    id: NotificationId(1),
                    recipient: n.recipient,
                    target: n.target,
                    content: n.content,
                    is_read: false,
                    scheduled_time: None,
                    created_at: chrono::Utc::now(),
                })
            });

        svc(users_with(&[1, 2]), graph, notes)
            .follow(UserId(1), UserId(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn duplicate_follow_is_a_conflict_without_notification() {
        let mut graph = MockSocialGraphRepository::new();
        graph
            .expect_insert_follow()
            .returning(|_, _| Ok(FollowOutcome::AlreadyFollowing));
        let mut notes = MockNotificationRepository::new();
        notes.expect_insert().never();

        let err = svc(users_with(&[1, 2]), graph, notes)
            .follow(UserId(1), UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn follow_across_a_block_is_refused() {
        // The store decides atomically; no separate block lookup happens first.
        let mut graph = MockSocialGraphRepository::new();
        graph.expect_is_blocked().never();
        graph
            .expect_insert_follow()
            .times(1)
            .returning(|_, _| Ok(FollowOutcome::Blocked));
        let mut notes = MockNotificationRepository::new();
        notes.expect_insert().never();

        let err = svc(users_with(&[1, 2]), graph, notes)
            .follow(UserId(1), UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn follow_unknown_user_is_not_found() {
        let err = svc(
            users_with(&[1]),
            MockSocialGraphRepository::new(),
            MockNotificationRepository::new(),
        )
        .follow(UserId(1), UserId(42))
        .await
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn unfollow_without_edge_is_a_conflict() {
        let mut graph = MockSocialGraphRepository::new();
        graph.expect_delete_follow().returning(|_, _| Ok(false));
        let err = svc(MockUserRepository::new(), graph, MockNotificationRepository::new())
            .unfollow(UserId(1), UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn block_never_notifies() {
        let mut graph = MockSocialGraphRepository::new();
        graph
            .expect_block_and_sever()
            .with(eq(UserId(1)), eq(UserId(2)))
            .times(1)
            .returning(|_, _| Ok(true));
        let mut notes = MockNotificationRepository::new();
        notes.expect_insert().never();

        svc(users_with(&[1, 2]), graph, notes)
            .block(UserId(1), UserId(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_block_and_missing_unblock_conflict() {
        let mut graph = MockSocialGraphRepository::new();
        graph.expect_block_and_sever().returning(|_, _| Ok(false));
        graph.expect_delete_block().returning(|_, _| Ok(false));
        let svc = svc(users_with(&[1, 2]), graph, MockNotificationRepository::new());

        assert!(matches!(
            svc.block(UserId(1), UserId(2)).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            svc.unblock(UserId(1), UserId(2)).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn followers_are_flagged_with_viewer_follow_state() {
        let mut graph = MockSocialGraphRepository::new();
        graph
            .expect_followers()
            .with(eq(UserId(1)))
            .returning(|_| Ok(vec![UserId(2), UserId(3)]));
        graph
            .expect_following()
            .with(eq(UserId(9)))
            .returning(|_| Ok(vec![UserId(3)]));
        let mut users = users_with(&[1]);
        users.expect_summaries().returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| UserSummary {
                    id: *id,
                    username: format!("user{id}"),
                    bio: String::new(),
                })
                .collect())
        });

        let entries = svc(users, graph, MockNotificationRepository::new())
            .followers(UserId(1), UserId(9))
            .await
            .unwrap();
        let flags: Vec<(i64, bool)> = entries
            .iter()
            .map(|e| (e.user.id.get(), e.is_following))
            .collect();
        assert_eq!(flags, vec![(2, false), (3, true)]);
    }
}
