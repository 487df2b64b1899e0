//! Communities: named groups with one admin. Joining raises a
//! `community_join` notification for the admin.

use std::sync::Arc;

use domains::{
    Community, CommunityId, CommunityRepository, DomainError, DomainResult, NewCommunity,
    NotificationTarget, UserId, UserRepository,
};
use tracing::{info, instrument};

use crate::notifications::NotificationService;
use crate::username_of;

pub struct CommunityService {
    users: Arc<dyn UserRepository>,
    communities: Arc<dyn CommunityRepository>,
    notifications: Arc<NotificationService>,
}

impl CommunityService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        communities: Arc<dyn CommunityRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            communities,
            notifications,
        }
    }

    /// The creator becomes admin and first member.
    #[instrument(skip(self, description))]
    pub async fn create(
        &self,
        admin: UserId,
        name: String,
        description: String,
    ) -> DomainResult<Community> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Validation("Community name is required".into()));
        }
        let community = self
            .communities
            .create(NewCommunity {
                name,
                description,
                admin_id: admin,
            })
            .await?;
        info!(community = %community.id, "community created");
        Ok(community)
    }

    pub async fn get(&self, id: CommunityId) -> DomainResult<Community> {
        self.communities
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Community"))
    }

    /// Every community, most members first.
    pub async fn list(&self) -> DomainResult<Vec<Community>> {
        self.communities.list().await
    }

    /// The communities `user` belongs to, by name.
    pub async fn mine(&self, user: UserId) -> DomainResult<Vec<Community>> {
        self.communities.for_member(user).await
    }

    pub async fn is_member(&self, id: CommunityId, user: UserId) -> DomainResult<bool> {
        self.communities.is_member(id, user).await
    }

    /// Joins and tells the admin, unless the admin is the one joining.
    #[instrument(skip(self))]
    pub async fn join(&self, id: CommunityId, user: UserId) -> DomainResult<()> {
        let community = self.get(id).await?;
        if !self.communities.add_member(id, user).await? {
            return Err(DomainError::Conflict(
                "Already a member of this community".into(),
            ));
        }

        if community.admin_id != user {
            if let Some(name) = username_of(self.users.as_ref(), user).await {
                self.notifications
                    .notify(
                        community.admin_id,
                        NotificationTarget::CommunityJoin(id),
                        format!("{name} joined your community \"{}\"", community.name),
                    )
                    .await;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn leave(&self, id: CommunityId, user: UserId) -> DomainResult<()> {
        let community = self.get(id).await?;
        if community.admin_id == user {
            return Err(DomainError::Validation(
                "Admins cannot leave their own communities".into(),
            ));
        }
        if !self.communities.remove_member(id, user).await? {
            return Err(DomainError::Conflict(
                "Not a member of this community".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, fixed_now, stored, user};
    use domains::{
        MockCommunityRepository, MockLiveDelivery, MockNotificationRepository, MockUserRepository,
    };

    fn community(id: CommunityId) -> Community {
        Community {
            id,
            name: "Rustaceans".into(),
            description: String::new(),
            admin_id: UserId(1),
            member_count: 1,
            created_at: fixed_now(),
        }
    }

    fn svc(communities: MockCommunityRepository, notes: MockNotificationRepository) -> CommunityService {
        let mut users = MockUserRepository::new();
        users
            .expect_find()
            .returning(|id| Ok(Some(user(id.get(), "dave"))));
        let mut live = MockLiveDelivery::new();
        live.expect_push().return_const(false);
        let notifications = Arc::new(NotificationService::new(Arc::new(notes), Arc::new(live), clock()));
        CommunityService::new(Arc::new(users), Arc::new(communities), notifications)
    }

    #[tokio::test]
    async fn join_notifies_admin() {
        let mut communities = MockCommunityRepository::new();
        communities.expect_find().returning(|id| Ok(Some(community(id))));
        communities.expect_add_member().returning(|_, _| Ok(true));
        let mut notes = MockNotificationRepository::new();
        notes
            .expect_insert()
            .withf(|n| {
                n.recipient == UserId(1)
                    && n.target == NotificationTarget::CommunityJoin(CommunityId(4))
                    && n.content == "dave joined your community \"Rustaceans\""
            })
            .times(1)
            .returning(|n| Ok(stored(n)));

        svc(communities, notes)
            .join(CommunityId(4), UserId(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn second_join_is_a_conflict() {
        let mut communities = MockCommunityRepository::new();
        communities.expect_find().returning(|id| Ok(Some(community(id))));
        communities.expect_add_member().returning(|_, _| Ok(false));
        let mut notes = MockNotificationRepository::new();
        notes.expect_insert().never();

        let err = svc(communities, notes)
            .join(CommunityId(4), UserId(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn admin_cannot_leave() {
        let mut communities = MockCommunityRepository::new();
        communities.expect_find().returning(|id| Ok(Some(community(id))));
        communities.expect_remove_member().never();

        let err = svc(communities, MockNotificationRepository::new())
            .leave(CommunityId(4), UserId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn listings_come_straight_from_the_store() {
        let mut communities = MockCommunityRepository::new();
        communities
            .expect_list()
            .times(1)
            .returning(|| Ok(vec![community(CommunityId(1)), community(CommunityId(2))]));
        communities
            .expect_for_member()
            .withf(|user| *user == UserId(5))
            .times(1)
            .returning(|_| Ok(vec![community(CommunityId(2))]));
        let svc = svc(communities, MockNotificationRepository::new());

        assert_eq!(svc.list().await.unwrap().len(), 2);
        let mine = svc.mine(UserId(5)).await.unwrap();
        assert_eq!(mine[0].id, CommunityId(2));
    }
}
