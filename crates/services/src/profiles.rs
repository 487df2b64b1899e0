//! Profile rendering. Relationship lists come from the edge tables, never
//! from the user row.

use std::sync::Arc;

use domains::{
    DomainError, DomainResult, Profile, ProfileUpdate, SocialGraphRepository, User, UserId,
    UserRepository,
};
use tracing::{instrument, warn};

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    graph: Arc<dyn SocialGraphRepository>,
}

impl ProfileService {
    pub fn new(users: Arc<dyn UserRepository>, graph: Arc<dyn SocialGraphRepository>) -> Self {
        Self { users, graph }
    }

    /// The caller's own profile, including email and block list.
    pub async fn me(&self, user: UserId) -> DomainResult<Profile> {
        let row = self.existing(user).await?;
        let mut profile = self.render(row).await?;
        profile.blocked_users = Some(self.graph.blocked_by(user).await?);
        Ok(profile)
    }

    /// Someone else's profile. Refused when either side has blocked the other.
    #[instrument(skip(self))]
    pub async fn view(&self, viewer: UserId, profile: UserId) -> DomainResult<Profile> {
        if viewer == profile {
            return self.me(viewer).await;
        }
        if self.graph.is_blocked(viewer, profile).await? {
            return Err(DomainError::NotAuthorized("You have blocked this user".into()));
        }
        let row = self.existing(profile).await?;
        if self.graph.is_blocked(profile, viewer).await? {
            return Err(DomainError::NotAuthorized("This user has blocked you".into()));
        }

        let mut rendered = self.render(row).await?;
        rendered.email = None;
        rendered.is_following = Some(rendered.followers.contains(&viewer));
        Ok(rendered)
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, user: UserId, update: ProfileUpdate) -> DomainResult<()> {
        if !self.users.update_profile(user, update).await? {
            return Err(DomainError::not_found("User"));
        }
        Ok(())
    }

    async fn render(&self, user: User) -> DomainResult<Profile> {
        let following = self.graph.following(user.id).await?;
        let followers = self.graph.followers(user.id).await?;
        let post_count = self.users.post_count(user.id).await.unwrap_or_else(|err| {
            warn!(user = %user.id, error = %err, "post count failed, reporting zero");
            0
        });

        Ok(Profile {
            id: user.id,
            username: user.username,
            email: Some(user.email),
            bio: user.bio,
            skills: user.skills,
            interests: user.interests,
            following,
            followers,
            blocked_users: None,
            is_following: None,
            post_count,
        })
    }

    async fn existing(&self, id: UserId) -> DomainResult<User> {
        self.users
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User"))
    }
}
