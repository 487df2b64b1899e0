//! Post lifecycle: publish, edit, archive, delete and poll voting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    DomainError, DomainResult, FeedPost, NewPost, Poll, Post, PostId, PostRepository, PostUpdate,
    SocialGraphRepository, UserId,
};
use tracing::{info, instrument};

pub struct PostService {
    posts: Arc<dyn PostRepository>,
    graph: Arc<dyn SocialGraphRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, graph: Arc<dyn SocialGraphRepository>) -> Self {
        Self { posts, graph }
    }

    #[instrument(skip(self, content, poll))]
    pub async fn create(
        &self,
        owner: UserId,
        content: String,
        image_url: Option<String>,
        poll: Option<Poll>,
        scheduled_at: Option<DateTime<Utc>>,
    ) -> DomainResult<Post> {
        let content = content.trim().to_string();
        if content.is_empty() && image_url.is_none() {
            return Err(DomainError::Validation(
                "Post must have content or an image".into(),
            ));
        }
        if let Some(poll) = &poll {
            poll.validate()?;
        }

        let post = self
            .posts
            .create(NewPost {
                owner,
                content,
                image_url,
                poll,
                scheduled_at,
            })
            .await?;
        info!(post = %post.id, "post created");
        Ok(post)
    }

    /// A single post with its aggregates and, for polls, the tallies.
    pub async fn get(&self, id: PostId, viewer: UserId) -> DomainResult<FeedPost> {
        let mut post = self
            .posts
            .find_for_viewer(id, viewer)
            .await?
            .ok_or_else(|| DomainError::not_found("Post"))?;
        let owner = post.post.owner;
        if owner != viewer && self.blocked_either_direction(owner, viewer).await? {
            return Err(DomainError::NotFound(
                "Post not found or posted by a blocked user".into(),
            ));
        }

        if let Some(poll) = &post.post.poll {
            post.poll_votes = self.posts.vote_counts(id, poll.options.len()).await?;
            post.user_vote = self.posts.vote_of(id, viewer).await?;
        }
        Ok(post)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: PostId, user: UserId, update: PostUpdate) -> DomainResult<()> {
        let post = self.owned(id, user, "edit").await?;
        if update.content.trim().is_empty() && update.image_url.is_none() && post.image_url.is_none()
        {
            return Err(DomainError::Validation(
                "Post must have content or an image".into(),
            ));
        }
        self.posts.update(id, update).await
    }

    #[instrument(skip(self))]
    pub async fn archive(&self, id: PostId, user: UserId) -> DomainResult<()> {
        self.owned(id, user, "archive").await?;
        self.posts.archive(id).await?;
        info!(post = %id, "post archived");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: PostId, user: UserId) -> DomainResult<()> {
        self.owned(id, user, "delete").await?;
        self.posts.delete(id).await?;
        info!(post = %id, "post deleted");
        Ok(())
    }

    /// The author's non-archived posts as seen by `viewer`.
    pub async fn by_author(&self, author: UserId, viewer: UserId) -> DomainResult<Vec<FeedPost>> {
        if author != viewer && self.blocked_either_direction(author, viewer).await? {
            return Err(DomainError::NotAuthorized(
                "Posts of this user are not available".into(),
            ));
        }
        self.posts.by_author(author, viewer).await
    }

    pub async fn saved(&self, user: UserId) -> DomainResult<Vec<FeedPost>> {
        self.posts.saved_by(user).await
    }

    /// Casts a single vote and returns the updated tallies.
    #[instrument(skip(self))]
    pub async fn vote(&self, id: PostId, user: UserId, option: i64) -> DomainResult<Vec<i64>> {
        let post = self
            .posts
            .find(id)
            .await?
            .filter(Post::is_visible)
            .ok_or_else(|| DomainError::not_found("Post"))?;
        let poll = post
            .poll
            .ok_or_else(|| DomainError::Validation("Post does not have a poll".into()))?;
        let in_range = usize::try_from(option).is_ok_and(|i| i < poll.options.len());
        if !in_range {
            return Err(DomainError::Validation("Invalid option".into()));
        }

        if !self.posts.insert_vote(id, user, option).await? {
            return Err(DomainError::Conflict(
                "You have already voted on this poll".into(),
            ));
        }
        self.posts.vote_counts(id, poll.options.len()).await
    }

    async fn owned(&self, id: PostId, user: UserId, action: &str) -> DomainResult<Post> {
        let post = self
            .posts
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post"))?;
        if post.owner != user {
            return Err(DomainError::NotAuthorized(format!(
                "You can only {action} your own posts"
            )));
        }
        Ok(post)
    }

    async fn blocked_either_direction(&self, a: UserId, b: UserId) -> DomainResult<bool> {
        Ok(self.graph.is_blocked(a, b).await? || self.graph.is_blocked(b, a).await?)
    }
}
