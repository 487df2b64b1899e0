//! # FeedComposer
//!
//! Read-only assembly of post listings for a viewer. Relationship lookups
//! that fail degrade to the empty set so a flaky graph read never blanks the
//! whole feed.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Duration;
use domains::{
    Clock, DomainResult, FeedMode, FeedOrder, FeedPost, FeedQuery, PostRepository,
    SocialGraphRepository, UserId,
};
use tracing::{instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub default_limit: i64,
    /// Requested limits above this are clamped.
    pub max_limit: i64,
    pub trending_window: Duration,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
            trending_window: Duration::days(7),
        }
    }
}

pub struct FeedService {
    graph: Arc<dyn SocialGraphRepository>,
    posts: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
    settings: FeedSettings,
}

impl FeedService {
    pub fn new(
        graph: Arc<dyn SocialGraphRepository>,
        posts: Arc<dyn PostRepository>,
        clock: Arc<dyn Clock>,
        settings: FeedSettings,
    ) -> Self {
        Self {
            graph,
            posts,
            clock,
            settings,
        }
    }

    #[instrument(skip(self))]
    pub async fn compose(
        &self,
        viewer: UserId,
        mode: FeedMode,
        limit: Option<i64>,
    ) -> DomainResult<Vec<FeedPost>> {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(self.settings.default_limit)
            .min(self.settings.max_limit);
        let excluded_authors = self.hidden_authors(viewer).await;

        let query = match mode {
            FeedMode::All => FeedQuery {
                viewer,
                authors: None,
                excluded_authors,
                created_after: None,
                order: FeedOrder::Newest,
                limit,
            },
            FeedMode::Following => {
                let following = self.lenient(self.graph.following(viewer).await, "following");
                if following.is_empty() {
                    return Ok(Vec::new());
                }
                FeedQuery {
                    viewer,
                    authors: Some(following),
                    excluded_authors,
                    created_after: None,
                    order: FeedOrder::Newest,
                    limit,
                }
            }
            FeedMode::Trending => FeedQuery {
                viewer,
                authors: None,
                excluded_authors,
                created_after: Some(self.clock.now() - self.settings.trending_window),
                order: FeedOrder::MostInterested,
                limit,
            },
        };

        self.posts.feed(query).await
    }

    /// Users the viewer blocked plus users who blocked the viewer.
    async fn hidden_authors(&self, viewer: UserId) -> Vec<UserId> {
        let blocked = self.lenient(self.graph.blocked_by(viewer).await, "blocked");
        let blockers = self.lenient(self.graph.blockers_of(viewer).await, "blockers");
        blocked
            .into_iter()
            .chain(blockers)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn lenient(&self, result: DomainResult<Vec<UserId>>, set: &'static str) -> Vec<UserId> {
        result.unwrap_or_else(|err| {
            warn!(set, error = %err, "relationship lookup failed, using empty set");
            Vec::new()
        })
    }
}
