//! Maps committed writes to the cache entries they make stale.

use std::sync::Arc;

use tracing::{debug, warn};

use arbor_core::domain::Id;
use arbor_core::ports::CommentStore;

use crate::cache::CacheLayer;
use crate::cache::keys::ListingScope;
use crate::jobs::{BackgroundTasks, JobError};
use crate::service::{Timeouts, bounded};

/// A write that has already been committed to the entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    CommentCreated {
        id: Id,
        parent_id: Option<Id>,
        post_id: Option<Id>,
    },
    /// `parent_id` and `post_id` are read before the delete.
    CommentDeleted {
        id: Id,
        parent_id: Option<Id>,
        post_id: Option<Id>,
    },
    PostCreated {
        id: Id,
    },
    PostDeleted {
        id: Id,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTarget {
    Subtree(Id),
    /// The subtrees of every ancestor of the comment, resolved at apply time.
    AncestorSubtrees(Id),
    Listing(ListingScope),
    PostEntry(Id),
    CommentCount(Id),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub targets: Vec<CacheTarget>,
}

impl InvalidationPlan {
    pub fn for_event(event: &WriteEvent) -> Self {
        let mut targets = Vec::new();
        match *event {
            WriteEvent::CommentCreated {
                parent_id, post_id, ..
            } => {
                if let Some(parent_id) = parent_id {
                    targets.push(CacheTarget::Subtree(parent_id));
                    targets.push(CacheTarget::AncestorSubtrees(parent_id));
                }
                push_thread_targets(&mut targets, post_id);
            }
            WriteEvent::CommentDeleted {
                id,
                parent_id,
                post_id,
            } => {
                targets.push(CacheTarget::Subtree(id));
                if let Some(parent_id) = parent_id {
                    targets.push(CacheTarget::Subtree(parent_id));
                    targets.push(CacheTarget::AncestorSubtrees(parent_id));
                }
                push_thread_targets(&mut targets, post_id);
            }
            WriteEvent::PostCreated { .. } => {
                targets.push(CacheTarget::Listing(ListingScope::Posts));
            }
            WriteEvent::PostDeleted { id } => {
                targets.push(CacheTarget::Listing(ListingScope::Posts));
                targets.push(CacheTarget::PostEntry(id));
                push_thread_targets(&mut targets, Some(id));
            }
        }
        Self { targets }
    }
}

fn push_thread_targets(targets: &mut Vec<CacheTarget>, post_id: Option<Id>) {
    targets.push(CacheTarget::Listing(ListingScope::RootComments { post_id: None }));
    if let Some(post_id) = post_id {
        targets.push(CacheTarget::Listing(ListingScope::RootComments {
            post_id: Some(post_id),
        }));
        targets.push(CacheTarget::CommentCount(post_id));
    }
}

/// Applies invalidation plans in the background once a write has committed.
#[derive(Clone)]
pub struct InvalidationCoordinator {
    cache: CacheLayer,
    comments: Arc<dyn CommentStore>,
    background: BackgroundTasks,
    timeouts: Timeouts,
}

impl InvalidationCoordinator {
    pub fn new(
        cache: CacheLayer,
        comments: Arc<dyn CommentStore>,
        background: BackgroundTasks,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            cache,
            comments,
            background,
            timeouts,
        }
    }

    /// Schedules the drops for `event` without waiting for them.
    pub fn committed(&self, event: WriteEvent) {
        let plan = InvalidationPlan::for_event(&event);
        let this = self.clone();
        self.background
            .spawn("cache_invalidation", self.timeouts.background, async move {
                this.apply(&plan).await;
                debug!(?event, "cache invalidation applied");
            });
    }

    /// Drops every target of `plan`. Failures are logged per target.
    pub async fn apply(&self, plan: &InvalidationPlan) {
        for target in &plan.targets {
            if let Err(err) = self.drop_target(*target).await {
                warn!(error = %err, ?target, "cache invalidation failed");
            }
        }
    }

    async fn drop_target(&self, target: CacheTarget) -> Result<(), JobError> {
        match target {
            CacheTarget::Subtree(id) => self.cache.subtrees.invalidate(id).await?,
            CacheTarget::AncestorSubtrees(id) => {
                let ancestors =
                    bounded(self.timeouts.store, self.comments.ancestor_ids(id)).await?;
                for ancestor in ancestors {
                    self.cache.subtrees.invalidate(ancestor).await?;
                }
            }
            CacheTarget::Listing(ListingScope::Posts) => {
                self.cache
                    .post_listings
                    .invalidate_scope(ListingScope::Posts)
                    .await?
            }
            CacheTarget::Listing(scope) => {
                self.cache.comment_listings.invalidate_scope(scope).await?
            }
            CacheTarget::PostEntry(id) => self.cache.posts.invalidate(id).await?,
            CacheTarget::CommentCount(post_id) => self.cache.counts.invalidate(post_id).await?,
        }
        Ok(())
    }
}
