//! In-process entity store.
//!
//! Backs `--store memory` and the service tests. Enforces the same
//! invariants as the Postgres schema: replies inherit their parent's thread,
//! subtree deletes cascade, and deleting a post removes its thread.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use arbor_core::domain::Id;
use arbor_core::domain::comments::{Comment, NewComment};
use arbor_core::domain::listing::{CommentSort, ListQuery, PostSort, SortOrder};
use arbor_core::domain::posts::{NewPost, Post};
use arbor_core::error::StoreError;
use arbor_core::ports::{CommentStore, PostStore, StoreResult};

#[derive(Debug, Default)]
struct State {
    comments: BTreeMap<Id, Comment>,
    posts: BTreeMap<Id, Post>,
    next_comment_id: Id,
    next_post_id: Id,
}

impl State {
    fn subtree_ids(&self, root_id: Id) -> Vec<Id> {
        if !self.comments.contains_key(&root_id) {
            return Vec::new();
        }
        let mut ids = vec![root_id];
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            ids.extend(
                self.comments
                    .values()
                    .filter(|comment| comment.parent_id == Some(parent))
                    .map(|comment| comment.id),
            );
            cursor += 1;
        }
        ids
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of comment rows currently stored.
    pub async fn comment_rows(&self) -> usize {
        self.state.read().await.comments.len()
    }

    /// Overwrites a comment's content in place, bypassing every service.
    /// Returns whether the comment existed.
    pub async fn rewrite_comment(&self, id: Id, content: &str) -> bool {
        let mut state = self.state.write().await;
        match state.comments.get_mut(&id) {
            Some(comment) => {
                comment.content = content.to_string();
                comment.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

fn matches_search(haystacks: &[&str], search: Option<&str>) -> bool {
    let Some(search) = search else {
        return true;
    };
    let needle = search.to_lowercase();
    haystacks
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn page_of<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(limit).unwrap_or(0);
    items.iter().skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn create_comment(&self, new: NewComment) -> StoreResult<Comment> {
        let mut state = self.state.write().await;
        let post_id = match new.parent_id {
            Some(parent_id) => {
                let parent = state.comments.get(&parent_id).ok_or_else(|| {
                    StoreError::Backend(format!("parent comment {parent_id} does not exist"))
                })?;
                parent.post_id
            }
            None => new.post_id,
        };
        if let Some(post_id) = post_id {
            if !state.posts.contains_key(&post_id) {
                return Err(StoreError::Backend(format!("post {post_id} does not exist")));
            }
        }
        state.next_comment_id += 1;
        let now = Utc::now();
        let comment = Comment {
            id: state.next_comment_id,
            parent_id: new.parent_id,
            post_id,
            content: new.content,
            author: new.author,
            created_at: now,
            updated_at: now,
            children: Vec::new(),
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn get_comment(&self, id: Id) -> StoreResult<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn comment_exists(&self, id: Id) -> StoreResult<bool> {
        Ok(self.state.read().await.comments.contains_key(&id))
    }

    async fn get_descendants(&self, root_id: Id) -> StoreResult<Vec<Comment>> {
        let state = self.state.read().await;
        let mut ids = state.subtree_ids(root_id);
        ids.sort_unstable();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.comments.get(&id).cloned())
            .collect())
    }

    async fn ancestor_ids(&self, id: Id) -> StoreResult<Vec<Id>> {
        let state = self.state.read().await;
        let mut ancestors = Vec::new();
        let mut cursor = state.comments.get(&id).and_then(|comment| comment.parent_id);
        while let Some(parent_id) = cursor {
            if parent_id == id || ancestors.contains(&parent_id) {
                break;
            }
            ancestors.push(parent_id);
            cursor = state
                .comments
                .get(&parent_id)
                .and_then(|comment| comment.parent_id);
        }
        Ok(ancestors)
    }

    async fn delete_subtree(&self, id: Id) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let ids = state.subtree_ids(id);
        for id in &ids {
            state.comments.remove(id);
        }
        Ok(ids.len() as u64)
    }

    async fn list_root_comments(
        &self,
        post_id: Option<Id>,
        query: &ListQuery<CommentSort>,
    ) -> StoreResult<(Vec<Comment>, i64)> {
        let state = self.state.read().await;
        let mut matches: Vec<Comment> = state
            .comments
            .values()
            .filter(|comment| comment.is_root())
            .filter(|comment| post_id.is_none() || comment.post_id == post_id)
            .filter(|comment| matches_search(&[comment.content.as_str()], query.search.as_deref()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = match query.sort_by {
                CommentSort::Id => a.id.cmp(&b.id),
                CommentSort::CreatedAt => a.created_at.cmp(&b.created_at),
                CommentSort::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            directed(ordering.then(a.id.cmp(&b.id)), query.sort_order)
        });
        let total = matches.len() as i64;
        Ok((page_of(&matches, query.offset(), query.limit()), total))
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, new: NewPost) -> StoreResult<Post> {
        let mut state = self.state.write().await;
        state.next_post_id += 1;
        let now = Utc::now();
        let post = Post {
            id: state.next_post_id,
            title: new.title,
            content: new.content,
            author: new.author,
            created_at: now,
            updated_at: now,
            comment_count: 0,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: Id) -> StoreResult<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn post_exists(&self, id: Id) -> StoreResult<bool> {
        Ok(self.state.read().await.posts.contains_key(&id))
    }

    async fn delete_post(&self, id: Id) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.retain(|_, comment| comment.post_id != Some(id));
        Ok(true)
    }

    async fn list_posts(&self, query: &ListQuery<PostSort>) -> StoreResult<(Vec<Post>, i64)> {
        let state = self.state.read().await;
        let mut matches: Vec<Post> = state
            .posts
            .values()
            .filter(|post| matches_search(&[post.title.as_str(), post.content.as_str()], query.search.as_deref()))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = match query.sort_by {
                PostSort::Id => a.id.cmp(&b.id),
                PostSort::CreatedAt => a.created_at.cmp(&b.created_at),
                PostSort::Title => a.title.cmp(&b.title),
            };
            directed(ordering.then(a.id.cmp(&b.id)), query.sort_order)
        });
        let total = matches.len() as i64;
        Ok((page_of(&matches, query.offset(), query.limit()), total))
    }

    async fn comment_count(&self, post_id: Id) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .comments
            .values()
            .filter(|comment| comment.post_id == Some(post_id))
            .count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use arbor_core::domain::listing::ListParams;

    use super::*;

    fn comment(content: &str, parent_id: Option<Id>, post_id: Option<Id>) -> NewComment {
        NewComment {
            content: content.to_string(),
            author: "tester".to_string(),
            parent_id,
            post_id,
        }
    }

    fn post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: format!("{title} body"),
            author: "writer".to_string(),
        }
    }

    #[tokio::test]
    async fn replies_inherit_the_parent_thread() {
        let store = MemoryStore::new();
        let thread = store.create_post(post("thread")).await.unwrap();
        let root = store
            .create_comment(comment("root", None, Some(thread.id)))
            .await
            .unwrap();
        let reply = store
            .create_comment(comment("reply", Some(root.id), None))
            .await
            .unwrap();
        assert_eq!(reply.post_id, Some(thread.id));
        assert_eq!(store.comment_count(thread.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_subtree_removes_all_descendants() {
        let store = MemoryStore::new();
        let keep = store.create_comment(comment("keep", None, None)).await.unwrap();
        let root = store.create_comment(comment("root", None, None)).await.unwrap();
        let child = store
            .create_comment(comment("child", Some(root.id), None))
            .await
            .unwrap();
        store
            .create_comment(comment("grandchild", Some(child.id), None))
            .await
            .unwrap();

        assert_eq!(store.delete_subtree(root.id).await.unwrap(), 3);
        assert_eq!(store.comment_rows().await, 1);
        assert!(store.comment_exists(keep.id).await.unwrap());
        assert!(store.get_descendants(root.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn descendants_are_root_inclusive_and_ordered() {
        let store = MemoryStore::new();
        let root = store.create_comment(comment("root", None, None)).await.unwrap();
        let a = store
            .create_comment(comment("a", Some(root.id), None))
            .await
            .unwrap();
        let b = store
            .create_comment(comment("b", Some(a.id), None))
            .await
            .unwrap();
        store.create_comment(comment("other", None, None)).await.unwrap();

        let ids: Vec<Id> = store
            .get_descendants(root.id)
            .await
            .unwrap()
            .iter()
            .map(|comment| comment.id)
            .collect();
        assert_eq!(ids, vec![root.id, a.id, b.id]);
        assert_eq!(store.ancestor_ids(b.id).await.unwrap(), vec![a.id, root.id]);
        assert!(store.ancestor_ids(root.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_root_comments_filters_sorts_and_pages() {
        let store = MemoryStore::new();
        let thread = store.create_post(post("thread")).await.unwrap();
        for idx in 0..15 {
            store
                .create_comment(comment(&format!("note {idx}"), None, Some(thread.id)))
                .await
                .unwrap();
        }
        let first = store.create_comment(comment("elsewhere", None, None)).await.unwrap();
        store
            .create_comment(comment("a reply", Some(first.id), None))
            .await
            .unwrap();

        let query = ListQuery::<CommentSort>::normalize(ListParams {
            sort_by: Some("id".to_string()),
            sort_order: Some("asc".to_string()),
            ..ListParams::default()
        });
        let (items, total) = store
            .list_root_comments(Some(thread.id), &query)
            .await
            .unwrap();
        assert_eq!(total, 15);
        assert_eq!(items.len(), 10);
        assert!(items.windows(2).all(|pair| pair[0].id < pair[1].id));

        let (_, total) = store.list_root_comments(None, &query).await.unwrap();
        assert_eq!(total, 16);

        let search = ListQuery::<CommentSort>::normalize(ListParams {
            search: Some("NOTE 1".to_string()),
            ..ListParams::default()
        });
        let (items, total) = store.list_root_comments(None, &search).await.unwrap();
        assert_eq!(total, 6);
        assert!(items.iter().all(|comment| comment.content.contains("note 1")));
    }

    #[tokio::test]
    async fn delete_post_removes_its_thread() {
        let store = MemoryStore::new();
        let thread = store.create_post(post("thread")).await.unwrap();
        let root = store
            .create_comment(comment("root", None, Some(thread.id)))
            .await
            .unwrap();
        store
            .create_comment(comment("reply", Some(root.id), None))
            .await
            .unwrap();
        store.create_comment(comment("loose", None, None)).await.unwrap();

        assert!(store.delete_post(thread.id).await.unwrap());
        assert!(!store.delete_post(thread.id).await.unwrap());
        assert_eq!(store.comment_rows().await, 1);
        assert_eq!(store.comment_count(thread.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_posts_sorts_by_title() {
        let store = MemoryStore::new();
        for title in ["beta", "alpha", "gamma"] {
            store.create_post(post(title)).await.unwrap();
        }
        let query = ListQuery::<PostSort>::normalize(ListParams {
            sort_by: Some("title".to_string()),
            sort_order: Some("asc".to_string()),
            ..ListParams::default()
        });
        let (items, total) = store.list_posts(&query).await.unwrap();
        assert_eq!(total, 3);
        let titles: Vec<&str> = items.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["alpha", "beta", "gamma"]);
    }
}
