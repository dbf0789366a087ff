//! Cache key layout.
//!
//! ```text
//! subtree:{id}
//! post:{id}
//! post:{id}:comment_count
//! listing:{scope}:gen
//! listing:{scope}:{gen}:{page}:{size}:{search_hash}:{sort}:{order}
//! ```

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use arbor_core::domain::Id;
use arbor_core::domain::listing::{ListQuery, SortField};

/// Which listing a page belongs to, independent of page/sort/search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingScope {
    /// Root-level comments, of one thread or of every thread.
    RootComments { post_id: Option<Id> },
    Posts,
}

impl fmt::Display for ListingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingScope::RootComments { post_id: None } => f.write_str("comments:all"),
            ListingScope::RootComments { post_id: Some(id) } => write!(f, "comments:post:{id}"),
            ListingScope::Posts => f.write_str("posts"),
        }
    }
}

pub fn subtree(id: Id) -> String {
    format!("subtree:{id}")
}

pub fn post(id: Id) -> String {
    format!("post:{id}")
}

pub fn comment_count(post_id: Id) -> String {
    format!("post:{post_id}:comment_count")
}

pub fn listing_generation(scope: ListingScope) -> String {
    format!("listing:{scope}:gen")
}

pub fn listing_page<S: SortField>(
    scope: ListingScope,
    generation: &str,
    query: &ListQuery<S>,
) -> String {
    format!(
        "listing:{scope}:{generation}:{}:{}:{}:{}:{}",
        query.page,
        query.page_size,
        search_hash(query.search.as_deref()),
        query.sort_by.column(),
        query.sort_order.as_str(),
    )
}

fn search_hash(search: Option<&str>) -> String {
    match search {
        None => "-".to_string(),
        Some(value) => {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            format!("{:016x}", hasher.finish())
        }
    }
}
