pub mod comments_repo;
pub mod pool;
pub mod posts_repo;
pub mod store;

pub use comments_repo::CommentsRepoError;
pub use pool::{DbPool, DbPoolError, connect_lazy};
pub use posts_repo::PostsRepoError;
pub use store::PgStore;

/// Wraps a search term for `ILIKE`, escaping the pattern metacharacters.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("hello"), "%hello%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
