pub mod comments;
pub mod listing;
pub mod posts;
pub mod tree;

/// Store-assigned identity shared by comments and posts.
pub type Id = i64;
