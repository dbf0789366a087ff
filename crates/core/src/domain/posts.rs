use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Id;
use crate::error::ValidationError;
use crate::types::text::check_length;

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 10_000;
pub const AUTHOR_MIN_CHARS: usize = 2;
pub const AUTHOR_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Derived from the comments table, never stored on the post row.
    #[serde(default)]
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("title", &self.title, 1, TITLE_MAX_CHARS)?;
        check_length("content", &self.content, 1, CONTENT_MAX_CHARS)?;
        check_length("author", &self.author, AUTHOR_MIN_CHARS, AUTHOR_MAX_CHARS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_checks_every_field() {
        let post = NewPost {
            title: "Hello".to_string(),
            content: "World".to_string(),
            author: "ab".to_string(),
        };
        assert!(post.validate().is_ok());

        let long_title = NewPost {
            title: "t".repeat(201),
            ..post.clone()
        };
        assert_eq!(
            long_title.validate(),
            Err(ValidationError::TooLong {
                field: "title",
                max: 200
            })
        );

        let short_author = NewPost {
            author: "a".to_string(),
            ..post
        };
        assert!(short_author.validate().is_err());
    }
}
