use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Id;
use crate::error::ValidationError;
use crate::types::text::check_length;

pub const CONTENT_MAX_CHARS: usize = 1000;
pub const AUTHOR_MIN_CHARS: usize = 2;
pub const AUTHOR_MAX_CHARS: usize = 50;
/// Deepest level a reply may sit at; root comments are level 1.
pub const MAX_REPLY_DEPTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub parent_id: Option<Id>,
    /// Thread (post) the comment belongs to; replies share their root's thread.
    pub post_id: Option<Id>,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only populated by tree materialization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Comment>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewComment {
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub parent_id: Option<Id>,
    #[serde(default)]
    pub post_id: Option<Id>,
}

/// Rejects a reply whose parent already has `parent_ancestors` ancestors
/// when the reply would sit deeper than [`MAX_REPLY_DEPTH`].
pub fn check_reply_depth(parent_ancestors: usize) -> Result<(), ValidationError> {
    // parent sits at level parent_ancestors + 1, the reply one below it
    if parent_ancestors + 2 > MAX_REPLY_DEPTH {
        return Err(ValidationError::TooDeep {
            max: MAX_REPLY_DEPTH,
        });
    }
    Ok(())
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_length("content", &self.content, 1, CONTENT_MAX_CHARS)?;
        check_length("author", &self.author, AUTHOR_MIN_CHARS, AUTHOR_MAX_CHARS)?;
        if self.parent_id.is_some() && self.post_id.is_some() {
            return Err(ValidationError::Conflict {
                field: "post_id",
                reason: "replies inherit the thread of their parent",
            });
        }
        Ok(())
    }
}
