//! Keyword record and the post/keyword association row.

use super::post::PostId;
use super::{require_max_chars, require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type KeywordId = i64;

/// Declared bound of `keywords.keyword`.
pub const KEYWORD_MAX_CHARS: usize = 50;

/// Globally unique tag attachable to many posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: Option<KeywordId>,
    pub keyword: String,
}

impl Keyword {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            id: None,
            keyword: keyword.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("keyword", &self.keyword)?;
        require_max_chars("keyword", &self.keyword, KEYWORD_MAX_CHARS)
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Keyword({:?})", self.keyword)
    }
}

/// Row of the `post_keywords` association table.
///
/// The pair is the row identity; storage rejects duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostKeyword {
    pub post_id: PostId,
    pub keyword_id: KeywordId,
}
