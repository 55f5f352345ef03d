//! Blog post record.
//!
//! # Invariants
//! - `headline` is non-empty and at most 255 characters.
//! - The author is added before the post; `user_id` is set at construction.
//! - `keywords` mirrors the association rows once persisted.

use super::keyword::Keyword;
use super::user::{User, UserId};
use super::{require_max_chars, require_non_empty, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type PostId = i64;

/// Declared bound of `posts.headline`.
pub const HEADLINE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Option<PostId>,
    /// Authoring user. Deleting the author does not touch this value.
    pub user_id: Option<UserId>,
    pub headline: String,
    pub body: Option<String>,
    pub date: Option<NaiveDate>,
    pub keywords: Vec<Keyword>,
}

impl BlogPost {
    pub fn new(headline: impl Into<String>, body: impl Into<String>, author: &User) -> Self {
        Self {
            id: None,
            user_id: author.id,
            headline: headline.into(),
            body: Some(body.into()),
            date: None,
            keywords: Vec::new(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        self.keywords.push(keyword);
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("headline", &self.headline)?;
        require_max_chars("headline", &self.headline, HEADLINE_MAX_CHARS)?;
        if self.user_id.is_none() {
            return Err(ModelValidationError::UnsavedReference("author"));
        }
        Ok(())
    }
}

impl Display for BlogPost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BlogPost({:?}, {:?}, author_id={})",
            self.headline,
            self.body.as_deref().unwrap_or_default(),
            self.user_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::BlogPost;
    use crate::model::keyword::Keyword;
    use crate::model::user::User;
    use crate::model::ModelValidationError;

    #[test]
    fn new_post_takes_author_id() {
        let mut wendy = User::new("wendy", "Wendy Williams", "windy");
        wendy.assign_id(4);
        let post = BlogPost::new("Wendy's Blog Post", "This is a test", &wendy);
        assert_eq!(post.user_id, Some(4));
        assert_eq!(post.body.as_deref(), Some("This is a test"));
    }

    #[test]
    fn headline_bounds_are_enforced() {
        let author = User::default();
        let empty = BlogPost::new("  ", "body", &author);
        assert_eq!(
            empty.validate(),
            Err(ModelValidationError::EmptyField("headline"))
        );

        let long = BlogPost::new("x".repeat(256), "body", &author);
        assert!(matches!(
            long.validate(),
            Err(ModelValidationError::TooLong { actual_chars: 256, .. })
        ));
    }

    #[test]
    fn unsaved_author_is_rejected() {
        let draft = BlogPost::new("Draft", "body", &User::new("wendy", "Wendy", "windy"));
        assert_eq!(
            draft.validate(),
            Err(ModelValidationError::UnsavedReference("author"))
        );
    }

    #[test]
    fn keyword_bounds_are_enforced() {
        assert!(Keyword::new("firstpost").validate().is_ok());
        assert!(Keyword::new("").validate().is_err());
        assert!(Keyword::new("k".repeat(51)).validate().is_err());
    }
}
