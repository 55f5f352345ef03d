//! Blog post/keyword repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist posts, keywords and the `post_keywords` association.
//! - Expose both directions of the many-to-many as explicit queries.
//!
//! # Invariants
//! - `keywords.keyword` is globally unique; duplicates are constraint errors.
//! - A `(post, keyword)` pair is stored at most once.
//! - Post listing is deterministic: `id ASC`.

use crate::model::keyword::{Keyword, KeywordId, PostKeyword};
use crate::model::post::{BlogPost, PostId};
use crate::model::user::UserId;
use crate::repo::query::one_or_none;
use crate::repo::user_repo::count_rows;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const POST_SELECT_SQL: &str = "SELECT
    posts.id AS id,
    posts.user_id AS user_id,
    posts.headline AS headline,
    posts.body AS body,
    posts.date AS date
FROM posts";

/// Repository interface for posts and keywords.
pub trait PostRepository {
    /// Inserts a post plus its keywords and association rows.
    fn add_post(&self, post: &mut BlogPost) -> RepoResult<PostId>;
    /// Inserts one keyword; fails when the keyword string already exists.
    fn add_keyword(&self, keyword: &mut Keyword) -> RepoResult<KeywordId>;
    /// Links an existing post and keyword.
    fn attach_keyword(&self, post_id: PostId, keyword_id: KeywordId) -> RepoResult<PostKeyword>;
    /// Loads one post with its keywords.
    fn get_post(&self, id: PostId) -> RepoResult<Option<BlogPost>>;
    fn posts_by_author(&self, user_id: UserId) -> RepoResult<Vec<BlogPost>>;
    /// Posts linked to a keyword with the given string.
    fn posts_with_keyword(&self, keyword: &str) -> RepoResult<Vec<BlogPost>>;
    fn keywords_for_post(&self, post_id: PostId) -> RepoResult<Vec<Keyword>>;
    fn posts_for_keyword(&self, keyword_id: KeywordId) -> RepoResult<Vec<BlogPost>>;
    fn find_keyword(&self, keyword: &str) -> RepoResult<Option<Keyword>>;
    /// Deletes a post; its association rows go with it.
    fn delete_post(&self, id: PostId) -> RepoResult<()>;
    fn count_posts(&self) -> RepoResult<u64>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn select_posts(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<BlogPost>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }

        for post in &mut posts {
            if let Some(id) = post.id {
                post.keywords = self.keywords_for_post(id)?;
            }
        }
        Ok(posts)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn add_post(&self, post: &mut BlogPost) -> RepoResult<PostId> {
        post.validate()?;
        for keyword in &post.keywords {
            keyword.validate()?;
        }

        self.conn.execute(
            "INSERT INTO posts (user_id, headline, body, date) VALUES (?1, ?2, ?3, ?4);",
            params![
                post.user_id,
                post.headline.as_str(),
                post.body.as_deref(),
                post.date,
            ],
        )?;
        let post_id = self.conn.last_insert_rowid();
        post.id = Some(post_id);

        for keyword in &mut post.keywords {
            let keyword_id = match keyword.id {
                Some(id) => id,
                None => self.add_keyword(keyword)?,
            };
            self.attach_keyword(post_id, keyword_id)?;
        }

        Ok(post_id)
    }

    fn add_keyword(&self, keyword: &mut Keyword) -> RepoResult<KeywordId> {
        keyword.validate()?;
        self.conn.execute(
            "INSERT INTO keywords (keyword) VALUES (?1);",
            [keyword.keyword.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        keyword.id = Some(id);
        Ok(id)
    }

    fn attach_keyword(&self, post_id: PostId, keyword_id: KeywordId) -> RepoResult<PostKeyword> {
        self.conn.execute(
            "INSERT INTO post_keywords (post_id, keyword_id) VALUES (?1, ?2);",
            params![post_id, keyword_id],
        )?;
        Ok(PostKeyword {
            post_id,
            keyword_id,
        })
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<BlogPost>> {
        let posts = self.select_posts(
            &format!("{POST_SELECT_SQL} WHERE posts.id = ?;"),
            vec![Value::Integer(id)],
        )?;
        Ok(posts.into_iter().next())
    }

    fn posts_by_author(&self, user_id: UserId) -> RepoResult<Vec<BlogPost>> {
        self.select_posts(
            &format!("{POST_SELECT_SQL} WHERE posts.user_id = ? ORDER BY posts.id ASC;"),
            vec![Value::Integer(user_id)],
        )
    }

    fn posts_with_keyword(&self, keyword: &str) -> RepoResult<Vec<BlogPost>> {
        self.select_posts(
            &format!(
                "{POST_SELECT_SQL}
                 WHERE EXISTS (
                    SELECT 1
                    FROM post_keywords
                    INNER JOIN keywords ON keywords.id = post_keywords.keyword_id
                    WHERE post_keywords.post_id = posts.id
                      AND keywords.keyword = ?
                 )
                 ORDER BY posts.id ASC;"
            ),
            vec![Value::Text(keyword.to_string())],
        )
    }

    fn keywords_for_post(&self, post_id: PostId) -> RepoResult<Vec<Keyword>> {
        let mut stmt = self.conn.prepare(
            "SELECT keywords.id AS id, keywords.keyword AS keyword
             FROM post_keywords
             INNER JOIN keywords ON keywords.id = post_keywords.keyword_id
             WHERE post_keywords.post_id = ?1
             ORDER BY keywords.id ASC;",
        )?;
        let mut rows = stmt.query([post_id])?;
        let mut keywords = Vec::new();
        while let Some(row) = rows.next()? {
            keywords.push(parse_keyword_row(row)?);
        }
        Ok(keywords)
    }

    fn posts_for_keyword(&self, keyword_id: KeywordId) -> RepoResult<Vec<BlogPost>> {
        self.select_posts(
            &format!(
                "{POST_SELECT_SQL}
                 INNER JOIN post_keywords ON post_keywords.post_id = posts.id
                 WHERE post_keywords.keyword_id = ?
                 ORDER BY posts.id ASC;"
            ),
            vec![Value::Integer(keyword_id)],
        )
    }

    fn find_keyword(&self, keyword: &str) -> RepoResult<Option<Keyword>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, keyword FROM keywords WHERE keyword = ?1;")?;
        let mut rows = stmt.query([keyword])?;
        let mut found = Vec::new();
        while let Some(row) = rows.next()? {
            found.push(parse_keyword_row(row)?);
        }
        one_or_none("keyword", format!("keyword={keyword}"), found)
    }

    fn delete_post(&self, id: PostId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM posts WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("post", id));
        }
        Ok(())
    }

    fn count_posts(&self) -> RepoResult<u64> {
        count_rows(self.conn, "posts")
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<BlogPost> {
    Ok(BlogPost {
        id: Some(row.get("id")?),
        user_id: row.get("user_id")?,
        headline: row.get("headline")?,
        body: row.get("body")?,
        date: row.get("date")?,
        keywords: Vec::new(),
    })
}

fn parse_keyword_row(row: &Row<'_>) -> RepoResult<Keyword> {
    Ok(Keyword {
        id: Some(row.get("id")?),
        keyword: row.get("keyword")?,
    })
}
