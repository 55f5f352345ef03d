//! Core persistence logic for blogstore.
//! Schema declaration, unit-of-work lifecycle and the repository queries
//! over users, addresses, blog posts and keywords.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod session;

pub use db::{DbError, DbResult, Store, StoreConfig, StoreLocation};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::address::{Address, AddressId};
pub use model::keyword::{Keyword, KeywordId, PostKeyword};
pub use model::post::{BlogPost, PostId};
pub use model::user::{User, UserId};
pub use model::ModelValidationError;
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::user_repo::{
    DeleteOutcome, SqliteUserRepository, UserEmailPair, UserListQuery, UserRepository,
};
pub use repo::{RepoError, RepoResult};
pub use session::{run_scoped, Session, SessionState, UnitOfWork};
