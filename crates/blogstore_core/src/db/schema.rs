//! Declared table schema and the `create_all` executor.
//!
//! # Responsibility
//! - Declare every table as data: columns, keys, foreign keys and delete rules.
//! - Generate DDL from those descriptors and materialize it idempotently.
//!
//! # Invariants
//! - `create_all` only issues `CREATE TABLE IF NOT EXISTS`; running it twice
//!   changes nothing.
//! - The applied schema version is mirrored to `PRAGMA user_version`.
//! - `DeleteRule::Orphan` references carry no database constraint.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Version recorded in `PRAGMA user_version` once the schema is created.
const SCHEMA_VERSION: u32 = 1;

/// Storage class of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    /// Bounded string; SQLite keeps the bound as documentation only.
    Varchar(u16),
    Date,
}

impl SqlType {
    fn ddl(self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Varchar(len) => format!("VARCHAR({len})"),
            Self::Date => "DATE".to_string(),
        }
    }
}

/// What happens to dependent rows when the referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteRule {
    /// Dependent rows are deleted with their parent.
    Cascade,
    /// Dependent rows are left in place with a dangling reference.
    Orphan,
}

/// Reference from a column to another table's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: DeleteRule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub nullable: bool,
    pub unique: bool,
    pub references: Option<ForeignKeyDef>,
}

impl ColumnDef {
    const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            primary_key: false,
            nullable: true,
            unique: false,
            references: None,
        }
    }

    const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    const fn references(
        mut self,
        table: &'static str,
        column: &'static str,
        on_delete: DeleteRule,
    ) -> Self {
        self.references = Some(ForeignKeyDef {
            table,
            column,
            on_delete,
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    fn primary_key_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|column| column.primary_key)
            .map(|column| column.name)
            .collect()
    }

    /// Renders the `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_sql(&self) -> String {
        let primary_key = self.primary_key_columns();
        let composite_key = primary_key.len() > 1;
        let mut parts: Vec<String> = Vec::with_capacity(self.columns.len() + 1);

        for column in self.columns {
            let mut part = format!("{} {}", column.name, column.sql_type.ddl());
            if column.primary_key && !composite_key {
                part.push_str(" PRIMARY KEY");
            } else if !column.nullable {
                part.push_str(" NOT NULL");
            }
            if column.unique {
                part.push_str(" UNIQUE");
            }
            if let Some(fk) = column.references {
                if fk.on_delete == DeleteRule::Cascade {
                    part.push_str(&format!(
                        " REFERENCES {}({}) ON DELETE CASCADE",
                        fk.table, fk.column
                    ));
                }
            }
            parts.push(part);
        }

        if composite_key {
            parts.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name,
            parts.join(",\n    ")
        )
    }
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::new("id", SqlType::Integer).primary_key(),
        ColumnDef::new("name", SqlType::Text),
        ColumnDef::new("fullname", SqlType::Text),
        ColumnDef::new("nickname", SqlType::Text),
    ],
};

pub const ADDRESSES: TableDef = TableDef {
    name: "addresses",
    columns: &[
        ColumnDef::new("id", SqlType::Integer).primary_key(),
        ColumnDef::new("email_address", SqlType::Text).not_null(),
        ColumnDef::new("user_id", SqlType::Integer).references("users", "id", DeleteRule::Cascade),
    ],
};

pub const POSTS: TableDef = TableDef {
    name: "posts",
    columns: &[
        ColumnDef::new("id", SqlType::Integer).primary_key(),
        ColumnDef::new("user_id", SqlType::Integer).references("users", "id", DeleteRule::Orphan),
        ColumnDef::new("headline", SqlType::Varchar(255)).not_null(),
        ColumnDef::new("body", SqlType::Text),
        ColumnDef::new("date", SqlType::Date),
    ],
};

pub const KEYWORDS: TableDef = TableDef {
    name: "keywords",
    columns: &[
        ColumnDef::new("id", SqlType::Integer).primary_key(),
        ColumnDef::new("keyword", SqlType::Varchar(50))
            .not_null()
            .unique(),
    ],
};

pub const POST_KEYWORDS: TableDef = TableDef {
    name: "post_keywords",
    columns: &[
        ColumnDef::new("post_id", SqlType::Integer)
            .primary_key()
            .references("posts", "id", DeleteRule::Cascade),
        ColumnDef::new("keyword_id", SqlType::Integer)
            .primary_key()
            .references("keywords", "id", DeleteRule::Cascade),
    ],
};

/// Every table known to the store, parents before dependents.
pub const TABLES: &[TableDef] = &[USERS, ADDRESSES, POSTS, KEYWORDS, POST_KEYWORDS];

/// Returns the schema version this binary creates.
pub fn latest_version() -> u32 {
    SCHEMA_VERSION
}

/// Lists `(table, column)` pairs whose rows are deleted along with a row of
/// `parent`.
pub fn cascade_dependents(parent: &str) -> Vec<(&'static str, &'static str)> {
    TABLES
        .iter()
        .flat_map(|table| {
            table.columns.iter().filter_map(move |column| match column.references {
                Some(fk) if fk.table == parent && fk.on_delete == DeleteRule::Cascade => {
                    Some((table.name, column.name))
                }
                _ => None,
            })
        })
        .collect()
}

/// Creates every declared table that does not exist yet.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the store was written by a
///   newer schema.
/// - `DbError::Sqlite` when DDL execution fails; nothing is applied then.
pub fn create_all(conn: &mut Connection) -> DbResult<()> {
    let started_at = Instant::now();
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        error!(
            "event=schema_create module=db status=error error_code=unsupported_version db_version={} latest={}",
            current_version, latest
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let tx = conn.transaction()?;
    for table in TABLES {
        tx.execute_batch(&table.create_sql())?;
    }
    if current_version < latest {
        tx.execute_batch(&format!("PRAGMA user_version = {latest};"))?;
    }
    tx.commit()?;

    info!(
        "event=schema_create module=db status=ok tables={} from_version={} version={} duration_ms={}",
        TABLES.len(),
        current_version,
        latest,
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{cascade_dependents, ADDRESSES, KEYWORDS, POSTS, POST_KEYWORDS};

    #[test]
    fn single_primary_key_is_inline() {
        let sql = ADDRESSES.create_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS addresses"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        assert!(sql.contains("email_address TEXT NOT NULL"));
        assert!(sql.contains("user_id INTEGER REFERENCES users(id) ON DELETE CASCADE"));
    }

    #[test]
    fn composite_primary_key_is_table_level() {
        let sql = POST_KEYWORDS.create_sql();
        assert!(sql.contains("PRIMARY KEY (post_id, keyword_id)"));
        assert!(sql.contains("post_id INTEGER NOT NULL REFERENCES posts(id)"));
        assert!(!sql.contains("post_id INTEGER PRIMARY KEY"));
    }

    #[test]
    fn orphan_reference_has_no_constraint() {
        let sql = POSTS.create_sql();
        assert!(sql.contains("user_id INTEGER,"));
        assert!(!sql.contains("REFERENCES users"));
        assert!(sql.contains("headline VARCHAR(255) NOT NULL"));
    }

    #[test]
    fn unique_columns_are_rendered() {
        assert!(KEYWORDS
            .create_sql()
            .contains("keyword VARCHAR(50) NOT NULL UNIQUE"));
    }

    #[test]
    fn users_cascade_only_to_addresses() {
        assert_eq!(cascade_dependents("users"), vec![("addresses", "user_id")]);
        assert_eq!(cascade_dependents("posts"), vec![("post_keywords", "post_id")]);
        assert!(cascade_dependents("post_keywords").is_empty());
    }
}
