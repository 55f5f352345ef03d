//! User/address repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users together with the addresses they own.
//! - Provide the filter, projection and join queries over users/addresses.
//!
//! # Invariants
//! - Adding a user assigns its id and the owner id of each attached address.
//! - Deleting a user removes its addresses and leaves its posts in place.
//! - User listing is deterministic: `id ASC` unless ordered by name.

use crate::db::cascade_dependents;
use crate::db::schema::USERS;
use crate::model::address::{Address, AddressId};
use crate::model::user::{User, UserId};
use crate::repo::query::one;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    fullname,
    nickname
FROM users";

/// Query options for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserListQuery {
    /// Exact-match filter on `name`.
    pub name: Option<String>,
    /// Sort by `name ASC` instead of insertion order.
    pub order_by_name: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// `(name, first email, second email)` row from a doubly aliased join.
pub type UserEmailPair = (Option<String>, String, String);

/// Rows removed alongside a deleted user, per dependent table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub cascaded: Vec<(&'static str, usize)>,
}

impl DeleteOutcome {
    /// Rows removed from `table` by cascade.
    pub fn cascaded_from(&self, table: &str) -> usize {
        self.cascaded
            .iter()
            .filter(|(name, _)| *name == table)
            .map(|(_, rows)| rows)
            .sum()
    }
}

/// Repository interface for users and their addresses.
pub trait UserRepository {
    /// Inserts a user and its attached addresses; returns the new id.
    fn add_user(&self, user: &mut User) -> RepoResult<UserId>;
    /// Inserts several users in order.
    fn add_users(&self, users: &mut [User]) -> RepoResult<Vec<UserId>>;
    /// Inserts one address owned by an existing user.
    fn add_address(&self, user_id: UserId, address: &mut Address) -> RepoResult<AddressId>;
    /// Loads one user with its addresses.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
    /// All users whose name equals `name`.
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<User>>;
    /// Exactly one user whose name equals `name`.
    fn one_by_name(&self, name: &str) -> RepoResult<User>;
    /// `(name, fullname)` column projection in insertion order.
    fn names_and_fullnames(&self) -> RepoResult<Vec<(Option<String>, Option<String>)>>;
    /// Users paired with each of their addresses matching `email`.
    fn users_with_address_email(&self, email: &str) -> RepoResult<Vec<(User, Address)>>;
    /// Users owning at least one address matching `email`.
    fn users_joined_on_email(&self, email: &str) -> RepoResult<Vec<User>>;
    /// Users owning both addresses, joining `addresses` twice.
    fn users_with_both_emails(&self, first: &str, second: &str)
        -> RepoResult<Vec<UserEmailPair>>;
    fn addresses_for_user(&self, user_id: UserId) -> RepoResult<Vec<Address>>;
    /// Deletes a user; cascading rules decide what goes with it.
    fn delete_user(&self, id: UserId) -> RepoResult<DeleteOutcome>;
    fn count_users(&self) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert_address(&self, address: &mut Address) -> RepoResult<AddressId> {
        address.validate()?;
        self.conn.execute(
            "INSERT INTO addresses (email_address, user_id) VALUES (?1, ?2);",
            params![address.email_address.as_str(), address.user_id],
        )?;
        let id = self.conn.last_insert_rowid();
        address.id = Some(id);
        Ok(id)
    }

    fn select_users(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }

        for user in &mut users {
            if let Some(id) = user.id {
                user.addresses = self.addresses_for_user(id)?;
            }
        }
        Ok(users)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn add_user(&self, user: &mut User) -> RepoResult<UserId> {
        for address in &user.addresses {
            address.validate()?;
        }

        self.conn.execute(
            "INSERT INTO users (name, fullname, nickname) VALUES (?1, ?2, ?3);",
            params![
                user.name.as_deref(),
                user.fullname.as_deref(),
                user.nickname.as_deref(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        user.assign_id(id);

        for address in &mut user.addresses {
            self.insert_address(address)?;
        }

        Ok(id)
    }

    fn add_users(&self, users: &mut [User]) -> RepoResult<Vec<UserId>> {
        users.iter_mut().map(|user| self.add_user(user)).collect()
    }

    fn add_address(&self, user_id: UserId, address: &mut Address) -> RepoResult<AddressId> {
        address.user_id = Some(user_id);
        self.insert_address(address)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let users = self.select_users(
            &format!("{USER_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Integer(id)],
        )?;
        Ok(users.into_iter().next())
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name = ?");
            bind_values.push(Value::Text(name.clone()));
        }

        if query.order_by_name {
            sql.push_str(" ORDER BY name ASC, id ASC");
        } else {
            sql.push_str(" ORDER BY id ASC");
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.select_users(&sql, bind_values)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<User>> {
        self.list_users(&UserListQuery {
            name: Some(name.to_string()),
            ..UserListQuery::default()
        })
    }

    fn one_by_name(&self, name: &str) -> RepoResult<User> {
        one("user", format!("name={name}"), self.find_by_name(name)?)
    }

    fn names_and_fullnames(&self) -> RepoResult<Vec<(Option<String>, Option<String>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, fullname FROM users ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next()? {
            pairs.push((row.get("name")?, row.get("fullname")?));
        }
        Ok(pairs)
    }

    fn users_with_address_email(&self, email: &str) -> RepoResult<Vec<(User, Address)>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                users.id AS id,
                users.name AS name,
                users.fullname AS fullname,
                users.nickname AS nickname,
                addresses.id AS address_id,
                addresses.email_address AS email_address,
                addresses.user_id AS user_id
             FROM users, addresses
             WHERE users.id = addresses.user_id
               AND addresses.email_address = ?1
             ORDER BY users.id ASC, addresses.id ASC;",
        )?;
        let mut rows = stmt.query([email])?;
        let mut pairs = Vec::new();
        while let Some(row) = rows.next()? {
            let user = parse_user_row(row)?;
            let address = Address {
                id: row.get("address_id")?,
                email_address: row.get("email_address")?,
                user_id: row.get("user_id")?,
            };
            pairs.push((user, address));
        }
        Ok(pairs)
    }

    fn users_joined_on_email(&self, email: &str) -> RepoResult<Vec<User>> {
        self.select_users(
            "SELECT DISTINCT
                users.id AS id,
                users.name AS name,
                users.fullname AS fullname,
                users.nickname AS nickname
             FROM users
             INNER JOIN addresses ON addresses.user_id = users.id
             WHERE addresses.email_address = ?
             ORDER BY users.id ASC;",
            vec![Value::Text(email.to_string())],
        )
    }

    fn users_with_both_emails(
        &self,
        first: &str,
        second: &str,
    ) -> RepoResult<Vec<UserEmailPair>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                users.name AS name,
                addresses_1.email_address AS first_email,
                addresses_2.email_address AS second_email
             FROM users
             INNER JOIN addresses AS addresses_1 ON addresses_1.user_id = users.id
             INNER JOIN addresses AS addresses_2 ON addresses_2.user_id = users.id
             WHERE addresses_1.email_address = ?1
               AND addresses_2.email_address = ?2
             ORDER BY users.id ASC;",
        )?;
        let mut rows = stmt.query(params![first, second])?;
        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            matches.push((
                row.get("name")?,
                row.get("first_email")?,
                row.get("second_email")?,
            ));
        }
        Ok(matches)
    }

    fn addresses_for_user(&self, user_id: UserId) -> RepoResult<Vec<Address>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email_address, user_id
             FROM addresses
             WHERE user_id = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut addresses = Vec::new();
        while let Some(row) = rows.next()? {
            addresses.push(Address {
                id: row.get("id")?,
                email_address: row.get("email_address")?,
                user_id: row.get("user_id")?,
            });
        }
        Ok(addresses)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<DeleteOutcome> {
        let mut outcome = DeleteOutcome::default();
        for (table, column) in cascade_dependents(USERS.name) {
            let rows: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE {column} = ?1;"),
                [id],
                |row| row.get(0),
            )?;
            outcome.cascaded.push((table, usize::try_from(rows).unwrap_or(0)));
        }

        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found("user", id));
        }

        info!(
            "event=user_delete module=repo status=ok user_id={} cascaded={:?}",
            id, outcome.cascaded
        );
        Ok(outcome)
    }

    fn count_users(&self) -> RepoResult<u64> {
        count_rows(self.conn, "users")
    }
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count in {table}")))
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        fullname: row.get("fullname")?,
        nickname: row.get("nickname")?,
        addresses: Vec::new(),
    })
}
