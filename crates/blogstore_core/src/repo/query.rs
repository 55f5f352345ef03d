//! Result cardinality helpers applied to fetched rows.
//!
//! Repositories return concrete vectors; these helpers turn them into the
//! terminal shapes callers ask for (`first`, `one`, `one_or_none`,
//! `scalar`).

use super::{RepoError, RepoResult};
use std::fmt::Display;

/// Returns the first row, if any.
pub fn first<T>(rows: Vec<T>) -> Option<T> {
    rows.into_iter().next()
}

/// Requires exactly one row.
///
/// # Errors
/// - `RepoError::NotFound` when `rows` is empty.
/// - `RepoError::MultipleResults` when `rows` holds more than one row.
pub fn one<T>(entity: &'static str, key: impl Display, rows: Vec<T>) -> RepoResult<T> {
    match one_or_none(entity, &key, rows)? {
        Some(row) => Ok(row),
        None => Err(RepoError::not_found(entity, key)),
    }
}

/// Accepts zero or one row.
///
/// # Errors
/// - `RepoError::MultipleResults` when `rows` holds more than one row.
pub fn one_or_none<T>(
    entity: &'static str,
    key: impl Display,
    rows: Vec<T>,
) -> RepoResult<Option<T>> {
    if rows.len() > 1 {
        return Err(RepoError::MultipleResults {
            entity,
            key: key.to_string(),
            count: rows.len(),
        });
    }
    Ok(rows.into_iter().next())
}

/// Requires exactly one row and projects a single value out of it.
pub fn scalar<T, V>(
    entity: &'static str,
    key: impl Display,
    rows: Vec<T>,
    project: impl FnOnce(T) -> V,
) -> RepoResult<V> {
    one(entity, key, rows).map(project)
}

#[cfg(test)]
mod tests {
    use super::{first, one, one_or_none, scalar};
    use crate::repo::RepoError;

    #[test]
    fn first_takes_leading_row() {
        assert_eq!(first(vec![3, 4]), Some(3));
        assert_eq!(first::<i32>(Vec::new()), None);
    }

    #[test]
    fn one_rejects_empty_and_multiple() {
        assert_eq!(one("user", "name=ed", vec![1]).unwrap(), 1);

        let empty = one::<i32>("user", "name=ed", Vec::new()).unwrap_err();
        assert!(matches!(empty, RepoError::NotFound { entity: "user", .. }));

        let many = one("user", "name=ed", vec![1, 2]).unwrap_err();
        assert!(matches!(many, RepoError::MultipleResults { count: 2, .. }));
    }

    #[test]
    fn one_or_none_allows_empty() {
        assert_eq!(one_or_none::<i32>("keyword", "x", Vec::new()).unwrap(), None);
        assert!(one_or_none("keyword", "x", vec![1, 1]).is_err());
    }

    #[test]
    fn scalar_projects_first_column() {
        let rows = vec![("ed".to_string(), "Ed Jones".to_string())];
        let fullname = scalar("user", "name=ed", rows, |(_, fullname)| fullname).unwrap();
        assert_eq!(fullname, "Ed Jones");
    }
}
