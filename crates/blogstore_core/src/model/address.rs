//! Address record, owned by exactly one user.

use super::user::UserId;
use super::{require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type AddressId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Option<AddressId>,
    pub email_address: String,
    /// Owning user; `None` only while unattached.
    pub user_id: Option<UserId>,
}

impl Address {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            id: None,
            email_address: email_address.into(),
            user_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("email_address", &self.email_address)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Address(email_address='{}')>", self.email_address)
    }
}
