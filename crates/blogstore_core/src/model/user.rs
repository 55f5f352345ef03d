//! User record.
//!
//! # Invariants
//! - Every address in `addresses` carries this user's id once the user has one.
//! - Authored posts are not held here; query them through the post repository.

use super::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type UserId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub fullname: Option<String>,
    pub nickname: Option<String>,
    /// Owned addresses; deleted together with the user.
    pub addresses: Vec<Address>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        fullname: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            fullname: Some(fullname.into()),
            nickname: Some(nickname.into()),
            addresses: Vec::new(),
        }
    }

    /// Attaches an address, pointing its owner reference back at this user.
    pub fn add_address(&mut self, mut address: Address) {
        address.user_id = self.id;
        self.addresses.push(address);
    }

    /// Replaces the address collection, re-pointing every owner reference.
    pub fn set_addresses(&mut self, addresses: Vec<Address>) {
        self.addresses.clear();
        for address in addresses {
            self.add_address(address);
        }
    }

    /// Records the identity assigned by storage and propagates it to owned
    /// addresses.
    pub fn assign_id(&mut self, id: UserId) {
        self.id = Some(id);
        for address in &mut self.addresses {
            address.user_id = Some(id);
        }
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<User(name='{}', fullname='{}', nickname='{}')>",
            self.name.as_deref().unwrap_or_default(),
            self.fullname.as_deref().unwrap_or_default(),
            self.nickname.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::User;
    use crate::model::address::Address;

    #[test]
    fn add_address_sets_owner_on_both_sides() {
        let mut jack = User::new("jack", "Jack Bean", "Jake");
        jack.assign_id(7);
        jack.add_address(Address::new("jack@google.com"));

        assert_eq!(jack.addresses.len(), 1);
        assert_eq!(jack.addresses[0].user_id, Some(7));
    }

    #[test]
    fn assign_id_propagates_to_pending_addresses() {
        let mut jack = User::new("jack", "Jack Bean", "Jake");
        jack.set_addresses(vec![
            Address::new("jack@google.com"),
            Address::new("j25@yahoo.com"),
        ]);
        assert!(jack.addresses.iter().all(|a| a.user_id.is_none()));

        jack.assign_id(3);
        assert!(jack.addresses.iter().all(|a| a.user_id == Some(3)));
    }

    #[test]
    fn serializes_with_owned_addresses() {
        let mut jack = User::new("jack", "Jack Bean", "Jake");
        jack.assign_id(2);
        jack.add_address(Address::new("jack@google.com"));

        let value = serde_json::to_value(&jack).unwrap();
        assert_eq!(value["name"], "jack");
        assert_eq!(value["addresses"][0]["email_address"], "jack@google.com");
        assert_eq!(value["addresses"][0]["user_id"], 2);

        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back, jack);
    }

    #[test]
    fn display_matches_record_format() {
        let ed = User::new("ed", "Ed Jones", "edsnickname");
        assert_eq!(
            ed.to_string(),
            "<User(name='ed', fullname='Ed Jones', nickname='edsnickname')>"
        );
    }
}
