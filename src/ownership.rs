//! Joins a record's embedded owner snapshot against a fetched user list.
//!
//! The snapshot is taken when the record is written and never follows the
//! user afterwards. These helpers re-resolve it on demand.

use crate::models::{Owner, Record, User};

/// The user the record's owner snapshot points at, matched by id.
pub fn resolve_owner<'a>(record: &Record, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| user.id == record.owner.id)
}

/// Point the record at the user whose email is exactly `email`.
///
/// Returns whether a user matched. With no match the record is left as it
/// was and nothing is reported.
pub fn retarget(record: &mut Record, email: &str, users: &[User]) -> bool {
    match users.iter().find(|user| user.email == email) {
        Some(user) => {
            record.owner = Owner::from(user);
            true
        }
        None => {
            tracing::debug!("no user with email {email}; owner of {} unchanged", record.id);
            false
        }
    }
}

/// Records whose owner snapshot names `user`.
pub fn records_owned_by<'a>(records: &'a [Record], user: &User) -> Vec<&'a Record> {
    records.iter().filter(|record| record.owner.id == user.id).collect()
}
