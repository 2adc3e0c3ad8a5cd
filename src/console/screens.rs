//! Record and user detail screens.

use super::Console;
use crate::error::ClientError;
use crate::models::{Record, User};
use crate::navigation::Route;
use crate::ownership::{records_owned_by, resolve_owner, retarget};

pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords must match";
pub const PASSWORD_UPDATED_MESSAGE: &str = "Password updated";
pub const PASSWORD_FAILED_MESSAGE: &str = "Error updating password";

// ── Record ───────────────────────────────────────────────────────

/// One record plus the user list its owner is resolved against.
pub struct RecordScreen<'c> {
    console: &'c Console,
    record: Record,
    users: Vec<User>,
}

impl<'c> RecordScreen<'c> {
    /// Fetch the record, then the users.
    pub(crate) async fn load(console: &'c Console, id: &str) -> Result<Self, ClientError> {
        let record = console.records.get(id).await?;
        let users = console.users.query(None).await?;
        Ok(Self {
            console,
            record,
            users,
        })
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// The user currently selected as owner, if the snapshot still resolves.
    pub fn owner(&self) -> Option<&User> {
        resolve_owner(&self.record, &self.users)
    }

    pub async fn set_blacklist(&mut self, blacklist: bool) -> Result<(), ClientError> {
        self.console
            .records
            .update_with(&mut self.record, |r| r.blacklist = blacklist)
            .await
            .map(|_| ())
    }

    /// Reassign to the user with `email` and save.
    ///
    /// An unknown email leaves the owner as it was, but the record is still
    /// saved. Returns whether the owner changed.
    pub async fn save_owner(&mut self, email: &str) -> Result<bool, ClientError> {
        let users = &self.users;
        let mut matched = false;
        self.console
            .records
            .update_with(&mut self.record, |r| matched = retarget(r, email, users))
            .await?;
        Ok(matched)
    }

    pub async fn clear_clients(&mut self) -> Result<(), ClientError> {
        self.console
            .records
            .update_with(&mut self.record, |r| r.clients.clear())
            .await
            .map(|_| ())
    }

    /// Delete the record and return to the list.
    pub async fn delete(self) -> Result<Route, ClientError> {
        self.console.records.remove(&self.record).await?;
        Ok(self.console.router.navigate(Route::Records))
    }
}

// ── User ─────────────────────────────────────────────────────────

/// One user plus the records it owns, with the password-change form.
pub struct UserScreen<'c> {
    console: &'c Console,
    user: User,
    records: Vec<Record>,
    pub password: String,
    pub confirm_password: String,
    error: Option<&'static str>,
    success: Option<&'static str>,
}

impl<'c> UserScreen<'c> {
    /// Fetch the user, then every record, keeping the ones it owns.
    pub(crate) async fn load(console: &'c Console, id: &str) -> Result<Self, ClientError> {
        let user = console.users.get(id).await?;
        let all = console.records.query(None).await?;
        let records = records_owned_by(&all, &user).into_iter().cloned().collect();
        Ok(Self {
            console,
            user,
            records,
            password: String::new(),
            confirm_password: String::new(),
            error: None,
            success: None,
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn success(&self) -> Option<&'static str> {
        self.success
    }

    /// Submit the password form. The outcome lands in `error()`/`success()`.
    ///
    /// A mismatch is caught locally and keeps the form. Once submitted, the
    /// form is cleared whatever the server answers. Failures stay on the
    /// screen and never reach the notification banner.
    pub async fn change_password(&mut self) {
        if self.password != self.confirm_password {
            self.error = Some(PASSWORD_MISMATCH_MESSAGE);
            return;
        }

        let result = self
            .console
            .users
            .post_password(&self.user.id, &self.password)
            .await;
        match result {
            Ok(()) => {
                self.success = Some(PASSWORD_UPDATED_MESSAGE);
                self.error = None;
            }
            Err(_) => {
                self.error = Some(PASSWORD_FAILED_MESSAGE);
                self.success = None;
            }
        }
        self.password.clear();
        self.confirm_password.clear();
    }

    /// Delete the user and return to the list.
    pub async fn delete(self) -> Result<Route, ClientError> {
        self.console.users.remove(&self.user).await?;
        Ok(self.console.router.navigate(Route::Users))
    }
}
