//! Generic CRUD access to the console's collections.
//!
//! An entity type opts in by implementing [`Resource`]; [`ResourceClient`]
//! then provides typed fetch, create, optimistic update, and delete on top of
//! the authenticated transport. Every failure is handed to the client's
//! [`ErrorHandler`] exactly once before it is returned.

pub mod client;
pub mod mutation;

pub use client::{QueryFilter, ResourceClient};
pub use mutation::{MutationState, OptimisticUpdate};

use crate::error::ClientError;
use crate::models::{Record, RecordDraft, User, UserDraft};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity exposed by the server as a REST collection.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Body sent on create.
    type Draft: Serialize + Send + Sync;

    /// Collection path, e.g. `/api/records`.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    /// Fold the server's canonical copy into this local instance after a
    /// successful write.
    fn merge_canonical(&mut self, canonical: Self) {
        *self = canonical;
    }
}

impl Resource for Record {
    type Draft = RecordDraft;
    const COLLECTION: &'static str = "/api/records";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Resource for User {
    type Draft = UserDraft;
    const COLLECTION: &'static str = "/api/users";

    fn id(&self) -> &str {
        &self.id
    }

    fn merge_canonical(&mut self, canonical: Self) {
        // The server never echoes the password back; drop the local copy too.
        *self = canonical;
        self.password = None;
    }
}

/// Receives every failed remote call.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &ClientError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&ClientError) + Send + Sync,
{
    fn handle(&self, error: &ClientError) {
        self(error)
    }
}
