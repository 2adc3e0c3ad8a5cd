#![warn(clippy::all)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate
)]

//! Client core for the shellsquid record and user console.
//!
//! - [`session`]: token slot, login/logout, bearer interception, 401
//!   escalation, navigation gating
//! - [`api`]: authenticated JSON transport
//! - [`resource`]: typed CRUD with optimistic updates
//! - [`notify`]: observable success/error messages
//! - [`ownership`]: record owner resolution against the user list
//! - [`console`]: application root and detail screens

pub mod api;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod ownership;
pub mod resource;
pub mod session;

pub use config::ClientConfig;
pub use console::Console;
pub use error::{ClientError, FailurePayload};
pub use navigation::{NavigationDecision, Navigator, Route, Router};
pub use notify::{NotificationCenter, NotificationState};
pub use resource::{ErrorHandler, MutationState, OptimisticUpdate, QueryFilter, Resource, ResourceClient};
pub use session::{SessionGuard, SessionState};
