//! Session gate for the console.
//!
//! Provides:
//! - Token decoding (claims only, no signature verification)
//! - The persistent token slot (file-backed or in-memory)
//! - `SessionGuard`: login/logout, bearer interception, 401 escalation,
//!   and the navigation guard

pub mod guard;
pub mod store;
pub mod token;

pub use guard::{SessionGuard, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{SessionToken, TokenError};
