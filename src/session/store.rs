//! The persistent token slot.
//!
//! Exactly one token lives in the slot at a time. [`FileTokenStore`] keeps it
//! in a single file named [`TOKEN_SLOT`] in the app data dir;
//! [`MemoryTokenStore`] backs tests and embedders that manage persistence
//! themselves.

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed name of the token slot.
pub const TOKEN_SLOT: &str = "token";

/// A single-value slot holding the current token string.
pub trait TokenStore: Send + Sync {
    /// The stored token, `None` when logged out.
    fn load(&self) -> Option<String>;

    /// Replace the stored token.
    fn save(&self, token: &str) -> io::Result<()>;

    /// Remove the stored token. Safe to call when the slot is already empty.
    fn clear(&self);
}

// ── In-memory slot ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        self.slot.lock().take();
    }
}

// ── File-backed slot ─────────────────────────────────────────────

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    /// Set when `clear` could neither remove nor truncate the file; the slot
    /// then reads as empty until the next successful `save`.
    cleared: AtomicBool,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cleared: AtomicBool::new(false),
        }
    }

    /// Slot named [`TOKEN_SLOT`] inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TOKEN_SLOT))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        if self.cleared.load(Ordering::Acquire) {
            return None;
        }
        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        self.cleared.store(false, Ordering::Release);
        Ok(())
    }

    fn clear(&self) {
        let err = match std::fs::remove_file(&self.path) {
            Ok(()) => return,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => e,
        };
        tracing::warn!("failed to remove token slot {}: {err}", self.path.display());
        // A blank file reads as an empty slot.
        if let Err(e) = std::fs::write(&self.path, "") {
            tracing::warn!("failed to truncate token slot {}: {e}", self.path.display());
            self.cleared.store(true, Ordering::Release);
        }
    }
}
