//! Optimistic mutation with an explicit snapshot.
//!
//! ```text
//! begin ──apply*──▶ Pending ──commit──▶ Committed
//!                      │
//!                      └──roll_back──▶ RolledBack (snapshot restored)
//! ```

use super::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Committed,
    RolledBack,
}

/// A local edit of `entity` that has not yet been confirmed by the server.
pub struct OptimisticUpdate<'a, E: Resource> {
    entity: &'a mut E,
    snapshot: Option<E>,
    state: MutationState,
}

impl<'a, E: Resource> OptimisticUpdate<'a, E> {
    /// Snapshot `entity` and start a pending update.
    pub fn begin(entity: &'a mut E) -> Self {
        let snapshot = entity.clone();
        Self {
            entity,
            snapshot: Some(snapshot),
            state: MutationState::Pending,
        }
    }

    /// Mutate the local entity. Ignored once the update has settled.
    pub fn apply(&mut self, mutate: impl FnOnce(&mut E)) -> &mut Self {
        if self.state == MutationState::Pending {
            mutate(&mut *self.entity);
        } else {
            tracing::warn!(
                "ignoring edit to {} {}: update already {:?}",
                E::COLLECTION,
                self.entity.id(),
                self.state
            );
        }
        self
    }

    pub fn entity(&self) -> &E {
        &*self.entity
    }

    pub fn state(&self) -> MutationState {
        self.state
    }

    /// Accept the server's copy and drop the snapshot.
    pub fn commit(&mut self, canonical: E) {
        self.entity.merge_canonical(canonical);
        self.snapshot = None;
        self.state = MutationState::Committed;
    }

    /// Restore the pre-mutation snapshot. No effect once committed.
    pub fn roll_back(&mut self) {
        if self.state == MutationState::Committed {
            return;
        }
        if let Some(snapshot) = self.snapshot.take() {
            *self.entity = snapshot;
        }
        self.state = MutationState::RolledBack;
    }
}
