//! Typed CRUD client over one collection.

use super::mutation::{MutationState, OptimisticUpdate};
use super::{ErrorHandler, Resource};
use crate::api::ApiClient;
use crate::error::ClientError;
use crate::models::{PasswordChange, User};
use reqwest::Method;
use std::marker::PhantomData;
use std::sync::Arc;

/// Query-string parameters for a collection fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    params: Vec<(String, String)>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }
}

pub struct ResourceClient<E: Resource> {
    api: Arc<ApiClient>,
    handler: Arc<dyn ErrorHandler>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Resource> Clone for ResourceClient<E> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            handler: Arc::clone(&self.handler),
            _entity: PhantomData,
        }
    }
}

impl<E: Resource> ResourceClient<E> {
    pub fn new(api: Arc<ApiClient>, handler: Arc<dyn ErrorHandler>) -> Self {
        Self {
            api,
            handler,
            _entity: PhantomData,
        }
    }

    fn item_path(id: &str) -> String {
        format!("{}/{}", E::COLLECTION, id)
    }

    /// Hand a failure to the error handler, then pass the result through.
    fn report<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            tracing::debug!("{} call failed: {e}", E::COLLECTION);
            self.handler.handle(e);
        }
        result
    }

    // ── Reads ────────────────────────────────────────────────────

    pub async fn get(&self, id: &str) -> Result<E, ClientError> {
        let result = self.api.get_json(&Self::item_path(id), &[]).await;
        self.report(result)
    }

    pub async fn query(&self, filter: Option<&QueryFilter>) -> Result<Vec<E>, ClientError> {
        let params = filter.map(QueryFilter::params).unwrap_or_default();
        let result = self.api.get_json(E::COLLECTION, params).await;
        self.report(result)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Create an entity. The server assigns its id.
    pub async fn create(&self, draft: &E::Draft) -> Result<E, ClientError> {
        let result: Result<E, ClientError> = self.api.send_json(Method::POST, E::COLLECTION, draft).await;
        if let Ok(created) = &result {
            tracing::info!("created {} {}", E::COLLECTION, created.id());
        }
        self.report(result)
    }

    /// Push a pending optimistic update.
    ///
    /// On success the server's copy is merged into the local entity and the
    /// update is committed. On failure the snapshot is restored, the error
    /// handler runs, and the error is returned.
    pub async fn update(&self, mutation: &mut OptimisticUpdate<'_, E>) -> Result<E, ClientError> {
        if mutation.state() != MutationState::Pending {
            tracing::warn!(
                "submitting {} {} after it already settled as {:?}",
                E::COLLECTION,
                mutation.entity().id(),
                mutation.state()
            );
        }

        let path = Self::item_path(mutation.entity().id());
        let result: Result<E, ClientError> = self.api.send_json(Method::PUT, &path, mutation.entity()).await;
        match result {
            Ok(canonical) => {
                mutation.commit(canonical);
                Ok(mutation.entity().clone())
            }
            Err(e) => {
                mutation.roll_back();
                self.report(Err(e))
            }
        }
    }

    /// Begin, apply `mutate`, and submit in one step.
    pub async fn update_with(&self, entity: &mut E, mutate: impl FnOnce(&mut E)) -> Result<E, ClientError> {
        let mut mutation = OptimisticUpdate::begin(entity);
        mutation.apply(mutate);
        self.update(&mut mutation).await
    }

    pub async fn remove(&self, entity: &E) -> Result<(), ClientError> {
        let result = self.api.delete(&Self::item_path(entity.id())).await;
        if result.is_ok() {
            tracing::info!("deleted {} {}", E::COLLECTION, entity.id());
        }
        self.report(result)
    }

    /// Delete `id` and drop it from `local` once the server confirms.
    ///
    /// An entity not present in `local` is still deleted remotely.
    pub async fn remove_from(&self, local: &mut Vec<E>, id: &str) -> Result<(), ClientError> {
        let result = self.api.delete(&Self::item_path(id)).await;
        self.report(result)?;
        local.retain(|e| e.id() != id);
        Ok(())
    }
}

impl ResourceClient<User> {
    /// `POST /api/users/:id` with the new password.
    pub async fn change_password(&self, id: &str, password: &str) -> Result<(), ClientError> {
        let result = self.post_password(id, password).await;
        self.report(result)
    }

    /// Same request as [`Self::change_password`], but failures are left to
    /// the caller instead of the error handler.
    pub(crate) async fn post_password(&self, id: &str, password: &str) -> Result<(), ClientError> {
        let body = PasswordChange {
            password: password.to_string(),
        };
        self.api
            .send_discarding(Method::POST, &Self::item_path(id), &body)
            .await
    }
}
