use serde_json::Value;

use crate::{error::Error, model::Subscription, types::Platform};

/// Which subscription records one dispatch call addresses. A fresh dispatch
/// re-queries the store, so the selection always reflects current state.
#[derive(Debug, Clone)]
pub enum SubscriptionFilter {
    All,
    Owner(String),
}

/// Durable store of push subscriptions, keyed by endpoint. Implemented by
/// `Table<Subscription>` over Postgres; tests provide an in-memory version.
#[allow(async_fn_in_trait)]
pub trait SubscriptionStore {
    async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> Result<Option<Subscription>, Error>;

    async fn find_matching(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, Error>;

    /// Creates (or replaces, endpoint being unique) a record from the raw
    /// descriptor the client presented. The descriptor is stored verbatim.
    async fn create(
        &self,
        data: &Value,
        owner: Option<&str>,
        platform: Platform,
    ) -> Result<Subscription, Error>;

    /// Returns whether a record existed and was removed.
    async fn delete(&self, endpoint: &str) -> Result<bool, Error>;

    /// Returns true iff at least one record was removed.
    async fn delete_for_owner(&self, owner: &str) -> Result<bool, Error>;

    /// Persists the call-outcome fields. Safe to call repeatedly.
    async fn save(&self, subscription: &Subscription) -> Result<(), Error>;
}
