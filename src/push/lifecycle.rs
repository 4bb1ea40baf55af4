use serde_json::Value;
use tracing::info;

use crate::{error::Error, types::Platform};

use super::SubscriptionStore;

/// Registers the descriptor a client presented. Returns false without
/// touching the store when push is administratively disabled or the
/// descriptor carries no endpoint; creation replaces any record already
/// registered for the same endpoint.
pub async fn subscribe<S: SubscriptionStore>(
    store: &S,
    enabled: bool,
    data: &Value,
    owner: Option<&str>,
) -> Result<bool, Error> {
    if !enabled {
        return Ok(false);
    }

    let endpoint = data
        .get("endpoint")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if endpoint.is_empty() {
        return Ok(false);
    }

    store.create(data, owner, Platform::WebPush).await?;
    info!("registered push subscription for {}", endpoint);

    Ok(true)
}

/// Removes the record for `endpoint`. Returns whether one was found.
pub async fn unsubscribe<S: SubscriptionStore>(
    store: &S,
    endpoint: &str,
) -> Result<bool, Error> {
    if endpoint.is_empty() {
        return Ok(false);
    }

    store.delete(endpoint).await
}

/// Cascade removal when the owning identity goes away. True iff at least
/// one record was removed.
pub async fn delete_all_for_owner<S: SubscriptionStore>(
    store: &S,
    owner: &str,
) -> Result<bool, Error> {
    store.delete_for_owner(owner).await
}
