use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::Platform;

/// One browser push channel. `subscription` holds the raw JSON blob the
/// client presented at subscribe time (endpoint plus encryption keys); it is
/// only ever parsed when a transport descriptor is built from it.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub endpoint: String,
    pub subscription: String,
    pub platform: String,
    pub owner: Option<String>,
    pub last_called_at: Option<DateTime<Utc>>,
    pub last_call_failed: bool,
    pub last_failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn platform(&self) -> Platform {
        Platform::from(self.platform.as_str())
    }
}
