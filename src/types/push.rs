//! Push delivery types
//!
//! Wire-level types shared between the dispatch engine and the transport:
//! message headers, payloads, transport descriptors and per-message reports.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, io, str::FromStr};

use crate::error::Error;

use super::SubscriptionData;

#[derive(Debug, Clone)]
pub struct PushHeader {
    pub ttl: i64,
    pub urgency: Urgency,
}

/// Notification payload as handed to the engine. Structured data is
/// serialized to its wire form exactly once per batch; text passes through
/// unchanged.
#[derive(Debug, Clone)]
pub enum PushPayload {
    Text(String),
    Json(Value),
}

impl PushPayload {
    pub fn to_wire(&self) -> String {
        match self {
            PushPayload::Text(text) => text.to_owned(),
            PushPayload::Json(value) => value.to_string(),
        }
    }
}

/// Endpoint plus decoded encryption keys, everything the transport needs to
/// address and encrypt one message.
#[derive(Debug, Clone)]
pub struct PushDescriptor {
    pub endpoint: String,
    pub p256dh: Vec<u8>,
    pub auth: Vec<u8>,
}

impl PushDescriptor {
    /// Parses a stored subscription blob. The blob is opaque everywhere else;
    /// this is the single place it is ever interpreted.
    pub fn from_raw(raw: &str) -> Result<PushDescriptor, Error> {
        let data: SubscriptionData = serde_json::from_str(raw)
            .map_err(|e| Error::MalformedSubscription(e.to_string()))?;

        if data.endpoint.is_empty() {
            return Err(Error::MalformedSubscription(String::from(
                "subscription has no endpoint",
            )));
        }

        let p256dh = BASE64_URL
            .decode(&data.keys.p256dh)
            .map_err(|e| Error::MalformedSubscription(e.to_string()))?;
        let auth = BASE64_URL
            .decode(&data.keys.auth)
            .map_err(|e| Error::MalformedSubscription(e.to_string()))?;

        Ok(PushDescriptor {
            endpoint: data.endpoint,
            p256dh,
            auth,
        })
    }
}

/// Outcome of one delivery attempt. `endpoint` identifies the destination so
/// reports can be matched back to their subscription regardless of order.
#[derive(Debug, Clone)]
pub struct Report {
    pub endpoint: String,
    pub success: bool,
    pub expired: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Urgency {
    VeryLow,
    Low,
    Normal,
    High,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Urgency::VeryLow => write!(f, "very-low"),
            Urgency::Low => write!(f, "low"),
            Urgency::Normal => write!(f, "normal"),
            Urgency::High => write!(f, "high"),
        }
    }
}

impl From<Urgency> for String {
    fn from(value: Urgency) -> Self {
        match value {
            Urgency::VeryLow => String::from("very-low"),
            Urgency::Low => String::from("low"),
            Urgency::Normal => String::from("normal"),
            Urgency::High => String::from("high"),
        }
    }
}

impl FromStr for Urgency {
    type Err = io::Error;

    fn from_str(value: &str) -> Result<Urgency, Self::Err> {
        match value {
            "very-low" => Ok(Urgency::VeryLow),
            "low" => Ok(Urgency::Low),
            "normal" => Ok(Urgency::Normal),
            "high" => Ok(Urgency::High),
            _ => Err(io::Error::other("Urgency not supported")),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub aud: String,
    pub sub: String,
    pub exp: i64,
}
