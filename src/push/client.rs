use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Url;
use tokio::sync::Semaphore;

use crate::{
    configuration::Config,
    error::Error,
    provider::HTTP,
    types::{Claims, PushDescriptor, PushHeader, Report, Urgency},
};

use super::PushTransport;

/// Push service status codes meaning the subscription is permanently gone.
const EXPIRED_STATUS: [u16; 2] = [404, 410];

/// VAPID-authenticated web-push transport.
///
/// Construction fails when either key is missing, before any network
/// activity. Messages are encrypted per subscription (`aes128gcm`) and
/// signed with an ES256 token scoped to the endpoint origin.
pub struct WebPushClient {
    key: EncodingKey,
    mail_to: String,
    header: PushHeader,
    max_tasks: usize,
    http: HTTP,
    pending: Vec<(PushDescriptor, String)>,
}

impl WebPushClient {
    pub fn new(config: &Config) -> Result<WebPushClient, Error> {
        if config.vapid_public_key.is_empty()
            || config.vapid_private_key.is_empty()
        {
            return Err(Error::ValidationError(String::from(
                "missing public or private key",
            )));
        }

        let key = EncodingKey::from_ec_pem(&config.vapid_private_key)?;
        let http = HTTP::new(config.clone())?;

        Ok(WebPushClient {
            key,
            mail_to: config.mail_to.to_owned(),
            header: PushHeader {
                ttl: config.push_ttl,
                urgency: Urgency::Normal,
            },
            max_tasks: config.max_tasks,
            http,
            pending: Vec::new(),
        })
    }

    fn vapid_token(&self, endpoint: &Url) -> Result<String, Error> {
        let host = if let Some(h) = endpoint.host() {
            h.to_string()
        } else {
            return Err(Error::MalformedSubscription(format!(
                "endpoint {} has no host",
                endpoint
            )));
        };

        let aud = format!("{}://{}", endpoint.scheme(), host);
        let sub = format!("mailto:{}", &self.mail_to);
        let exp = Utc::now().timestamp() + self.header.ttl;

        let claims = Claims { aud, sub, exp };
        Ok(encode(&Header::new(Algorithm::ES256), &claims, &self.key)?)
    }

    async fn deliver(
        &self,
        descriptor: &PushDescriptor,
        payload: &str,
    ) -> Result<u16, Error> {
        let url = Url::parse(&descriptor.endpoint)?;
        let token = self.vapid_token(&url)?;
        let data =
            ece::encrypt(&descriptor.p256dh, &descriptor.auth, payload.as_bytes())?;

        self.http
            .post_push(
                descriptor.endpoint.to_owned(),
                token,
                self.header.clone(),
                data,
            )
            .await
    }
}

impl PushTransport for WebPushClient {
    fn enqueue(&mut self, descriptor: PushDescriptor, payload: String) {
        self.pending.push((descriptor, payload));
    }

    async fn flush(&mut self) -> Vec<Report> {
        let pending = std::mem::take(&mut self.pending);
        // At most max_tasks requests in flight at once.
        let permits = Arc::new(Semaphore::new(self.max_tasks));
        let client = &*self;

        let sends = pending.into_iter().map(|(descriptor, payload)| {
            let permits = permits.clone();
            async move {
                let _permit = permits.acquire().await.ok();
                match client.send_one(&descriptor, &payload).await {
                    Ok(report) => report,
                    Err(e) => Report {
                        endpoint: descriptor.endpoint,
                        success: false,
                        expired: false,
                        reason: Some(e.to_string()),
                    },
                }
            }
        });

        join_all(sends).await
    }

    async fn send_one(
        &self,
        descriptor: &PushDescriptor,
        payload: &str,
    ) -> Result<Report, Error> {
        let status = self.deliver(descriptor, payload).await?;
        let success = (200..300).contains(&status);

        Ok(Report {
            endpoint: descriptor.endpoint.to_owned(),
            success,
            expired: EXPIRED_STATUS.contains(&status),
            reason: if success {
                None
            } else {
                Some(format!("push service returned status {}", status))
            },
        })
    }
}
