use std::collections::HashMap;

use chrono::Utc;
use tracing::{error, info};

use crate::{
    error::Error,
    model::Subscription,
    types::{Platform, PushPayload, Report},
};

use super::{PushTransport, SubscriptionFilter, SubscriptionStore};

/// Batch dispatch over a subscription store and a push transport.
///
/// One engine invocation is one logical dispatch: it queues a message per
/// matching record, flushes the batch, and reconciles each report back to
/// its record by endpoint. Nothing is deduplicated across invocations;
/// delivery is at-most-once per call.
pub struct DispatchEngine<'a, S, T> {
    store: &'a S,
    transport: &'a mut T,
}

impl<'a, S, T> DispatchEngine<'a, S, T>
where
    S: SubscriptionStore,
    T: PushTransport,
{
    pub fn new(store: &'a S, transport: &'a mut T) -> DispatchEngine<'a, S, T> {
        DispatchEngine { store, transport }
    }

    /// Sends `payload` to every matching webpush subscription and records
    /// the per-subscription outcome. Returns the number of subscriptions a
    /// message was queued for.
    ///
    /// A record whose stored blob cannot produce a transport descriptor is
    /// marked failed and skipped; it does not abort the batch and is not
    /// counted. Reports are matched strictly by endpoint — a report with no
    /// pending record is an invariant violation and fails the call.
    pub async fn dispatch_to(
        &mut self,
        filter: &SubscriptionFilter,
        payload: &PushPayload,
    ) -> Result<usize, Error> {
        let subs = self.store.find_matching(filter).await?;
        let wire = payload.to_wire();

        let mut pending: HashMap<String, Subscription> = HashMap::new();
        let mut processed = 0;

        for mut sub in subs {
            match sub.platform() {
                Platform::WebPush | Platform::Unset => {},
                Platform::Firebase | Platform::Apn => continue,
            }

            let descriptor =
                match self.transport.build_descriptor(&sub.subscription) {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        error!(
                            "subscription {} has unusable payload: {}",
                            &sub.endpoint, e
                        );
                        sub.last_call_failed = true;
                        sub.last_failure_reason = Some(e.to_string());
                        sub.last_called_at = Some(Utc::now());
                        self.store.save(&sub).await?;
                        continue;
                    },
                };

            self.transport.enqueue(descriptor.clone(), wire.to_owned());
            pending.insert(descriptor.endpoint, sub);
            processed += 1;
        }

        if pending.is_empty() {
            return Ok(processed);
        }

        for report in self.transport.flush().await {
            let mut sub = pending
                .remove(&report.endpoint)
                .ok_or_else(|| Error::CorrelationError(report.endpoint.to_owned()))?;

            sub.last_call_failed = !report.success;
            sub.last_failure_reason = if report.success {
                None
            } else {
                report.reason.clone()
            };
            sub.last_called_at = Some(Utc::now());

            self.store.save(&sub).await?;
        }

        info!("dispatched push batch, {} processed", processed);

        Ok(processed)
    }

    /// Immediate single send, used by the interactive test action. Unlike
    /// batch dispatch the outcome is surfaced to the caller directly and
    /// the record's call-tracking fields are left alone.
    pub async fn dispatch_one(
        &self,
        subscription: &Subscription,
        payload: &PushPayload,
    ) -> Result<Report, Error> {
        match subscription.platform() {
            Platform::WebPush | Platform::Unset => {},
            Platform::Firebase | Platform::Apn => {
                return Err(Error::NotWebPush(
                    subscription.endpoint.to_owned(),
                ));
            },
        }

        let descriptor =
            self.transport.build_descriptor(&subscription.subscription)?;
        let report =
            self.transport.send_one(&descriptor, &payload.to_wire()).await?;

        if report.expired {
            return Err(Error::SubscriptionExpired(
                subscription.endpoint.to_owned(),
            ));
        }
        if !report.success {
            return Err(Error::DeliveryError(
                report
                    .reason
                    .to_owned()
                    .unwrap_or_else(|| String::from("unknown reason")),
            ));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::push::store::memory::MemoryStore;
    use crate::types::PushDescriptor;

    #[derive(Debug, Clone, Default)]
    struct Outcome {
        success: bool,
        expired: bool,
        reason: Option<String>,
    }

    /// Scripted transport: outcomes keyed by endpoint, everything else
    /// succeeds. `reverse` hands reports back in reverse-of-enqueue order.
    #[derive(Default)]
    struct StubTransport {
        outcomes: HashMap<String, Outcome>,
        queued: Vec<(PushDescriptor, String)>,
        seen_payloads: Vec<String>,
        flush_calls: usize,
        reverse: bool,
        rogue_endpoint: Option<String>,
    }

    impl StubTransport {
        fn fail(&mut self, endpoint: &str, reason: &str) {
            self.outcomes.insert(
                endpoint.to_owned(),
                Outcome {
                    success: false,
                    expired: false,
                    reason: Some(reason.to_owned()),
                },
            );
        }

        fn expire(&mut self, endpoint: &str) {
            self.outcomes.insert(
                endpoint.to_owned(),
                Outcome {
                    success: false,
                    expired: true,
                    reason: Some(String::from("gone")),
                },
            );
        }

        fn report_for(&self, endpoint: &str) -> Report {
            let outcome = self
                .outcomes
                .get(endpoint)
                .cloned()
                .unwrap_or(Outcome {
                    success: true,
                    expired: false,
                    reason: None,
                });
            Report {
                endpoint: endpoint.to_owned(),
                success: outcome.success,
                expired: outcome.expired,
                reason: outcome.reason,
            }
        }
    }

    impl PushTransport for StubTransport {
        fn enqueue(&mut self, descriptor: PushDescriptor, payload: String) {
            self.seen_payloads.push(payload.to_owned());
            self.queued.push((descriptor, payload));
        }

        async fn flush(&mut self) -> Vec<Report> {
            self.flush_calls += 1;
            let queued = std::mem::take(&mut self.queued);
            let mut reports: Vec<Report> = queued
                .iter()
                .map(|(descriptor, _)| self.report_for(&descriptor.endpoint))
                .collect();
            if self.reverse {
                reports.reverse();
            }
            if let Some(endpoint) = &self.rogue_endpoint {
                reports.push(self.report_for(endpoint));
            }
            reports
        }

        async fn send_one(
            &self,
            descriptor: &PushDescriptor,
            _payload: &str,
        ) -> Result<Report, Error> {
            Ok(self.report_for(&descriptor.endpoint))
        }
    }

    fn raw_subscription(endpoint: &str) -> String {
        json!({
            "endpoint": endpoint,
            "expirationTime": null,
            "keys": {"p256dh": "QUFBQUFB", "auth": "YXV0aA"}
        })
        .to_string()
    }

    fn subscription(endpoint: &str, platform: &str) -> Subscription {
        Subscription {
            endpoint: endpoint.to_owned(),
            subscription: raw_subscription(endpoint),
            platform: platform.to_owned(),
            owner: None,
            last_called_at: None,
            last_call_failed: false,
            last_failure_reason: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_empty_matching_set() {
        let store = MemoryStore::default();
        let mut transport = StubTransport::default();

        let mut engine = DispatchEngine::new(&store, &mut transport);
        let processed = engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        assert_eq!(processed, 0);
        assert_eq!(transport.flush_calls, 0, "no transport call expected");
        assert!(transport.queued.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_skips_foreign_platforms() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));
        store.push(subscription("https://push.example/b", "firebase"));
        store.push(subscription("https://push.example/c", ""));

        let mut transport = StubTransport::default();
        let mut engine = DispatchEngine::new(&store, &mut transport);
        let processed = engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        assert_eq!(processed, 2);

        // The skipped record's call fields stay untouched.
        let skipped = store.get("https://push.example/b").unwrap();
        assert!(skipped.last_called_at.is_none());
        assert!(!skipped.last_call_failed);
    }

    #[tokio::test]
    async fn test_dispatch_records_failure_and_success() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));
        store.push(subscription("https://push.example/b", "webpush"));
        store.push(subscription("https://push.example/c", "webpush"));

        let mut transport = StubTransport::default();
        transport.fail("https://push.example/b", "quota exceeded");

        let mut engine = DispatchEngine::new(&store, &mut transport);
        let processed = engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        assert_eq!(processed, 3);

        let failed = store.get("https://push.example/b").unwrap();
        assert!(failed.last_call_failed);
        assert_eq!(
            failed.last_failure_reason.as_deref(),
            Some("quota exceeded")
        );

        for endpoint in ["https://push.example/a", "https://push.example/c"] {
            let ok = store.get(endpoint).unwrap();
            assert!(!ok.last_call_failed);
            assert!(ok.last_failure_reason.is_none());
            assert!(ok.last_called_at.is_some());
        }
        assert!(store.get("https://push.example/b").unwrap().last_called_at.is_some());
    }

    #[tokio::test]
    async fn test_correlation_keyed_by_endpoint_not_position() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));
        store.push(subscription("https://push.example/b", "webpush"));
        store.push(subscription("https://push.example/c", "webpush"));

        let mut transport = StubTransport {
            reverse: true,
            ..Default::default()
        };
        transport.fail("https://push.example/b", "expired");

        let mut engine = DispatchEngine::new(&store, &mut transport);
        engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        // Reordered reports must still land on the right records.
        assert!(store.get("https://push.example/b").unwrap().last_call_failed);
        assert!(!store.get("https://push.example/a").unwrap().last_call_failed);
        assert!(!store.get("https://push.example/c").unwrap().last_call_failed);
    }

    #[tokio::test]
    async fn test_unmatched_report_is_correlation_error() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));

        let mut transport = StubTransport {
            rogue_endpoint: Some(String::from("https://push.example/ghost")),
            ..Default::default()
        };

        let mut engine = DispatchEngine::new(&store, &mut transport);
        let result = engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await;

        assert!(matches!(result, Err(Error::CorrelationError(_))));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_isolated() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));
        let mut broken = subscription("https://push.example/b", "webpush");
        broken.subscription = String::from("not json at all");
        store.push(broken);

        let mut transport = StubTransport::default();
        let mut engine = DispatchEngine::new(&store, &mut transport);
        let processed = engine
            .dispatch_to(
                &SubscriptionFilter::All,
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        // The broken record never reaches the transport but is marked.
        assert_eq!(processed, 1);
        let broken = store.get("https://push.example/b").unwrap();
        assert!(broken.last_call_failed);
        assert!(broken.last_failure_reason.is_some());
        assert!(broken.last_called_at.is_some());

        let ok = store.get("https://push.example/a").unwrap();
        assert!(!ok.last_call_failed);
        assert!(ok.last_called_at.is_some());
    }

    #[tokio::test]
    async fn test_payload_serialized_once_for_all_messages() {
        let store = MemoryStore::default();
        store.push(subscription("https://push.example/a", "webpush"));
        store.push(subscription("https://push.example/b", "webpush"));

        let mut transport = StubTransport::default();
        let payload = PushPayload::Json(json!({"title": "News", "badge": 3}));
        let wire = payload.to_wire();

        {
            let mut engine = DispatchEngine::new(&store, &mut transport);
            engine
                .dispatch_to(&SubscriptionFilter::All, &payload)
                .await
                .unwrap();
        }

        assert_eq!(transport.flush_calls, 1);
        assert_eq!(transport.seen_payloads.len(), 2);
        for queued_payload in &transport.seen_payloads {
            assert_eq!(queued_payload, &wire);
        }
    }

    #[tokio::test]
    async fn test_subscribe_then_dispatch_scenario() {
        let store = MemoryStore::default();
        store
            .create(
                &json!({
                    "endpoint": "https://push.example/e1",
                    "expirationTime": null,
                    "keys": {"p256dh": "QUFBQUFB", "auth": "YXV0aA"}
                }),
                None,
                Platform::WebPush,
            )
            .await
            .unwrap();

        let mut transport = StubTransport::default();
        {
            let mut engine = DispatchEngine::new(&store, &mut transport);
            let processed = engine
                .dispatch_to(
                    &SubscriptionFilter::All,
                    &PushPayload::Text(String::from("hello")),
                )
                .await
                .unwrap();
            assert_eq!(processed, 1);
        }
        assert!(!store.get("https://push.example/e1").unwrap().last_call_failed);

        let mut transport = StubTransport::default();
        transport.fail("https://push.example/e1", "expired");
        {
            let mut engine = DispatchEngine::new(&store, &mut transport);
            engine
                .dispatch_to(
                    &SubscriptionFilter::All,
                    &PushPayload::Text(String::from("hello")),
                )
                .await
                .unwrap();
        }

        let sub = store.get("https://push.example/e1").unwrap();
        assert!(sub.last_call_failed);
        assert_eq!(sub.last_failure_reason.as_deref(), Some("expired"));
    }

    #[tokio::test]
    async fn test_dispatch_one_rejects_foreign_platform() {
        let store = MemoryStore::default();
        let mut transport = StubTransport::default();
        let sub = subscription("https://push.example/a", "apn");

        let engine = DispatchEngine::new(&store, &mut transport);
        let result = engine
            .dispatch_one(&sub, &PushPayload::Text(String::from("test")))
            .await;

        assert!(matches!(result, Err(Error::NotWebPush(_))));
    }

    #[tokio::test]
    async fn test_dispatch_one_maps_expiry_and_failure() {
        let store = MemoryStore::default();
        let sub = subscription("https://push.example/a", "webpush");

        let mut transport = StubTransport::default();
        transport.expire("https://push.example/a");
        {
            let engine = DispatchEngine::new(&store, &mut transport);
            let result = engine
                .dispatch_one(&sub, &PushPayload::Text(String::from("test")))
                .await;
            assert!(matches!(result, Err(Error::SubscriptionExpired(_))));
        }

        let mut transport = StubTransport::default();
        transport.fail("https://push.example/a", "bad request");
        {
            let engine = DispatchEngine::new(&store, &mut transport);
            let result = engine
                .dispatch_one(&sub, &PushPayload::Text(String::from("test")))
                .await;
            match result {
                Err(Error::DeliveryError(reason)) => {
                    assert_eq!(reason, "bad request")
                },
                other => panic!("expected DeliveryError, got {:?}", other),
            }
        }

        let mut transport = StubTransport::default();
        {
            let engine = DispatchEngine::new(&store, &mut transport);
            let report = engine
                .dispatch_one(&sub, &PushPayload::Text(String::from("test")))
                .await
                .unwrap();
            assert!(report.success);
            assert_eq!(report.endpoint, "https://push.example/a");
        }
    }

    #[tokio::test]
    async fn test_owner_filter_limits_selection() {
        let store = MemoryStore::default();
        let mut a = subscription("https://push.example/a", "webpush");
        a.owner = Some(String::from("member-1"));
        let mut b = subscription("https://push.example/b", "webpush");
        b.owner = Some(String::from("member-2"));
        store.push(a);
        store.push(b);

        let mut transport = StubTransport::default();
        let mut engine = DispatchEngine::new(&store, &mut transport);
        let processed = engine
            .dispatch_to(
                &SubscriptionFilter::Owner(String::from("member-1")),
                &PushPayload::Text(String::from("hello")),
            )
            .await
            .unwrap();

        assert_eq!(processed, 1);
        assert!(store.get("https://push.example/a").unwrap().last_called_at.is_some());
        assert!(store.get("https://push.example/b").unwrap().last_called_at.is_none());
    }
}
