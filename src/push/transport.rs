use crate::{
    error::Error,
    types::{PushDescriptor, Report},
};

/// Contract between the dispatch engine and the push transport.
///
/// `flush` returns one report per enqueued message. Each report carries the
/// destination endpoint so callers can match it back to its subscription;
/// report order is unspecified and must never be relied on.
#[allow(async_fn_in_trait)]
pub trait PushTransport {
    /// Reconstructs a transport descriptor from a stored subscription blob.
    fn build_descriptor(&self, raw: &str) -> Result<PushDescriptor, Error> {
        PushDescriptor::from_raw(raw)
    }

    /// Adds one message to the pending batch. No network activity.
    fn enqueue(&mut self, descriptor: PushDescriptor, payload: String);

    /// Sends the pending batch. Per-message transport failures surface as
    /// failed reports, never as batch errors.
    async fn flush(&mut self) -> Vec<Report>;

    /// Synchronous single-message send for interactive test deliveries.
    async fn send_one(
        &self,
        descriptor: &PushDescriptor,
        payload: &str,
    ) -> Result<Report, Error>;
}
