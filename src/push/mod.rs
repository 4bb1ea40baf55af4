//! Push subscription dispatch
//!
//! The store and transport contracts, the VAPID web-push client, batch
//! dispatch with endpoint-keyed report correlation, and the subscribe /
//! unsubscribe lifecycle.

pub use self::{
    client::WebPushClient,
    dispatch::DispatchEngine,
    store::{SubscriptionFilter, SubscriptionStore},
    transport::PushTransport,
};

mod client;
mod dispatch;
pub mod lifecycle;
mod store;
mod transport;
