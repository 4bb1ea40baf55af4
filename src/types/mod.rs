pub use self::{
    platform::Platform,
    push::{
        Claims, PushDescriptor, PushHeader, PushPayload, Report, Urgency,
    },
    subscription::{SubscriptionData, SubscriptionKeys},
};

mod platform;
mod push;
mod subscription;
