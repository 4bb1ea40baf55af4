use std::{fmt, io, str::FromStr};

/// Delivery platform a subscription was registered for. Only `WebPush` (and
/// the legacy `Unset` default) can be handed to the web-push transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unset,
    WebPush,
    Firebase,
    Apn,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Platform::Unset => write!(f, ""),
            Platform::WebPush => write!(f, "webpush"),
            Platform::Firebase => write!(f, "firebase"),
            Platform::Apn => write!(f, "apn"),
        }
    }
}

impl From<Platform> for String {
    fn from(value: Platform) -> Self {
        match value {
            Platform::Unset => String::new(),
            Platform::WebPush => String::from("webpush"),
            Platform::Firebase => String::from("firebase"),
            Platform::Apn => String::from("apn"),
        }
    }
}

impl FromStr for Platform {
    type Err = io::Error;

    fn from_str(value: &str) -> Result<Platform, Self::Err> {
        match value {
            "" => Ok(Platform::Unset),
            "webpush" => Ok(Platform::WebPush),
            "firebase" => Ok(Platform::Firebase),
            "apn" => Ok(Platform::Apn),
            _ => Err(io::Error::other("Platform not supported")),
        }
    }
}

// Column values are constrained by the schema CHECK; anything else is
// treated as the legacy unset default.
impl From<&str> for Platform {
    fn from(value: &str) -> Platform {
        match value {
            "webpush" => Platform::WebPush,
            "firebase" => Platform::Firebase,
            "apn" => Platform::Apn,
            _ => Platform::Unset,
        }
    }
}
