use actix_web::{get, web, HttpResponse, Result};
use serde::{Deserialize, Serialize};

use crate::{
    configuration::{AppState, State},
    error::Error,
};

/// The browser needs the VAPID public key as `applicationServerKey` for its
/// own `pushManager.subscribe` call; the service worker fetches it here.
#[get("/push-key")]
pub async fn index(
    state: web::Data<AppState<State>>,
) -> Result<HttpResponse, Error> {
    if state.config.vapid_public_key.is_empty() {
        return Err(Error::ConfigurationError(String::from(
            "push public key not configured",
        )));
    }

    let key = String::from_utf8(state.config.vapid_public_key.clone())
        .map_err(|_| {
            Error::ConfigurationError(String::from("invalid push public key"))
        })?;

    Ok(HttpResponse::Ok().json(Response {
        key: key.trim().to_owned(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub key: String,
}
