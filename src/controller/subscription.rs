use actix_web::{post, web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    configuration::{AppState, State},
    error::Error,
    push::lifecycle,
};

#[post("/add-subscription")]
pub async fn add(
    state: web::Data<AppState<State>>,
    data: web::Json<Value>,
) -> Result<HttpResponse, Error> {
    let success = lifecycle::subscribe(
        &state.database.subscription,
        state.config.push_enabled,
        &data,
        None,
    )
    .await?;

    Ok(HttpResponse::Ok().json(Response { success }))
}

#[post("/remove-subscription")]
pub async fn remove(
    state: web::Data<AppState<State>>,
    data: web::Json<RemoveRequest>,
) -> Result<HttpResponse, Error> {
    let success = if state.config.push_enabled {
        lifecycle::unsubscribe(&state.database.subscription, &data.endpoint)
            .await?
    } else {
        false
    };

    Ok(HttpResponse::Ok().json(Response { success }))
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
}
