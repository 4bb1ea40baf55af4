use actix_web::{get, post, web, HttpResponse, Result};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    configuration::{AppState, State},
    error::Error,
    push::{DispatchEngine, SubscriptionFilter, WebPushClient},
    types::PushPayload,
};

/// Admin batch dispatch: one message to every matching subscription.
#[post("/send-push")]
pub async fn index(
    state: web::Data<AppState<State>>,
    data: web::Json<SendRequest>,
) -> Result<HttpResponse, Error> {
    if data.auth != state.config.auth {
        return Ok(HttpResponse::Unauthorized()
            .json(SendResponse { processed: 0 }));
    }

    let filter = match &data.owner {
        Some(owner) => SubscriptionFilter::Owner(owner.to_owned()),
        None => SubscriptionFilter::All,
    };

    let payload = match &data.payload {
        Value::String(text) => PushPayload::Text(text.to_owned()),
        value => PushPayload::Json(value.clone()),
    };

    let mut client = WebPushClient::new(&state.config)?;
    let mut engine =
        DispatchEngine::new(&state.database.subscription, &mut client);
    let processed = engine.dispatch_to(&filter, &payload).await?;

    Ok(HttpResponse::Ok().json(SendResponse { processed }))
}

/// Interactive test send to one stored subscription; the delivery outcome
/// is surfaced directly instead of being written to the record.
#[get("/test-push")]
pub async fn test(
    state: web::Data<AppState<State>>,
    data: web::Query<TestQuery>,
) -> Result<HttpResponse, Error> {
    let auth = data.auth.to_owned().context("Auth is required")?;

    if auth != state.config.auth {
        return Ok(HttpResponse::Unauthorized()
            .json(TestResponse { sent: false }));
    }

    let subscription = state
        .database
        .subscription
        .get_by_endpoint(&data.endpoint)
        .await?
        .ok_or_else(|| {
            Error::ValidationError(format!(
                "no subscription for endpoint {}",
                &data.endpoint
            ))
        })?;

    let payload = PushPayload::Text(format!(
        "Test at {}",
        Utc::now().format("%d/%m/%Y %H:%M:%S")
    ));

    let mut client = WebPushClient::new(&state.config)?;
    let engine =
        DispatchEngine::new(&state.database.subscription, &mut client);
    let report = engine.dispatch_one(&subscription, &payload).await?;

    Ok(HttpResponse::Ok().json(TestResponse {
        sent: report.success,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub auth: String,
    pub owner: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendResponse {
    pub processed: usize,
}

#[derive(Debug, Deserialize)]
pub struct TestQuery {
    auth: Option<String>,
    endpoint: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TestResponse {
    pub sent: bool,
}
