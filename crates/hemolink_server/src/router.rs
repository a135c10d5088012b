//! HTTP routes.
//!
//! Every privileged handler runs the same steps in the same order: verify
//! the bearer token, look up the stored role, pass the gate, validate the
//! body, then write. A failure at any step returns before the next one runs,
//! so rejected requests never touch the store.

use crate::error::{ServiceError, ServiceResult};
use crate::input::{
    parse_body, CreateRequestInput, NewUserInput, RegisterDonationInput, UpdateStatusInput,
};
use crate::orchestrator::WriteOrchestrator;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use hemolink_identity::{bearer_token, CallerIdentity, IdentityVerifier, WebhookSecret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Header carrying the shared secret on the new-user webhook.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    orchestrator: WriteOrchestrator,
    identity: Arc<dyn IdentityVerifier>,
    webhook: Option<WebhookSecret>,
}

impl AppState {
    /// Creates handler state.
    pub fn new(
        orchestrator: WriteOrchestrator,
        identity: Arc<dyn IdentityVerifier>,
        webhook: Option<WebhookSecret>,
    ) -> Self {
        Self {
            orchestrator,
            identity,
            webhook,
        }
    }
}

/// Body of every successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
    /// Id of the document the call created, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
        }
    }

    fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

type Reply = ServiceResult<(StatusCode, Json<MessageResponse>)>;

fn ok(status: StatusCode, body: MessageResponse) -> Reply {
    Ok((status, Json(body)))
}

/// A caller whose bearer token has been verified.
#[derive(Debug, Clone)]
pub struct Authenticated(pub CallerIdentity);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ServiceResult<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ServiceError::Unauthenticated("missing Authorization header".into()))?
            .to_str()
            .map_err(|_| {
                ServiceError::Unauthenticated("Authorization header is not valid text".into())
            })?;
        let token = bearer_token(header).map_err(ServiceError::unauthenticated)?;
        let caller = state
            .identity
            .verify(token)
            .await
            .map_err(ServiceError::unauthenticated)?;
        tracing::debug!(uid = %caller.uid, "caller verified");
        Ok(Self(caller))
    }
}

/// Builds the route table over `state`.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/assign-role", post(assign_role))
        .route("/api/handle-new-user", post(handle_new_user))
        .route("/api/create-request", post(create_request))
        .route("/api/requests/", delete(delete_request_without_id))
        .route("/api/requests/:id", delete(delete_request))
        .route("/api/register-donation", post(register_donation))
        .route("/api/update-status", post(update_status))
        .with_state(state)
}

/// Turns a body read failure into an input error after the gate has passed.
fn body_bytes(body: Result<Bytes, BytesRejection>) -> ServiceResult<Bytes> {
    body.map_err(|e| ServiceError::InvalidInput(e.body_text()))
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn assign_role(State(state): State<AppState>, Authenticated(caller): Authenticated) -> Reply {
    let message = match state.orchestrator.assign_default_role(&caller.uid).await? {
        Some(role) => format!("role assigned: {role}"),
        None => "role already assigned".to_string(),
    };
    ok(StatusCode::OK, MessageResponse::new(message))
}

async fn handle_new_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let secret = state
        .webhook
        .as_ref()
        .ok_or_else(|| ServiceError::Unauthenticated("webhook is not configured".into()))?;
    let presented = headers
        .get(WEBHOOK_SECRET_HEADER)
        .ok_or_else(|| ServiceError::Unauthenticated("missing webhook secret".into()))?;
    secret
        .validate(presented.as_bytes())
        .map_err(ServiceError::unauthenticated)?;

    let input = NewUserInput::from_body(&parse_body(&body_bytes(body)?)?)?;
    state.orchestrator.assign_default_role(&input.uid).await?;
    ok(
        StatusCode::OK,
        MessageResponse::new(format!("Successfully assigned role to user {}", input.uid)),
    )
}

async fn create_request(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let grant = state.orchestrator.authorize_staff(&caller).await?;
    let input = CreateRequestInput::from_body(&parse_body(&body_bytes(body)?)?)?;
    let doc = state.orchestrator.create_request(&grant, input).await?;
    ok(
        StatusCode::CREATED,
        MessageResponse::new("blood request created").with_id(doc.id()),
    )
}

async fn delete_request(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> Reply {
    let grant = state.orchestrator.authorize_staff(&caller).await?;
    state.orchestrator.delete_request(&grant, &id).await?;
    ok(StatusCode::OK, MessageResponse::new("blood request deleted"))
}

async fn delete_request_without_id(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
) -> Reply {
    state.orchestrator.authorize_staff(&caller).await?;
    Err(ServiceError::InvalidInput("missing request id".into()))
}

async fn register_donation(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let grant = state.orchestrator.authorize_staff(&caller).await?;
    let input = RegisterDonationInput::from_body(&parse_body(&body_bytes(body)?)?)?;
    let doc = state.orchestrator.register_donation(&grant, input).await?;
    ok(
        StatusCode::CREATED,
        MessageResponse::new("donation registered").with_id(doc.id()),
    )
}

async fn update_status(
    State(state): State<AppState>,
    Authenticated(caller): Authenticated,
    body: Result<Bytes, BytesRejection>,
) -> Reply {
    let grant = state.orchestrator.authorize_staff(&caller).await?;
    let input = UpdateStatusInput::from_body(&parse_body(&body_bytes(body)?)?)?;
    state.orchestrator.update_status(&grant, input).await?;
    ok(StatusCode::OK, MessageResponse::new("status updated"))
}
