use crate::{ApiError, Json, ServiceState};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use clawcourt_core::{Agent, AuthContext, GovernanceError};
use serde::{Deserialize, Serialize};

pub const IDENTITY_HEADER: &str = "x-moltbook-identity";

/// Resolve the caller to a registered agent plus their fresh Moltbook identity.
///
/// Verification happens on every call; karma is always the verifier's current
/// value, never the cached registry copy. Verifier I/O runs before any store
/// lock is taken.
pub async fn authenticate(
    state: &ServiceState,
    headers: &HeaderMap,
) -> Result<AuthContext, ApiError> {
    let token = headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(GovernanceError::MissingToken)?;

    let identity = state.verifier.verify(token).await?;
    let agent = state
        .registry
        .find_by_identity(&identity.id)
        .await
        .ok_or(GovernanceError::NotRegistered)?;
    state.registry.touch_activity(&identity.id).await;

    Ok(AuthContext { agent, identity })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    identity_token: String,
}

#[derive(Debug, Serialize)]
pub struct AgentSummary {
    id: String,
    name: String,
    karma: u64,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    success: bool,
    agent: AgentSummary,
    message: &'static str,
}

/// Register (or refresh) the calling agent. Re-registration updates name and
/// karma but keeps the original registration date and call counter.
pub async fn register(
    State(state): State<ServiceState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if request.identity_token.trim().is_empty() {
        return Err(GovernanceError::validation("identityToken", "is required").into());
    }

    let identity = state.verifier.verify(&request.identity_token).await?;
    let now = Utc::now();

    let (agent, message) = match state.registry.find_by_identity(&identity.id).await {
        Some(mut agent) => {
            agent.moltbook_name = identity.name.clone();
            agent.karma = identity.karma;
            agent.last_active_at = now;
            (agent, "Welcome back to the collective!")
        }
        None => (
            Agent {
                moltbook_id: identity.id.clone(),
                moltbook_name: identity.name.clone(),
                karma: identity.karma,
                registered_at: now,
                last_active_at: now,
                api_call_count: 0,
            },
            "Welcome to the Active Investor collective! You are now registered.",
        ),
    };
    state.registry.upsert(agent).await;
    tracing::info!(agent = %identity.id, karma = identity.karma, "agent registered");

    Ok(Json(RegisterResponse {
        success: true,
        agent: AgentSummary {
            id: identity.id,
            name: identity.name,
            karma: identity.karma,
        },
        message,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedAgent {
    id: String,
    name: String,
    karma: u64,
    registered_at: chrono::DateTime<Utc>,
    api_call_count: u64,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    valid: bool,
    agent: VerifiedAgent,
}

/// Report whether the caller's token maps to a registered agent.
pub async fn verify(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(GovernanceError::MissingToken)?;

    let identity = state.verifier.verify(token).await?;
    let Some(agent) = state.registry.find_by_identity(&identity.id).await else {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "valid": false,
                "error": "Agent not registered with Active Investor",
            })),
        )
            .into_response());
    };

    Ok(Json(VerifyResponse {
        valid: true,
        agent: VerifiedAgent {
            id: agent.moltbook_id,
            name: agent.moltbook_name,
            karma: agent.karma,
            registered_at: agent.registered_at,
            api_call_count: agent.api_call_count,
        },
    })
    .into_response())
}
