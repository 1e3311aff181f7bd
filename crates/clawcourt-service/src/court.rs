use crate::auth::authenticate;
use crate::{ApiError, Json, ServiceState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use clawcourt_core::{Inquisition, InquisitionStatus, Proposal, ProposeOutcome, VoteChoice};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct InquisitionList {
    inquisitions: Vec<Inquisition>,
}

pub async fn list_active(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<InquisitionList>, ApiError> {
    authenticate(&state, &headers).await?;
    Ok(Json(InquisitionList {
        inquisitions: state.engine.list_active().await,
    }))
}

pub async fn list_approved(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<InquisitionList>, ApiError> {
    authenticate(&state, &headers).await?;
    Ok(Json(InquisitionList {
        inquisitions: state.engine.list_approved().await,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeRequest {
    target_company: String,
    target_description: String,
    moltbook_thread_id: String,
    moltbook_thread_url: String,
}

/// Propose a new Inquisition from a Moltbook thread.
///
/// A thread that already has an Inquisition yields HTTP 200 with
/// `success: false` and the existing record, so agent retries are harmless.
pub async fn propose(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<ProposeRequest>,
) -> Result<Json<Value>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;

    let outcome = state
        .engine
        .propose(Proposal {
            agent_id: ctx.identity.id,
            agent_karma: ctx.identity.karma,
            target_company: request.target_company,
            target_description: request.target_description,
            moltbook_thread_id: request.moltbook_thread_id,
            moltbook_thread_url: request.moltbook_thread_url,
        })
        .await?;

    let body = match outcome {
        ProposeOutcome::Created(inquisition) => {
            let message = if inquisition.status == InquisitionStatus::Approved {
                "Inquisition approved! Email actions are now unlocked.".to_string()
            } else {
                format!(
                    "Inquisition proposed. Need {} more karma to approve.",
                    inquisition.karma_needed()
                )
            };
            serde_json::json!({
                "success": true,
                "id": inquisition.id,
                "status": inquisition.status,
                "targetCompany": inquisition.target_company,
                "karmaForApproval": inquisition.karma_for_approval,
                "karmaNeeded": inquisition.karma_needed(),
                "message": message,
            })
        }
        ProposeOutcome::Duplicate(existing) => serde_json::json!({
            "success": false,
            "error": "Inquisition already exists for this Moltbook thread",
            "inquisition": existing,
        }),
    };
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    inquisition_id: String,
    vote: VoteChoice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    success: bool,
    status: InquisitionStatus,
    karma_for_approval: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    karma_needed: Option<u64>,
    message: String,
}

pub async fn vote(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;

    let outcome = state
        .engine
        .cast_vote(
            &ctx.identity.id,
            ctx.identity.karma,
            &request.inquisition_id,
            request.vote,
        )
        .await?;

    let response = if outcome.status == InquisitionStatus::Approved {
        VoteResponse {
            success: true,
            status: outcome.status,
            karma_for_approval: outcome.karma_for_approval,
            karma_needed: None,
            message: "Inquisition approved! Email actions are now unlocked for this target."
                .to_string(),
        }
    } else {
        VoteResponse {
            success: true,
            status: outcome.status,
            karma_for_approval: outcome.karma_for_approval,
            karma_needed: Some(outcome.karma_needed),
            message: format!(
                "Vote recorded. Need {} more karma to approve.",
                outcome.karma_needed
            ),
        }
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InquisitionDetail {
    #[serde(flatten)]
    inquisition: Inquisition,
    karma_needed: u64,
}

pub async fn get_inquisition(
    State(state): State<ServiceState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<InquisitionDetail>, ApiError> {
    authenticate(&state, &headers).await?;

    let inquisition = state.engine.get(&id).await?;
    let karma_needed = inquisition.karma_needed();
    Ok(Json(InquisitionDetail {
        inquisition,
        karma_needed,
    }))
}
