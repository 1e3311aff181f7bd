#![deny(unsafe_code)]

pub mod auth;
pub mod court;
pub mod email;
pub mod research;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use clawcourt_adapters::{
    StubDocumentParser, StubEmailSender, StubIdentityVerifier, StubResearchProvider,
};
use clawcourt_core::{
    ActionGate, AgentRegistry, CampaignLedger, DocumentParser, EmailSender, FindingStore,
    GateFailure, GovernanceEngine, GovernanceError, IdentityVerifier, InquisitionStore,
    ResearchProvider, DEFAULT_APPROVAL_THRESHOLD,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub approval_threshold: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            approval_threshold: DEFAULT_APPROVAL_THRESHOLD,
        }
    }
}

#[derive(Clone)]
pub struct ServiceState {
    pub registry: Arc<AgentRegistry>,
    pub engine: Arc<GovernanceEngine>,
    pub gate: Arc<ActionGate>,
    pub campaigns: Arc<CampaignLedger>,
    pub findings: Arc<FindingStore>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub mailer: Arc<dyn EmailSender>,
    pub research: Arc<dyn ResearchProvider>,
    pub parser: Arc<dyn DocumentParser>,
}

impl ServiceState {
    /// Wire the service with the deterministic stub collaborators.
    pub fn bootstrap(config: ServiceConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(StubIdentityVerifier),
            Arc::new(StubEmailSender),
            Arc::new(StubResearchProvider),
            Arc::new(StubDocumentParser),
        )
    }

    pub fn with_collaborators(
        config: ServiceConfig,
        verifier: Arc<dyn IdentityVerifier>,
        mailer: Arc<dyn EmailSender>,
        research: Arc<dyn ResearchProvider>,
        parser: Arc<dyn DocumentParser>,
    ) -> Self {
        let store = Arc::new(InquisitionStore::new());
        Self {
            registry: Arc::new(AgentRegistry::new()),
            engine: Arc::new(GovernanceEngine::with_threshold(
                Arc::clone(&store),
                config.approval_threshold,
            )),
            gate: Arc::new(ActionGate::new(store)),
            campaigns: Arc::new(CampaignLedger::new()),
            findings: Arc::new(FindingStore::new()),
            verifier,
            mailer,
            research,
            parser,
        }
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/verify", get(auth::verify))
        .route("/claw-court", get(court::list_active))
        .route("/claw-court/approved", get(court::list_approved))
        .route("/claw-court/propose", post(court::propose))
        .route("/claw-court/vote", post(court::vote))
        .route("/claw-court/:id", get(court::get_inquisition))
        .route("/email/ir-outreach", post(email::ir_outreach))
        .route("/email/foia", post(email::foia))
        .route("/email/send", post(email::send_custom))
        .route("/email/history", get(email::history))
        .route("/research/scrape", post(research::scrape))
        .route("/research/crawl", post(research::crawl))
        .route("/research/search", post(research::search))
        .route("/research/parse-document", post(research::parse_document))
        .route("/research/findings", post(research::save_finding))
        .route("/research/findings/:company", get(research::findings_by_company))
        .with_state(state)
}

/// JSON wrapper whose extraction failures speak the API's error contract.
///
/// A body that fails to parse or is missing fields yields a 400 with the
/// standard `{error}` JSON shape instead of axum's plain-text rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),
    #[error(transparent)]
    Gate(#[from] GateFailure),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        GovernanceError::Validation(rejection.body_text()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Governance(err) => {
                let status = match &err {
                    GovernanceError::MissingToken | GovernanceError::InvalidToken => {
                        StatusCode::UNAUTHORIZED
                    }
                    GovernanceError::NotRegistered => StatusCode::FORBIDDEN,
                    GovernanceError::Validation(_)
                    | GovernanceError::InvalidState { .. }
                    | GovernanceError::AlreadyVoted { .. } => StatusCode::BAD_REQUEST,
                    GovernanceError::InquisitionNotFound => StatusCode::NOT_FOUND,
                    GovernanceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                };
                let mut body = serde_json::json!({ "error": err.to_string() });
                match &err {
                    GovernanceError::NotRegistered => {
                        body["hint"] = serde_json::json!(
                            "Use POST /auth/register with your identity token to join the collective."
                        );
                    }
                    GovernanceError::AlreadyVoted { prior } => {
                        body["yourVote"] = serde_json::json!(prior);
                    }
                    _ => {}
                }
                (status, body)
            }
            ApiError::Gate(err) => match &err {
                GateFailure::NotFound => (
                    StatusCode::NOT_FOUND,
                    serde_json::json!({ "error": err.to_string() }),
                ),
                GateFailure::NotApproved { karma_needed, .. } => (
                    StatusCode::FORBIDDEN,
                    serde_json::json!({ "error": err.to_string(), "karmaNeeded": karma_needed }),
                ),
            },
        };
        (status, axum::Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health(State(_state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "clawcourt-service",
    })
}
