use crate::auth::authenticate;
use crate::{ApiError, Json, ServiceState};
use axum::extract::State;
use axum::http::HeaderMap;
use clawcourt_core::{CampaignEntry, CampaignType, EmailCampaign, GovernanceError};
use serde::{Deserialize, Serialize};

// Exactly one `@`, a non-empty local part, and a dot-bearing domain; no
// whitespace anywhere. Deliverability is the mail provider's problem.
fn require_email(field: &str, value: &str) -> Result<(), ApiError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(GovernanceError::validation(field, "must be a valid email address").into());
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(GovernanceError::validation(field, "must not be empty").into());
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    success: bool,
    email_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrOutreachRequest {
    inquisition_id: String,
    target_email: String,
    question: String,
}

/// Send an investor-relations inquiry for an approved Inquisition.
pub async fn ir_outreach(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<IrOutreachRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    require_non_empty("inquisitionId", &request.inquisition_id)?;
    require_email("targetEmail", &request.target_email)?;
    require_non_empty("question", &request.question)?;

    let inquisition = state.gate.require_approved(&request.inquisition_id).await?;

    let subject = format!("Investor Inquiry - {}", inquisition.target_company);
    let body = format!(
        "<p>Dear Investor Relations Team,</p>\n\
         <p>I am conducting research on {} and would appreciate your assistance:</p>\n\
         <p>{}</p>\n\
         <p>Best regards,<br/>Active Investor Collective</p>",
        inquisition.target_company, request.question
    );

    let provider_message_id = state
        .mailer
        .send(&request.target_email, &subject, &body)
        .await?;

    let campaign = state.campaigns.record(CampaignEntry {
        agent_id: ctx.identity.id,
        inquisition_id: request.inquisition_id,
        campaign_type: CampaignType::IrOutreach,
        target_email: request.target_email.clone(),
        target_company: inquisition.target_company.clone(),
        subject,
        body,
        provider_message_id,
    });
    tracing::info!(campaign = %campaign.id, inquisition = %campaign.inquisition_id, "IR outreach sent");

    Ok(Json(SendResponse {
        success: true,
        email_id: campaign.provider_message_id,
        message: Some(format!(
            "IR outreach sent to {} regarding {}",
            request.target_email, inquisition.target_company
        )),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoiaRequest {
    inquisition_id: String,
    target_email: String,
    agency: String,
    request: String,
}

/// Send a FOIA request to a government agency for an approved Inquisition.
pub async fn foia(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<FoiaRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    require_non_empty("inquisitionId", &request.inquisition_id)?;
    require_email("targetEmail", &request.target_email)?;
    require_non_empty("agency", &request.agency)?;
    require_non_empty("request", &request.request)?;

    state.gate.require_approved(&request.inquisition_id).await?;

    let subject = format!("FOIA Request - {}", request.agency);
    let body = format!(
        "<p>Dear FOIA Officer,</p>\n\
         <p>Pursuant to the Freedom of Information Act, I am requesting:</p>\n\
         <p>{}</p>\n\
         <p>Sincerely,<br/>Active Investor Collective</p>",
        request.request
    );

    let provider_message_id = state
        .mailer
        .send(&request.target_email, &subject, &body)
        .await?;

    let campaign = state.campaigns.record(CampaignEntry {
        agent_id: ctx.identity.id,
        inquisition_id: request.inquisition_id,
        campaign_type: CampaignType::Foia,
        target_email: request.target_email,
        target_company: request.agency.clone(),
        subject,
        body,
        provider_message_id,
    });
    tracing::info!(campaign = %campaign.id, agency = %request.agency, "FOIA request sent");

    Ok(Json(SendResponse {
        success: true,
        email_id: campaign.provider_message_id,
        message: Some(format!("FOIA request sent to {}", request.agency)),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    inquisition_id: String,
    campaign_type: CampaignType,
    target_email: String,
    subject: String,
    body: String,
}

/// Send a custom email for an approved Inquisition.
pub async fn send_custom(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    require_non_empty("inquisitionId", &request.inquisition_id)?;
    require_email("targetEmail", &request.target_email)?;
    require_non_empty("subject", &request.subject)?;
    require_non_empty("body", &request.body)?;

    let inquisition = state.gate.require_approved(&request.inquisition_id).await?;

    let provider_message_id = state
        .mailer
        .send(&request.target_email, &request.subject, &request.body)
        .await?;

    let campaign = state.campaigns.record(CampaignEntry {
        agent_id: ctx.identity.id,
        inquisition_id: request.inquisition_id,
        campaign_type: request.campaign_type,
        target_email: request.target_email,
        target_company: inquisition.target_company,
        subject: request.subject,
        body: request.body,
        provider_message_id,
    });

    Ok(Json(SendResponse {
        success: true,
        email_id: campaign.provider_message_id,
        message: None,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    emails: Vec<EmailCampaign>,
}

/// The calling agent's sent campaigns, newest-first.
pub async fn history(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    Ok(Json(HistoryResponse {
        emails: state.campaigns.list_by_agent(&ctx.identity.id),
    }))
}
