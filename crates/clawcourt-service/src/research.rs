use crate::auth::authenticate;
use crate::{ApiError, Json, ServiceState};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use clawcourt_core::{
    Finding, FindingDraft, FindingType, GovernanceError, ParseResult, ScrapeResult, SearchHit,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_CRAWL_LIMIT: u32 = 50;
const DEFAULT_CRAWL_LIMIT: u32 = 10;
const MAX_SEARCH_LIMIT: u32 = 20;
const DEFAULT_SEARCH_LIMIT: u32 = 5;

fn require_url(field: &str, value: &str) -> Result<(), ApiError> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    if !matches!(rest, Some(host) if !host.is_empty()) {
        return Err(GovernanceError::validation(field, "must be a valid http(s) URL").into());
    }
    Ok(())
}

fn bounded_limit(
    field: &str,
    requested: Option<u32>,
    default: u32,
    max: u32,
) -> Result<u32, ApiError> {
    let limit = requested.unwrap_or(default);
    if limit == 0 || limit > max {
        return Err(GovernanceError::Validation(format!(
            "{field} must be between 1 and {max}"
        ))
        .into());
    }
    Ok(limit)
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    url: String,
}

pub async fn scrape(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResult>, ApiError> {
    authenticate(&state, &headers).await?;
    require_url("url", &request.url)?;
    Ok(Json(state.research.scrape(&request.url).await?))
}

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    url: String,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CrawlResponse {
    pages: Vec<ScrapeResult>,
}

pub async fn crawl(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, ApiError> {
    authenticate(&state, &headers).await?;
    require_url("url", &request.url)?;
    let limit = bounded_limit("limit", request.limit, DEFAULT_CRAWL_LIMIT, MAX_CRAWL_LIMIT)?;
    Ok(Json(CrawlResponse {
        pages: state.research.crawl(&request.url, limit).await?,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    query: String,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    results: Vec<SearchHit>,
}

pub async fn search(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    authenticate(&state, &headers).await?;
    if request.query.trim().is_empty() {
        return Err(GovernanceError::validation("query", "must not be empty").into());
    }
    let limit = bounded_limit(
        "limit",
        request.limit,
        DEFAULT_SEARCH_LIMIT,
        MAX_SEARCH_LIMIT,
    )?;
    Ok(Json(SearchResponse {
        results: state.research.search(&request.query, limit).await?,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    document_url: String,
}

pub async fn parse_document(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResult>, ApiError> {
    authenticate(&state, &headers).await?;
    require_url("documentUrl", &request.document_url)?;
    Ok(Json(state.parser.parse(&request.document_url).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFindingRequest {
    target_company: String,
    target_ticker: Option<String>,
    finding_type: FindingType,
    title: String,
    summary: String,
    source_url: String,
    #[serde(default)]
    raw_data: Value,
}

#[derive(Debug, Serialize)]
pub struct SaveFindingResponse {
    success: bool,
    finding: Finding,
}

pub async fn save_finding(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(request): Json<SaveFindingRequest>,
) -> Result<Json<SaveFindingResponse>, ApiError> {
    let ctx = authenticate(&state, &headers).await?;
    if request.target_company.trim().is_empty() {
        return Err(GovernanceError::validation("targetCompany", "must not be empty").into());
    }

    let finding = state.findings.save(FindingDraft {
        agent_id: ctx.identity.id,
        target_company: request.target_company,
        target_ticker: request.target_ticker,
        finding_type: request.finding_type,
        title: request.title,
        summary: request.summary,
        source_url: request.source_url,
        raw_data: request.raw_data,
    });

    Ok(Json(SaveFindingResponse {
        success: true,
        finding,
    }))
}

#[derive(Debug, Serialize)]
pub struct FindingsResponse {
    findings: Vec<Finding>,
}

pub async fn findings_by_company(
    State(state): State<ServiceState>,
    Path(company): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FindingsResponse>, ApiError> {
    authenticate(&state, &headers).await?;
    Ok(Json(FindingsResponse {
        findings: state.findings.find_by_company(&company),
    }))
}
