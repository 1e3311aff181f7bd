//! Seams to the outside world. The service wires real or stub implementations
//! behind these traits so the governance core stays free of network concerns.

use crate::error::GovernanceError;
use crate::types::VerifiedIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A page fetched by the research provider, already rendered to markdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    pub url: String,
    pub markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub metadata: Value,
}

/// One search hit from the research provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedChunk {
    pub content: String,
    pub page_number: Option<u32>,
}

/// Output of a document parse job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub job_id: String,
    pub num_pages: u32,
    pub chunks: Vec<ParsedChunk>,
}

/// Resolves bearer tokens to Moltbook identities.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, GovernanceError>;
}

/// Delivers outbound email and returns the provider's message id.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<String, GovernanceError>;
}

/// Fetches and searches public web content on behalf of agents.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, GovernanceError>;

    async fn crawl(&self, url: &str, limit: u32) -> Result<Vec<ScrapeResult>, GovernanceError>;

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, GovernanceError>;
}

/// Extracts text from filings and other documents.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn parse(&self, url: &str) -> Result<ParseResult, GovernanceError>;
}
