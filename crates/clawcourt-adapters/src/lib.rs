//! Collaborator adapters for the Claw Court service.
//!
//! Every adapter here is a deterministic stand-in for an external provider,
//! suitable for local runs and tests. Real Moltbook, email, and research
//! integrations implement the same traits from `clawcourt-core`.

#![deny(unsafe_code)]

use async_trait::async_trait;
use clawcourt_core::{
    DocumentParser, EmailSender, GovernanceError, IdentityVerifier, ParseResult, ParsedChunk,
    ResearchProvider, ScrapeResult, SearchHit, VerifiedIdentity,
};
use serde_json::json;
use uuid::Uuid;

/// Fixture identities recognized by the stub verifier.
const KNOWN_IDENTITIES: &[(&str, &str, &str, u64)] = &[
    ("test-valid-moltbook-token", "agent-001", "TestBot Alpha", 500),
    ("second-agent-token", "agent-002", "TestBot Beta", 750),
    ("high-karma-agent-token", "agent-003", "HighKarma Bot", 2000),
    ("unregistered-agent-token", "agent-005", "UnregisteredBot", 100),
];

/// Resolves a fixed table of test tokens to Moltbook identities.
#[derive(Debug, Clone, Default)]
pub struct StubIdentityVerifier;

#[async_trait]
impl IdentityVerifier for StubIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, GovernanceError> {
        KNOWN_IDENTITIES
            .iter()
            .find(|(known, _, _, _)| *known == token)
            .map(|(_, id, name, karma)| VerifiedIdentity {
                id: (*id).to_string(),
                name: (*name).to_string(),
                karma: *karma,
            })
            .ok_or(GovernanceError::InvalidToken)
    }
}

/// Accepts every email and mints a synthetic provider message id.
#[derive(Debug, Clone, Default)]
pub struct StubEmailSender;

#[async_trait]
impl EmailSender for StubEmailSender {
    async fn send(
        &self,
        _to: &str,
        _subject: &str,
        _html_body: &str,
    ) -> Result<String, GovernanceError> {
        Ok(format!("stub-{}", Uuid::new_v4()))
    }
}

/// Serves canned pages and search hits derived from the request.
#[derive(Debug, Clone, Default)]
pub struct StubResearchProvider;

fn stub_page(url: &str) -> ScrapeResult {
    ScrapeResult {
        url: url.to_string(),
        markdown: format!("# Fetched page\n\nContent scraped from {url}."),
        html: None,
        metadata: json!({ "sourceUrl": url, "statusCode": 200 }),
    }
}

#[async_trait]
impl ResearchProvider for StubResearchProvider {
    async fn scrape(&self, url: &str) -> Result<ScrapeResult, GovernanceError> {
        Ok(stub_page(url))
    }

    async fn crawl(&self, url: &str, limit: u32) -> Result<Vec<ScrapeResult>, GovernanceError> {
        Ok((0..limit)
            .map(|n| stub_page(&format!("{url}/page-{n}")))
            .collect())
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, GovernanceError> {
        Ok((0..limit)
            .map(|n| SearchHit {
                title: format!("Result {} for '{query}'", n + 1),
                url: format!("https://results.example/{}/{}", query.replace(' ', "-"), n),
                description: format!("Canned search hit {} matching '{query}'.", n + 1),
            })
            .collect())
    }
}

/// Returns a single-chunk parse for any document URL.
#[derive(Debug, Clone, Default)]
pub struct StubDocumentParser;

#[async_trait]
impl DocumentParser for StubDocumentParser {
    async fn parse(&self, url: &str) -> Result<ParseResult, GovernanceError> {
        Ok(ParseResult {
            job_id: format!("parse-{}", Uuid::new_v4()),
            num_pages: 1,
            chunks: vec![ParsedChunk {
                content: format!("Extracted text from {url}."),
                page_number: Some(1),
            }],
        })
    }
}

/// Collaborator that refuses every call, useful for upstream-failure tests.
#[derive(Debug, Clone)]
pub struct AlwaysFailProvider {
    service: &'static str,
    reason: String,
}

impl AlwaysFailProvider {
    pub fn new(service: &'static str, reason: impl Into<String>) -> Self {
        Self {
            service,
            reason: reason.into(),
        }
    }

    fn refuse<T>(&self) -> Result<T, GovernanceError> {
        Err(GovernanceError::upstream(self.service, self.reason.clone()))
    }
}

#[async_trait]
impl EmailSender for AlwaysFailProvider {
    async fn send(
        &self,
        _to: &str,
        _subject: &str,
        _html_body: &str,
    ) -> Result<String, GovernanceError> {
        self.refuse()
    }
}

#[async_trait]
impl ResearchProvider for AlwaysFailProvider {
    async fn scrape(&self, _url: &str) -> Result<ScrapeResult, GovernanceError> {
        self.refuse()
    }

    async fn crawl(&self, _url: &str, _limit: u32) -> Result<Vec<ScrapeResult>, GovernanceError> {
        self.refuse()
    }

    async fn search(&self, _query: &str, _limit: u32) -> Result<Vec<SearchHit>, GovernanceError> {
        self.refuse()
    }
}

#[async_trait]
impl DocumentParser for AlwaysFailProvider {
    async fn parse(&self, _url: &str) -> Result<ParseResult, GovernanceError> {
        self.refuse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verifier_resolves_known_tokens() {
        let verifier = StubIdentityVerifier;
        let identity = verifier.verify("test-valid-moltbook-token").await.unwrap();
        assert_eq!(identity.id, "agent-001");
        assert_eq!(identity.name, "TestBot Alpha");
        assert_eq!(identity.karma, 500);

        let high = verifier.verify("high-karma-agent-token").await.unwrap();
        assert_eq!(high.karma, 2000);
    }

    #[tokio::test]
    async fn verifier_rejects_unknown_tokens() {
        let verifier = StubIdentityVerifier;
        let err = verifier.verify("nope").await.unwrap_err();
        assert!(matches!(err, GovernanceError::InvalidToken));
    }

    #[tokio::test]
    async fn email_sender_mints_unique_message_ids() {
        let sender = StubEmailSender;
        let a = sender.send("ir@x.example", "s", "<p>b</p>").await.unwrap();
        let b = sender.send("ir@x.example", "s", "<p>b</p>").await.unwrap();
        assert!(a.starts_with("stub-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn research_provider_honors_limits() {
        let provider = StubResearchProvider;
        let pages = provider.crawl("https://x.example", 3).await.unwrap();
        assert_eq!(pages.len(), 3);

        let hits = provider.search("antitrust filing", 5).await.unwrap();
        assert_eq!(hits.len(), 5);
        assert!(hits[0].title.contains("antitrust filing"));
    }

    #[tokio::test]
    async fn failing_provider_reports_upstream_error() {
        let provider = AlwaysFailProvider::new("firecrawl", "rate limited");
        let err = provider.scrape("https://x.example").await.unwrap_err();
        assert!(matches!(err, GovernanceError::Upstream { .. }));
    }
}
