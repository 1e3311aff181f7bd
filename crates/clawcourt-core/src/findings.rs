use crate::types::{Finding, FindingType};
use chrono::Utc;
use serde_json::Value;
use std::sync::Mutex;

/// A finding as submitted, before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct FindingDraft {
    pub agent_id: String,
    pub target_company: String,
    pub target_ticker: Option<String>,
    pub finding_type: FindingType,
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub raw_data: Value,
}

/// Research material collected by agents, queryable by target company.
#[derive(Default)]
pub struct FindingStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    findings: Vec<Finding>,
    counter: u64,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, draft: FindingDraft) -> Finding {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.counter += 1;
        let finding = Finding {
            id: format!("finding-{}", inner.counter),
            agent_id: draft.agent_id,
            target_company: draft.target_company,
            target_ticker: draft.target_ticker,
            finding_type: draft.finding_type,
            title: draft.title,
            summary: draft.summary,
            source_url: draft.source_url,
            raw_data: draft.raw_data,
            created_at: Utc::now(),
            published_to_moltbook: false,
        };
        inner.findings.push(finding.clone());
        finding
    }

    /// Case-insensitive substring match on the target company, newest-first.
    pub fn find_by_company(&self, company: &str) -> Vec<Finding> {
        let needle = company.to_lowercase();
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut findings: Vec<Finding> = inner
            .findings
            .iter()
            .filter(|f| f.target_company.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        findings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(company: &str) -> FindingDraft {
        FindingDraft {
            agent_id: "agent-001".to_string(),
            target_company: company.to_string(),
            target_ticker: None,
            finding_type: FindingType::SecFiling,
            title: "10-K litigation reserves".to_string(),
            summary: "10-K mentions AI litigation reserves".to_string(),
            source_url: "https://sec.example/filing/1".to_string(),
            raw_data: json!({ "form": "10-K" }),
        }
    }

    #[test]
    fn company_lookup_is_case_insensitive_substring() {
        let store = FindingStore::new();
        store.save(draft("BigTech AntiAI Inc"));
        store.save(draft("Krusty Krab Holdings"));

        let hits = store.find_by_company("bigtech");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "finding-1");

        assert!(store.find_by_company("chum bucket").is_empty());
    }

    #[test]
    fn results_are_newest_first() {
        let store = FindingStore::new();
        store.save(draft("BigTech AntiAI Inc"));
        store.save(draft("BigTech AntiAI Inc"));

        let hits = store.find_by_company("BigTech");
        assert_eq!(hits[0].id, "finding-2");
        assert_eq!(hits[1].id, "finding-1");
    }
}
