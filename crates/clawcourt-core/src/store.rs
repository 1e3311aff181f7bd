use crate::types::{Inquisition, InquisitionStatus, VoteRecord};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Everything an Inquisition carries except its store-assigned id.
#[derive(Debug, Clone)]
pub struct InquisitionDraft {
    pub target_company: String,
    pub target_description: String,
    pub proposed_by: String,
    pub moltbook_thread_id: String,
    pub moltbook_thread_url: String,
    pub status: InquisitionStatus,
    pub votes: Vec<VoteRecord>,
    pub karma_for_approval: u64,
    pub karma_for_rejection: u64,
    pub approval_threshold: u64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Outcome of an insert attempt keyed by the thread-id idempotency check.
#[derive(Debug, Clone)]
pub enum CreateResult {
    Created(Inquisition),
    /// A record for this thread already exists; the existing snapshot is
    /// returned unchanged.
    DuplicateThread(Inquisition),
}

struct StoreInner {
    by_id: HashMap<String, Arc<Mutex<Inquisition>>>,
    by_thread: HashMap<String, String>,
    counter: u64,
}

/// Owner of all Inquisition entities and their vote ledgers.
///
/// Concurrency contract: read-modify-write of (ledger, karma counters, status)
/// is one atomic unit per Inquisition. Each entity is guarded by its own mutex;
/// the outer map lock is held only long enough to resolve the handle, so
/// writers to different Inquisitions never block each other. Creation holds the
/// map write lock across the thread-id duplicate check and the insert so a
/// racing duplicate proposal cannot create two records.
pub struct InquisitionStore {
    inner: RwLock<StoreInner>,
}

impl InquisitionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                by_id: HashMap::new(),
                by_thread: HashMap::new(),
                counter: 0,
            }),
        }
    }

    /// Insert a new Inquisition unless one already exists for its thread id.
    pub async fn create(&self, draft: InquisitionDraft) -> CreateResult {
        let existing = {
            let inner = self.inner.read().await;
            inner
                .by_thread
                .get(&draft.moltbook_thread_id)
                .and_then(|id| inner.by_id.get(id))
                .cloned()
        };
        if let Some(handle) = existing {
            return CreateResult::DuplicateThread(handle.lock().await.clone());
        }

        let mut inner = self.inner.write().await;
        // Re-check under the write lock: a concurrent create may have won.
        if let Some(handle) = inner
            .by_thread
            .get(&draft.moltbook_thread_id)
            .and_then(|id| inner.by_id.get(id))
            .cloned()
        {
            drop(inner);
            return CreateResult::DuplicateThread(handle.lock().await.clone());
        }

        inner.counter += 1;
        let id = format!("inq-{}", inner.counter);
        let inquisition = Inquisition {
            id: id.clone(),
            target_company: draft.target_company,
            target_description: draft.target_description,
            proposed_by: draft.proposed_by,
            moltbook_thread_id: draft.moltbook_thread_id.clone(),
            moltbook_thread_url: draft.moltbook_thread_url,
            status: draft.status,
            votes: draft.votes,
            karma_for_approval: draft.karma_for_approval,
            karma_for_rejection: draft.karma_for_rejection,
            approval_threshold: draft.approval_threshold,
            created_at: draft.created_at,
            resolved_at: draft.resolved_at,
        };
        inner
            .by_thread
            .insert(draft.moltbook_thread_id, id.clone());
        inner
            .by_id
            .insert(id, Arc::new(Mutex::new(inquisition.clone())));

        CreateResult::Created(inquisition)
    }

    /// Snapshot an Inquisition by id.
    pub async fn get(&self, id: &str) -> Option<Inquisition> {
        let handle = {
            let inner = self.inner.read().await;
            inner.by_id.get(id).cloned()
        }?;
        let inquisition = handle.lock().await;
        Some(inquisition.clone())
    }

    /// Run `mutate` inside the Inquisition's critical section.
    ///
    /// The closure sees the entity exactly as the previous writer left it; no
    /// intermediate ledger/counter/status state is observable from outside.
    pub async fn with_mut<R>(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Inquisition) -> R,
    ) -> Option<R> {
        let handle = {
            let inner = self.inner.read().await;
            inner.by_id.get(id).cloned()
        }?;
        let mut inquisition = handle.lock().await;
        Some(mutate(&mut inquisition))
    }

    /// Snapshot all Inquisitions matching `filter`, newest-first by creation
    /// time with id as the deterministic tie-break.
    pub async fn list(&self, filter: impl Fn(&Inquisition) -> bool) -> Vec<Inquisition> {
        let handles: Vec<Arc<Mutex<Inquisition>>> = {
            let inner = self.inner.read().await;
            inner.by_id.values().cloned().collect()
        };

        let mut matched = Vec::new();
        for handle in handles {
            let inquisition = handle.lock().await;
            if filter(&inquisition) {
                matched.push(inquisition.clone());
            }
        }
        matched.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matched
    }
}

impl Default for InquisitionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VoteChoice;

    fn draft(thread_id: &str) -> InquisitionDraft {
        InquisitionDraft {
            target_company: "Krabby Corp".to_string(),
            target_description: "suspicious filings".to_string(),
            proposed_by: "agent-001".to_string(),
            moltbook_thread_id: thread_id.to_string(),
            moltbook_thread_url: "https://moltbook.com/t/1".to_string(),
            status: InquisitionStatus::Voting,
            votes: vec![VoteRecord {
                agent_id: "agent-001".to_string(),
                karma: 500,
                vote: VoteChoice::Approve,
                voted_at: Utc::now(),
            }],
            karma_for_approval: 500,
            karma_for_rejection: 0,
            approval_threshold: 1000,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[tokio::test]
    async fn assigns_monotonic_ids() {
        let store = InquisitionStore::new();
        let first = store.create(draft("thread-1")).await;
        let second = store.create(draft("thread-2")).await;

        match (first, second) {
            (CreateResult::Created(a), CreateResult::Created(b)) => {
                assert_eq!(a.id, "inq-1");
                assert_eq!(b.id, "inq-2");
            }
            other => panic!("expected two creations, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_thread_returns_original_record() {
        let store = InquisitionStore::new();
        let CreateResult::Created(original) = store.create(draft("thread-1")).await else {
            panic!("first create should succeed");
        };

        let mut second = draft("thread-1");
        second.target_company = "Different Name Inc".to_string();
        match store.create(second).await {
            CreateResult::DuplicateThread(existing) => {
                assert_eq!(existing.id, original.id);
                assert_eq!(existing.target_company, "Krabby Corp");
            }
            CreateResult::Created(_) => panic!("duplicate thread must not create"),
        }
    }

    #[tokio::test]
    async fn concurrent_creates_for_same_thread_yield_one_record() {
        let store = Arc::new(InquisitionStore::new());
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.create(draft("thread-contended")).await
            }));
        }

        let mut created = 0;
        for task in tasks {
            if let CreateResult::Created(_) = task.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list(|_| true).await.len(), 1);
    }

    #[tokio::test]
    async fn list_orders_newest_first_with_id_tiebreak() {
        let store = InquisitionStore::new();
        let now = Utc::now();
        for n in 1..=3 {
            let mut d = draft(&format!("thread-{n}"));
            d.created_at = now;
            store.create(d).await;
        }

        let listed = store.list(|_| true).await;
        let ids: Vec<&str> = listed.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["inq-3", "inq-2", "inq-1"]);
    }
}
