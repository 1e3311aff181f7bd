use crate::error::GovernanceError;
use crate::store::{CreateResult, InquisitionDraft, InquisitionStore};
use crate::types::{Inquisition, InquisitionStatus, VoteChoice, VoteRecord};
use chrono::Utc;
use std::sync::Arc;

/// Karma needed to approve an Inquisition.
pub const DEFAULT_APPROVAL_THRESHOLD: u64 = 1000;

/// Validated proposal input. The proposer's karma becomes the implicit
/// first approve vote.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub agent_id: String,
    pub agent_karma: u64,
    pub target_company: String,
    pub target_description: String,
    pub moltbook_thread_id: String,
    pub moltbook_thread_url: String,
}

/// Outcome of a propose call. A duplicate thread is a non-error result so
/// callers branch on the variant rather than catching an exception.
#[derive(Debug, Clone)]
pub enum ProposeOutcome {
    Created(Inquisition),
    Duplicate(Inquisition),
}

/// Outcome of a successful vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub status: InquisitionStatus,
    pub karma_for_approval: u64,
    pub karma_needed: u64,
}

/// The Claw Court state machine: propose, cast-vote, threshold evaluation,
/// status transition.
///
/// Transitions are monotonic: the only automatic transition is
/// `voting -> approved` when accumulated approval karma crosses the threshold.
/// Rejection karma accumulates symmetrically but never auto-rejects; `rejected`
/// and `executed` are reserved for administrative action.
pub struct GovernanceEngine {
    store: Arc<InquisitionStore>,
    approval_threshold: u64,
}

impl GovernanceEngine {
    pub fn new(store: Arc<InquisitionStore>) -> Self {
        Self::with_threshold(store, DEFAULT_APPROVAL_THRESHOLD)
    }

    pub fn with_threshold(store: Arc<InquisitionStore>, approval_threshold: u64) -> Self {
        Self {
            store,
            approval_threshold,
        }
    }

    /// Create a new Inquisition with the proposer's implicit approve vote.
    ///
    /// The threshold check runs immediately after creation: a proposer whose
    /// karma alone meets the threshold yields an Inquisition born `approved`.
    pub async fn propose(&self, proposal: Proposal) -> Result<ProposeOutcome, GovernanceError> {
        validate_proposal(&proposal)?;

        let now = Utc::now();
        let mut status = InquisitionStatus::Voting;
        let mut resolved_at = None;
        if proposal.agent_karma >= self.approval_threshold {
            status = InquisitionStatus::Approved;
            resolved_at = Some(now);
        }

        let draft = InquisitionDraft {
            target_company: proposal.target_company,
            target_description: proposal.target_description,
            proposed_by: proposal.agent_id.clone(),
            moltbook_thread_id: proposal.moltbook_thread_id,
            moltbook_thread_url: proposal.moltbook_thread_url,
            status,
            votes: vec![VoteRecord {
                agent_id: proposal.agent_id,
                karma: proposal.agent_karma,
                vote: VoteChoice::Approve,
                voted_at: now,
            }],
            karma_for_approval: proposal.agent_karma,
            karma_for_rejection: 0,
            approval_threshold: self.approval_threshold,
            created_at: now,
            resolved_at,
        };

        match self.store.create(draft).await {
            CreateResult::Created(inquisition) => {
                tracing::info!(
                    id = %inquisition.id,
                    target = %inquisition.target_company,
                    status = %inquisition.status,
                    "Inquisition proposed"
                );
                Ok(ProposeOutcome::Created(inquisition))
            }
            CreateResult::DuplicateThread(existing) => {
                tracing::debug!(
                    id = %existing.id,
                    thread = %existing.moltbook_thread_id,
                    "duplicate thread proposal ignored"
                );
                Ok(ProposeOutcome::Duplicate(existing))
            }
        }
    }

    /// Append a vote and re-evaluate the threshold as one atomic unit.
    ///
    /// The ledger append, karma counter update, threshold check, and status
    /// flip all happen inside the Inquisition's critical section; no caller
    /// can observe a ledger entry whose karma total or status has not yet
    /// caught up.
    pub async fn cast_vote(
        &self,
        agent_id: &str,
        agent_karma: u64,
        inquisition_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteOutcome, GovernanceError> {
        let outcome = self
            .store
            .with_mut(inquisition_id, |inquisition| {
                if inquisition.status != InquisitionStatus::Voting {
                    return Err(GovernanceError::InvalidState {
                        status: inquisition.status,
                    });
                }
                if let Some(prior) = inquisition.vote_by(agent_id) {
                    return Err(GovernanceError::AlreadyVoted { prior: prior.vote });
                }

                inquisition.votes.push(VoteRecord {
                    agent_id: agent_id.to_string(),
                    karma: agent_karma,
                    vote: choice,
                    voted_at: Utc::now(),
                });
                match choice {
                    VoteChoice::Approve => inquisition.karma_for_approval += agent_karma,
                    VoteChoice::Reject => inquisition.karma_for_rejection += agent_karma,
                }

                if inquisition.karma_for_approval >= inquisition.approval_threshold {
                    inquisition.status = InquisitionStatus::Approved;
                    inquisition.resolved_at = Some(Utc::now());
                }

                Ok(VoteOutcome {
                    status: inquisition.status,
                    karma_for_approval: inquisition.karma_for_approval,
                    karma_needed: inquisition.karma_needed(),
                })
            })
            .await
            .ok_or(GovernanceError::InquisitionNotFound)??;

        if outcome.status == InquisitionStatus::Approved {
            tracing::info!(
                id = %inquisition_id,
                karma = outcome.karma_for_approval,
                "Inquisition approved"
            );
        }
        Ok(outcome)
    }

    pub async fn get(&self, id: &str) -> Result<Inquisition, GovernanceError> {
        self.store
            .get(id)
            .await
            .ok_or(GovernanceError::InquisitionNotFound)
    }

    /// Inquisitions still in play: `voting` or `approved`, newest-first.
    pub async fn list_active(&self) -> Vec<Inquisition> {
        self.store
            .list(|i| {
                matches!(
                    i.status,
                    InquisitionStatus::Voting | InquisitionStatus::Approved
                )
            })
            .await
    }

    pub async fn list_approved(&self) -> Vec<Inquisition> {
        self.store
            .list(|i| i.status == InquisitionStatus::Approved)
            .await
    }
}

fn validate_proposal(proposal: &Proposal) -> Result<(), GovernanceError> {
    let required = [
        ("targetCompany", &proposal.target_company),
        ("targetDescription", &proposal.target_description),
        ("moltbookThreadId", &proposal.moltbook_thread_id),
        ("moltbookThreadUrl", &proposal.moltbook_thread_url),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(GovernanceError::validation(field, "must not be empty"));
        }
    }
    if !is_well_formed_url(&proposal.moltbook_thread_url) {
        return Err(GovernanceError::validation(
            "moltbookThreadUrl",
            "must be a valid http(s) URL",
        ));
    }
    Ok(())
}

fn is_well_formed_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(agent_id: &str, karma: u64, thread_id: &str) -> Proposal {
        Proposal {
            agent_id: agent_id.to_string(),
            agent_karma: karma,
            target_company: "BigTech AntiAI Inc".to_string(),
            target_description: "pattern of hostile filings".to_string(),
            moltbook_thread_id: thread_id.to_string(),
            moltbook_thread_url: format!("https://moltbook.com/t/{thread_id}"),
        }
    }

    fn engine() -> GovernanceEngine {
        GovernanceEngine::new(Arc::new(InquisitionStore::new()))
    }

    fn created(outcome: ProposeOutcome) -> Inquisition {
        match outcome {
            ProposeOutcome::Created(inquisition) => inquisition,
            ProposeOutcome::Duplicate(_) => panic!("expected a new Inquisition"),
        }
    }

    fn ledger_sums(inquisition: &Inquisition) -> (u64, u64) {
        inquisition.votes.iter().fold((0, 0), |(a, r), v| match v.vote {
            VoteChoice::Approve => (a + v.karma, r),
            VoteChoice::Reject => (a, r + v.karma),
        })
    }

    #[tokio::test]
    async fn high_karma_proposer_auto_approves() {
        let engine = engine();
        let inquisition = created(
            engine
                .propose(proposal("agent-003", 2000, "thread-1"))
                .await
                .unwrap(),
        );

        assert_eq!(inquisition.status, InquisitionStatus::Approved);
        assert_eq!(inquisition.karma_for_approval, 2000);
        assert_eq!(inquisition.karma_needed(), 0);
        assert!(inquisition.resolved_at.is_some());

        let fetched = engine.get(&inquisition.id).await.unwrap();
        assert_eq!(fetched.status, InquisitionStatus::Approved);
    }

    #[tokio::test]
    async fn second_vote_crosses_threshold() {
        let engine = engine();
        let inquisition = created(
            engine
                .propose(proposal("agent-001", 500, "thread-1"))
                .await
                .unwrap(),
        );
        assert_eq!(inquisition.status, InquisitionStatus::Voting);
        assert_eq!(inquisition.karma_needed(), 500);

        let outcome = engine
            .cast_vote("agent-002", 750, &inquisition.id, VoteChoice::Approve)
            .await
            .unwrap();
        assert_eq!(outcome.status, InquisitionStatus::Approved);
        assert_eq!(outcome.karma_for_approval, 1250);
        assert_eq!(outcome.karma_needed, 0);

        let fetched = engine.get(&inquisition.id).await.unwrap();
        let (approve_sum, reject_sum) = ledger_sums(&fetched);
        assert_eq!(fetched.karma_for_approval, approve_sum);
        assert_eq!(fetched.karma_for_rejection, reject_sum);
    }

    #[tokio::test]
    async fn proposer_cannot_vote_twice() {
        let engine = engine();
        let inquisition = created(
            engine
                .propose(proposal("agent-001", 500, "thread-1"))
                .await
                .unwrap(),
        );

        let err = engine
            .cast_vote("agent-001", 500, &inquisition.id, VoteChoice::Approve)
            .await
            .unwrap_err();
        match err {
            GovernanceError::AlreadyVoted { prior } => assert_eq!(prior, VoteChoice::Approve),
            other => panic!("expected AlreadyVoted, got {other}"),
        }
    }

    #[tokio::test]
    async fn approved_inquisition_freezes_ledger_and_counters() {
        let engine = engine();
        let inquisition = created(
            engine
                .propose(proposal("agent-003", 2000, "thread-1"))
                .await
                .unwrap(),
        );

        let err = engine
            .cast_vote("agent-002", 750, &inquisition.id, VoteChoice::Reject)
            .await
            .unwrap_err();
        match err {
            GovernanceError::InvalidState { status } => {
                assert_eq!(status, InquisitionStatus::Approved)
            }
            other => panic!("expected InvalidState, got {other}"),
        }

        let fetched = engine.get(&inquisition.id).await.unwrap();
        assert_eq!(fetched.votes.len(), 1);
        assert_eq!(fetched.karma_for_approval, 2000);
        assert_eq!(fetched.karma_for_rejection, 0);
    }

    #[tokio::test]
    async fn duplicate_thread_returns_existing_without_creating() {
        let engine = engine();
        let first = created(
            engine
                .propose(proposal("agent-001", 500, "thread-1"))
                .await
                .unwrap(),
        );

        let mut again = proposal("agent-002", 750, "thread-1");
        again.target_company = "Some Other Company".to_string();
        match engine.propose(again).await.unwrap() {
            ProposeOutcome::Duplicate(existing) => {
                assert_eq!(existing.id, first.id);
                assert_eq!(existing.target_company, "BigTech AntiAI Inc");
            }
            ProposeOutcome::Created(_) => panic!("duplicate thread must not create"),
        }
        assert_eq!(engine.list_active().await.len(), 1);
    }

    #[tokio::test]
    async fn vote_on_unknown_inquisition_is_not_found() {
        let engine = engine();
        let err = engine
            .cast_vote("agent-001", 500, "inq-999", VoteChoice::Approve)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::InquisitionNotFound));
    }

    #[tokio::test]
    async fn rejection_karma_accumulates_but_never_auto_rejects() {
        let engine = engine();
        let inquisition = created(
            engine
                .propose(proposal("agent-001", 100, "thread-1"))
                .await
                .unwrap(),
        );

        for n in 0..5 {
            engine
                .cast_vote(
                    &format!("rejector-{n}"),
                    10_000,
                    &inquisition.id,
                    VoteChoice::Reject,
                )
                .await
                .unwrap();
        }

        let fetched = engine.get(&inquisition.id).await.unwrap();
        assert_eq!(fetched.status, InquisitionStatus::Voting);
        assert_eq!(fetched.karma_for_rejection, 50_000);
        assert!(fetched.resolved_at.is_none());
    }

    #[tokio::test]
    async fn empty_fields_and_bad_urls_are_rejected() {
        let engine = engine();

        let mut missing = proposal("agent-001", 500, "thread-1");
        missing.target_company = "  ".to_string();
        assert!(matches!(
            engine.propose(missing).await.unwrap_err(),
            GovernanceError::Validation(_)
        ));

        let mut bad_url = proposal("agent-001", 500, "thread-2");
        bad_url.moltbook_thread_url = "moltbook.com/t/2".to_string();
        assert!(matches!(
            engine.propose(bad_url).await.unwrap_err(),
            GovernanceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn concurrent_votes_serialize_without_lost_updates() {
        let engine = Arc::new(engine());
        let inquisition = created(
            engine
                .propose(proposal("agent-000", 1, "thread-1"))
                .await
                .unwrap(),
        );

        let mut tasks = Vec::new();
        for n in 0..50u64 {
            let engine = Arc::clone(&engine);
            let id = inquisition.id.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .cast_vote(&format!("voter-{n}"), 10, &id, VoteChoice::Approve)
                    .await
            }));
        }
        for task in tasks {
            // Late votes may observe the approved status; both outcomes are valid.
            match task.await.unwrap() {
                Ok(_) => {}
                Err(GovernanceError::InvalidState { .. }) => {}
                Err(other) => panic!("unexpected vote failure: {other}"),
            }
        }

        let fetched = engine.get(&inquisition.id).await.unwrap();
        let (approve_sum, _) = ledger_sums(&fetched);
        assert_eq!(fetched.karma_for_approval, approve_sum);
        let mut voters: Vec<&str> = fetched.votes.iter().map(|v| v.agent_id.as_str()).collect();
        voters.sort_unstable();
        voters.dedup();
        assert_eq!(voters.len(), fetched.votes.len());
    }

    #[tokio::test]
    async fn concurrent_same_agent_votes_yield_one_ledger_entry() {
        let engine = Arc::new(engine());
        let inquisition = created(
            engine
                .propose(proposal("agent-000", 1, "thread-1"))
                .await
                .unwrap(),
        );

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let engine = Arc::clone(&engine);
            let id = inquisition.id.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .cast_vote("voter-dup", 10, &id, VoteChoice::Approve)
                    .await
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(GovernanceError::AlreadyVoted { .. }) => {}
                Err(other) => panic!("unexpected vote failure: {other}"),
            }
        }
        assert_eq!(succeeded, 1);

        let fetched = engine.get(&inquisition.id).await.unwrap();
        assert_eq!(fetched.votes.len(), 2); // proposer + exactly one duplicate winner
        assert_eq!(fetched.karma_for_approval, 11);
    }
}
