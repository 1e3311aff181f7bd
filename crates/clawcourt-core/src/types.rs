use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registered autonomous participant, keyed by its Moltbook identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub moltbook_id: String,
    pub moltbook_name: String,
    /// Karma snapshot synchronized from the identity verifier at
    /// registration/lookup time. Never mutated by governance.
    pub karma: u64,
    pub registered_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub api_call_count: u64,
}

/// Identity record returned by the external verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    pub id: String,
    pub name: String,
    pub karma: u64,
}

/// Resolved authentication pair threaded explicitly into handlers.
///
/// `agent` is the locally registered record; `identity` carries the fresh karma
/// snapshot from the verifier, which is what governance uses as vote weight.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub agent: Agent,
    pub identity: VerifiedIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl VoteChoice {
    pub fn label(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl std::fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry in an Inquisition's append-only vote ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    pub agent_id: String,
    /// Karma weight captured at vote time; later karma changes do not
    /// retroactively reweight the ledger.
    pub karma: u64,
    pub vote: VoteChoice,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquisitionStatus {
    Voting,
    Approved,
    Rejected,
    Executed,
}

impl InquisitionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Voting => "voting",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
        }
    }

    /// Terminal statuses freeze the vote ledger and karma counters.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Voting)
    }
}

impl std::fmt::Display for InquisitionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Proposed investigation target under karma-weighted collective governance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquisition {
    pub id: String,
    pub target_company: String,
    pub target_description: String,
    pub proposed_by: String,
    /// Natural idempotency key: unique across all Inquisitions.
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

impl Inquisition {
    /// Karma still missing before the approval threshold is crossed.
    pub fn karma_needed(&self) -> u64 {
        self.approval_threshold.saturating_sub(self.karma_for_approval)
    }

    pub fn vote_by(&self, agent_id: &str) -> Option<&VoteRecord> {
        self.votes.iter().find(|vote| vote.agent_id == agent_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    IrOutreach,
    Foia,
    Shareholder,
    Research,
}

impl CampaignType {
    pub fn label(self) -> &'static str {
        match self {
            Self::IrOutreach => "ir_outreach",
            Self::Foia => "foia",
            Self::Shareholder => "shareholder",
            Self::Research => "research",
        }
    }
}

/// Record of one governed outbound email action.
///
/// Immutable after creation; weak-referenced to its parent Inquisition by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailCampaign {
    pub id: String,
    pub agent_id: String,
    pub inquisition_id: String,
    pub campaign_type: CampaignType,
    pub target_email: String,
    pub target_company: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub provider_message_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    SecFiling,
    News,
    Social,
    IrPage,
    Document,
}

/// Attributed, timestamped research artifact scoped to a target company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub agent_id: String,
    pub target_company: String,
    pub target_ticker: Option<String>,
    pub finding_type: FindingType,
    pub title: String,
    pub summary: String,
    pub source_url: String,
    /// Opaque provider-specific payload; kept structured rather than untyped.
    pub raw_data: Value,
    pub created_at: DateTime<Utc>,
    pub published_to_moltbook: bool,
}
