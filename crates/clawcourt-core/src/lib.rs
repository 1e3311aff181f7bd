//! Claw Court governance core for the Active Investor collective.
//!
//! This crate enforces the collective's accountability invariants: karma-weighted
//! voting over Inquisitions, exactly-once ballots per agent, atomic threshold
//! evaluation, and an action gate that holds every outbound email behind an
//! approved Inquisition.

#![deny(unsafe_code)]

pub mod campaigns;
pub mod collaborators;
pub mod error;
pub mod findings;
pub mod gate;
pub mod governance;
pub mod registry;
pub mod store;
pub mod types;

pub use campaigns::{CampaignEntry, CampaignLedger};
pub use collaborators::{
    DocumentParser, EmailSender, IdentityVerifier, ParseResult, ParsedChunk, ResearchProvider,
    ScrapeResult, SearchHit,
};
pub use error::GovernanceError;
pub use findings::{FindingDraft, FindingStore};
pub use gate::{ActionGate, GateFailure};
pub use governance::{
    GovernanceEngine, Proposal, ProposeOutcome, VoteOutcome, DEFAULT_APPROVAL_THRESHOLD,
};
pub use registry::AgentRegistry;
pub use store::{CreateResult, InquisitionDraft, InquisitionStore};
pub use types::{
    Agent, AuthContext, CampaignType, EmailCampaign, Finding, FindingType, Inquisition,
    InquisitionStatus, VerifiedIdentity, VoteChoice, VoteRecord,
};
