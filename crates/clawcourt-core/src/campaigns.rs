use crate::types::{CampaignType, EmailCampaign};
use chrono::Utc;
use std::sync::Mutex;

/// What an outbound email did, minus the id and timestamp the ledger assigns.
#[derive(Debug, Clone)]
pub struct CampaignEntry {
    pub agent_id: String,
    pub inquisition_id: String,
    pub campaign_type: CampaignType,
    pub target_email: String,
    pub target_company: String,
    pub subject: String,
    pub body: String,
    pub provider_message_id: String,
}

/// Append-only record of every email sent through the gate.
#[derive(Default)]
pub struct CampaignLedger {
    inner: Mutex<LedgerInner>,
}

#[derive(Default)]
struct LedgerInner {
    campaigns: Vec<EmailCampaign>,
    counter: u64,
}

impl CampaignLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: CampaignEntry) -> EmailCampaign {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.counter += 1;
        let campaign = EmailCampaign {
            id: format!("email-{}", inner.counter),
            agent_id: entry.agent_id,
            inquisition_id: entry.inquisition_id,
            campaign_type: entry.campaign_type,
            target_email: entry.target_email,
            target_company: entry.target_company,
            subject: entry.subject,
            body: entry.body,
            sent_at: Utc::now(),
            provider_message_id: entry.provider_message_id,
        };
        inner.campaigns.push(campaign.clone());
        campaign
    }

    /// All campaigns sent by one agent, newest-first.
    pub fn list_by_agent(&self, agent_id: &str) -> Vec<EmailCampaign> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut campaigns: Vec<EmailCampaign> = inner
            .campaigns
            .iter()
            .filter(|c| c.agent_id == agent_id)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then_with(|| b.id.cmp(&a.id)));
        campaigns
    }
}
