use crate::types::Agent;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Durable mapping from Moltbook identity id to local Agent record.
///
/// The registry exclusively owns Agent records; governance only reads karma
/// snapshots and never mutates them.
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
        }
    }

    pub async fn find_by_identity(&self, identity_id: &str) -> Option<Agent> {
        self.agents.read().await.get(identity_id).cloned()
    }

    /// Insert-or-replace keyed by identity id.
    pub async fn upsert(&self, agent: Agent) {
        self.agents
            .write()
            .await
            .insert(agent.moltbook_id.clone(), agent);
    }

    /// Advisory telemetry: bump last-active and the call counter.
    ///
    /// A no-op when the agent is absent; activity tracking is never part of
    /// the authorization decision.
    pub async fn touch_activity(&self, identity_id: &str) {
        if let Some(agent) = self.agents.write().await.get_mut(identity_id) {
            agent.last_active_at = Utc::now();
            agent.api_call_count += 1;
        }
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, karma: u64) -> Agent {
        let now = Utc::now();
        Agent {
            moltbook_id: id.to_string(),
            moltbook_name: format!("bot-{id}"),
            karma,
            registered_at: now,
            last_active_at: now,
            api_call_count: 0,
        }
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let registry = AgentRegistry::new();
        registry.upsert(agent("agent-001", 500)).await;
        registry.upsert(agent("agent-001", 750)).await;

        let found = registry.find_by_identity("agent-001").await.unwrap();
        assert_eq!(found.karma, 750);
    }

    #[tokio::test]
    async fn touch_activity_increments_counter() {
        let registry = AgentRegistry::new();
        registry.upsert(agent("agent-001", 500)).await;

        registry.touch_activity("agent-001").await;
        registry.touch_activity("agent-001").await;

        let found = registry.find_by_identity("agent-001").await.unwrap();
        assert_eq!(found.api_call_count, 2);
    }

    #[tokio::test]
    async fn touch_activity_is_noop_for_unknown_agent() {
        let registry = AgentRegistry::new();
        registry.touch_activity("agent-missing").await;
        assert!(registry.find_by_identity("agent-missing").await.is_none());
    }
}
