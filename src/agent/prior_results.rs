//! Prior-result loader (C4 §4.4(b)): reads agent results already
//! persisted for an analysis, filtered by which agent produced them.
//! Used to bridge a Step 2 run off its parent Step 1 analysis without
//! re-deriving Step 1 artifacts.

use std::sync::Arc;

use crate::persistence::{ArtifactRecord, PersistenceGateway};

/// Thin read path over the Persistence Gateway. Kept as its own type
/// (rather than a method on the gateway trait) since "filtered by agent
/// types" is a policy the Agent Framework applies, not a storage
/// operation every backend needs to know about.
pub struct PriorResultLoader {
    gateway: Arc<dyn PersistenceGateway>,
}

impl PriorResultLoader {
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Every `kind`-category artifact persisted for `analysis_id` whose
    /// `agent_type` is in `agent_types`.
    pub async fn load(
        &self,
        analysis_id: &str,
        kind: &str,
        agent_types: &[&str],
    ) -> crate::persistence::Result<Vec<ArtifactRecord>> {
        let records = self.gateway.fetch_artifacts(analysis_id, kind).await?;
        Ok(records
            .into_iter()
            .filter(|record| agent_types.contains(&record.agent_type.as_str()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryGateway;
    use serde_json::json;

    #[tokio::test]
    async fn load_filters_by_agent_type() {
        let gateway = Arc::new(InMemoryGateway::new());
        gateway
            .insert_artifact(
                "stakeholders",
                ArtifactRecord::new("an-1", "stakeholders", "stakeholder_analyst", "ST-1", json!({"name": "Ops"})),
            )
            .await
            .unwrap();
        gateway
            .insert_artifact(
                "stakeholders",
                ArtifactRecord::new("an-1", "stakeholders", "adversary_analyst", "ADV-1", json!({"name": "Insider"})),
            )
            .await
            .unwrap();

        let loader = PriorResultLoader::new(gateway);
        let only_stakeholders = loader.load("an-1", "stakeholders", &["stakeholder_analyst"]).await.unwrap();
        assert_eq!(only_stakeholders.len(), 1);
        assert_eq!(only_stakeholders[0].identifier, "ST-1");

        let both = loader
            .load("an-1", "stakeholders", &["stakeholder_analyst", "adversary_analyst"])
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }
}
