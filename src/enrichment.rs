use async_trait::async_trait;

use crate::error::AnalysisError;
use crate::models::ActionType;

/// Produces explanatory text for a recommended action, typically backed by a language model.
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    async fn enrich(
        &self,
        action_type: ActionType,
        description: &str,
        week: u32,
    ) -> Result<String, AnalysisError>;
}
