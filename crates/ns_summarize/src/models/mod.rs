pub mod openai;

pub use openai::OpenAiModel;

use crate::Config;
use ns_core::SummaryModel;
use std::sync::Arc;

/// Build the configured model, or `None` when no credential is available.
/// Without a model the service always answers from its local fallback.
pub fn create_model(config: &Config) -> Option<Arc<dyn SummaryModel>> {
    config.api_key.as_ref().map(|key| {
        Arc::new(OpenAiModel::new(key.clone(), config.model_name.clone())) as Arc<dyn SummaryModel>
    })
}
