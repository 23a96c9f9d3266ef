use ns_core::{ArticleStore, UserStore};
use ns_ingest::{IngestPipeline, SearchOrchestrator};
use ns_summarize::SummarizeService;
use std::sync::Arc;

use crate::behavior::BehaviorTracker;

pub struct AppState {
    pub articles: Arc<dyn ArticleStore>,
    pub users: Arc<dyn UserStore>,
    pub pipeline: Arc<IngestPipeline>,
    pub search: Arc<SearchOrchestrator>,
    pub summarizer: Arc<SummarizeService>,
    pub tracker: Arc<BehaviorTracker>,
}
