pub mod pipeline;
pub mod search;
pub mod source;

pub use pipeline::{IngestOutcome, IngestPipeline, IngestRequest};
pub use search::SearchOrchestrator;
pub use source::{NewsApiClient, NewsSource};

pub mod prelude {
    pub use super::{IngestOutcome, IngestPipeline, IngestRequest, NewsSource, SearchOrchestrator};
    pub use ns_core::{Article, Error, RawArticle, Result};
}
