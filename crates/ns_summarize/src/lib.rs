pub mod models;
pub mod service;

pub use models::create_model;
pub use service::{SummarizeService, Summary, SummaryMethod};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{Config, SummarizeService, Summary, SummaryMethod};
    pub use ns_core::{Error, Result, SummaryModel};
}
