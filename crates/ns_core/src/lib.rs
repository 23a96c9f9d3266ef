pub mod behavior;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use behavior::{Notification, NotificationKind, UserBehavior};
pub use error::Error;
pub use models::SummaryModel;
pub use storage::{ArticleStore, KvStore, UserStore};
pub use types::{Article, Bookmark, HistoryEntry, RawArticle, Rating};

pub type Result<T> = std::result::Result<T, Error>;
