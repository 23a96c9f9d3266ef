use async_trait::async_trait;
use ns_core::{ArticleStore, KvStore, Result, UserStore};
use std::path::Path;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str;
    /// Open the backend. `db_path` is ignored by backends without a file.
    async fn open(db_path: Option<&Path>) -> Result<Self>
    where
        Self: Sized;
}

/// Handles onto the three store surfaces of a single backend instance.
#[derive(Clone)]
pub struct Stores {
    pub articles: Arc<dyn ArticleStore>,
    pub users: Arc<dyn UserStore>,
    pub kv: Arc<dyn KvStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: ArticleStore + UserStore + KvStore + 'static,
    {
        Self {
            articles: backend.clone(),
            users: backend.clone(),
            kv: backend,
        }
    }
}

async fn open_backend<T>(db_path: Option<&Path>) -> Result<Stores>
where
    T: StorageBackend + ArticleStore + UserStore + KvStore + 'static,
{
    let backend = T::open(db_path)
        .await
        .map_err(|e| ns_core::Error::Storage(format!("{}: {}", T::get_error_message(), e)))?;
    Ok(Stores::from_backend(Arc::new(backend)))
}

pub async fn create_store(kind: &str, db_path: Option<&str>) -> Result<Stores> {
    let db_path = db_path.map(Path::new);
    match kind {
        "memory" => open_backend::<MemoryStorage>(db_path).await,
        "sqlite" => open_backend::<SqliteStorage>(db_path).await,
        other => Err(ns_core::Error::Storage(format!(
            "Unknown storage backend: {}",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_store, StorageBackend, Stores};
}
