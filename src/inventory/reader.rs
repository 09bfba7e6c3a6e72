use crate::api::StoreClient;
use crate::error::{ErrorType, IntoResult, Res};
use crate::model::Records;
use crate::Result;
use anyhow::Context;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

pub(super) type Cache = Option<Arc<Records>>;

/// Loads the worksheet as records and keeps the most recent load until it is invalidated.
#[derive(Debug)]
pub(super) struct Reader {
    store: Arc<StoreClient>,
    cache: Mutex<Cache>,
}

impl Reader {
    pub(super) fn new(store: Arc<StoreClient>) -> Self {
        Self {
            store,
            cache: Mutex::new(None),
        }
    }

    /// Holding the returned guard keeps every reader out of the cache, which lets a write and its
    /// invalidation happen as one step.
    pub(super) async fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().await
    }

    pub(super) async fn load_all(&self) -> Result<Arc<Records>> {
        let mut cache = self.lock().await;
        if let Some(records) = cache.as_ref() {
            debug!("Serving {} records from the cache", records.len());
            return Ok(records.clone());
        }
        let records = Arc::new(self.fetch().await.pub_result(ErrorType::Store)?);
        *cache = Some(records.clone());
        Ok(records)
    }

    async fn fetch(&self) -> Res<Records> {
        let rows = self.store.fetch_rows().await?;
        Records::parse(rows)
            .with_context(|| format!("Unable to read worksheet '{}'", self.store.worksheet()))
    }
}
