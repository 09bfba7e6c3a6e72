//! The application context: one store connection, a writer and a cached reader.

mod reader;
mod writer;

use crate::api::{Mode, StoreClient};
use crate::model::{Entry, Record, Records, SearchTerm};
use crate::{Config, Result};
use reader::Reader;
use std::sync::Arc;
use tracing::debug;
use writer::Writer;

/// Owns the connection to the worksheet. Everything that reads or writes records goes through
/// here, and a write always invalidates the cached records that reads are served from.
#[derive(Debug)]
pub struct Inventory {
    store: Arc<StoreClient>,
    writer: Writer,
    reader: Reader,
}

impl Inventory {
    /// Connects to the worksheet named by `config`.
    pub async fn open(config: &Config, mode: Mode) -> Result<Self> {
        let store = StoreClient::connect(config, mode).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn new(store: Arc<StoreClient>) -> Self {
        Self {
            writer: Writer::new(store.clone()),
            reader: Reader::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    /// Validates and appends `entry`, returning the record as written.
    pub async fn append(&self, entry: Entry) -> Result<Record> {
        let mut cache = self.reader.lock().await;
        let record = self.writer.append(entry).await?;
        *cache = None;
        Ok(record)
    }

    /// All records, from the cache when it is populated.
    pub async fn load_all(&self) -> Result<Arc<Records>> {
        self.reader.load_all().await
    }

    /// The records whose name contains `term`, ignoring case.
    pub async fn search(&self, term: &SearchTerm) -> Result<Vec<Record>> {
        let records = self.load_all().await?;
        let found = records.matching(term);
        debug!("{} of {} records match '{}'", found.len(), records.len(), term.as_str());
        Ok(found)
    }

    /// Drops the cache and loads all records again.
    pub async fn refresh(&self) -> Result<Arc<Records>> {
        *self.reader.lock().await = None;
        self.load_all().await
    }
}
