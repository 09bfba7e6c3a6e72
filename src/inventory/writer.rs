use crate::api::StoreClient;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Entry, Record, Timestamp};
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub(super) const NAME_REQUIRED: &str = "name required";
pub(super) const NEGATIVE_AMOUNT: &str = "amount must not be negative";

/// Validates entries and appends them as new rows.
#[derive(Debug)]
pub(super) struct Writer {
    store: Arc<StoreClient>,
}

impl Writer {
    pub(super) fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    /// Stamps `entry` with the current time and appends it. Nothing is written when validation
    /// fails.
    pub(super) async fn append(&self, entry: Entry) -> Result<Record> {
        let record = validate(entry)?;
        self.store
            .append_record(&record)
            .await
            .pub_result(ErrorType::Store)?;
        info!(
            "Appended '{}' ({}, {}) at {}",
            record.name, record.category, record.amount, record.timestamp
        );
        Ok(record)
    }
}

fn validate(entry: Entry) -> Result<Record> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err(Error::validation(NAME_REQUIRED));
    }
    if entry.amount.is_negative() {
        return Err(Error::validation(NEGATIVE_AMOUNT));
    }
    Ok(Record {
        timestamp: Timestamp::now(),
        name: name.to_string(),
        amount: entry.amount,
        category: entry.category,
        note: entry.note,
        other_fields: BTreeMap::new(),
    })
}
