//! Implements the very simple `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets.
//!
//! Each spreadsheet's data lives in a process-wide map keyed by the spreadsheet reference, so that
//! separate `TestSheet` handles opened on the same spreadsheet observe each other's appends, the
//! same way two connections to a live spreadsheet would.

use crate::api::Sheet;
use crate::config::SpreadsheetRef;
use crate::error::Res;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, MutexGuard};

const DEFAULT_WORKSHEET: &str = "Sheet1";

static SPREADSHEETS: LazyLock<Mutex<HashMap<String, TestSheetState>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn spreadsheets() -> MutexGuard<'static, HashMap<String, TestSheetState>> {
    SPREADSHEETS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One tab of an in-memory spreadsheet.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct Worksheet {
    pub(crate) title: String,
    pub(crate) rows: Vec<Vec<String>>,
}

impl Worksheet {
    pub(crate) fn new(title: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }
}

/// The contents of an in-memory spreadsheet. When `read_only` is set, appends fail, which is how
/// tests simulate a remote write failure.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct TestSheetState {
    pub(crate) worksheets: Vec<Worksheet>,
    pub(crate) read_only: bool,
}

impl Default for TestSheetState {
    /// A spreadsheet with one empty worksheet.
    fn default() -> Self {
        Self {
            worksheets: vec![Worksheet::new(DEFAULT_WORKSHEET, Vec::new())],
            read_only: false,
        }
    }
}

impl TestSheetState {
    /// Returns a copy of the state of `spreadsheet`, creating the default state if it has never
    /// been touched.
    #[cfg(test)]
    pub(crate) fn get(spreadsheet: &SpreadsheetRef) -> Self {
        spreadsheets()
            .entry(spreadsheet.to_string())
            .or_default()
            .clone()
    }

    /// Replaces the state of `spreadsheet`.
    #[cfg(test)]
    pub(crate) fn set(spreadsheet: &SpreadsheetRef, state: TestSheetState) {
        spreadsheets().insert(spreadsheet.to_string(), state);
    }

    fn worksheet(&self, title: &str) -> Res<&Worksheet> {
        self.worksheets
            .iter()
            .find(|w| w.title == title)
            .with_context(|| format!("Worksheet '{title}' not found"))
    }

    fn worksheet_mut(&mut self, title: &str) -> Res<&mut Worksheet> {
        self.worksheets
            .iter_mut()
            .find(|w| w.title == title)
            .with_context(|| format!("Worksheet '{title}' not found"))
    }
}

/// An implementation of the `Sheet` trait that does not use Google sheets.
pub(crate) struct TestSheet {
    key: SpreadsheetRef,
}

impl TestSheet {
    pub(crate) fn new(spreadsheet: &SpreadsheetRef) -> Self {
        Self {
            key: spreadsheet.clone(),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> Res<T>) -> Res<T> {
        let mut map = spreadsheets();
        let state = map.entry(self.key.to_string()).or_default();
        f(state)
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn worksheets(&mut self) -> Res<Vec<String>> {
        self.with_state(|state| Ok(state.worksheets.iter().map(|w| w.title.clone()).collect()))
    }

    async fn header(&mut self, worksheet: &str) -> Res<Vec<String>> {
        self.with_state(|state| {
            Ok(state
                .worksheet(worksheet)?
                .rows
                .first()
                .cloned()
                .unwrap_or_default())
        })
    }

    async fn get(&mut self, worksheet: &str) -> Res<Vec<Vec<String>>> {
        self.with_state(|state| Ok(state.worksheet(worksheet)?.rows.clone()))
    }

    async fn append_row(&mut self, worksheet: &str, row: &[serde_json::Value]) -> Res<()> {
        self.with_state(|state| {
            if state.read_only {
                bail!("The caller does not have permission to edit '{worksheet}'")
            }
            let row = row.iter().map(cell_text).collect();
            state.worksheet_mut(worksheet)?.rows.push(row);
            Ok(())
        })
    }
}

/// Renders a value the way Sheets shows a `RAW` input as a formatted value.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> SpreadsheetRef {
        SpreadsheetRef::Title(format!("test-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_default_state() {
        let key = key();
        let mut sheet = TestSheet::new(&key);
        assert_eq!(sheet.worksheets().await.unwrap(), vec!["Sheet1"]);
        assert!(sheet.header("Sheet1").await.unwrap().is_empty());
        assert!(sheet.get("Sheet1").await.unwrap().is_empty());
        assert!(sheet.get("Nope").await.is_err());
    }

    #[tokio::test]
    async fn test_append_is_shared() {
        let key = key();
        let mut a = TestSheet::new(&key);
        let mut b = TestSheet::new(&key);
        a.append_row("Sheet1", &[json!("x"), json!(10), json!(1.5), json!(null)])
            .await
            .unwrap();
        let rows = b.get("Sheet1").await.unwrap();
        assert_eq!(rows, vec![vec!["x", "10", "1.5", ""]]);
        assert_eq!(b.header("Sheet1").await.unwrap(), vec!["x", "10", "1.5", ""]);
        assert_eq!(TestSheetState::get(&key).worksheets[0].rows.len(), 1);
    }

    #[tokio::test]
    async fn test_read_only() {
        let key = key();
        TestSheetState::set(
            &key,
            TestSheetState {
                read_only: true,
                ..TestSheetState::default()
            },
        );
        let mut sheet = TestSheet::new(&key);
        assert!(sheet.append_row("Sheet1", &[json!("x")]).await.is_err());
        assert!(TestSheetState::get(&key).worksheets[0].rows.is_empty());
    }
}
