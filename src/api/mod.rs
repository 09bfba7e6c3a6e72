//! Access to the remote worksheet.
//!
//! The `Sheet` trait is the seam between this program and Google Sheets. `GoogleSheet` implements
//! it against the live APIs and `TestSheet` implements it in memory so that the whole program can
//! run, top-to-bottom, without network access. `StoreClient` is the connection handle that the
//! rest of the program uses.

mod credentials;
mod sheet;
mod sheet_test_client;
mod store;

use crate::error::Res;
use crate::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub(crate) use credentials::TokenProvider;
pub(crate) use sheet::GoogleSheet;
pub(crate) use sheet_test_client::TestSheet;
#[cfg(test)]
pub(crate) use sheet_test_client::{TestSheetState, Worksheet};
pub use store::StoreClient;

/// OAuth scopes required by the service account. Drive is only read, to find a spreadsheet by its
/// title.
const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// When this environment variable is set and non-empty, `Mode::from_env` returns `Mode::Testing`.
pub const TEST_MODE_ENV: &str = "STOCKLOG_IN_TEST_MODE";

/// Whether we are talking to Google or to the in-memory test sheet.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Testing,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(s) if !s.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// A very small view of a spreadsheet: its worksheet titles, the rows of a worksheet, and the
/// ability to append a row.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// The titles of the worksheets (tabs), in display order.
    async fn worksheets(&mut self) -> Res<Vec<String>>;

    /// The first row of `worksheet`, or an empty `Vec` if the worksheet is empty.
    async fn header(&mut self, worksheet: &str) -> Res<Vec<String>>;

    /// All rows of `worksheet` as formatted values. Trailing empty cells may be omitted.
    async fn get(&mut self, worksheet: &str) -> Res<Vec<Vec<String>>>;

    /// Appends `row` below the last row of `worksheet`.
    async fn append_row(&mut self, worksheet: &str, row: &[serde_json::Value]) -> Res<()>;
}

/// Creates the `Sheet` implementation for `mode`. For `Mode::Google` this authenticates with the
/// service account and resolves the spreadsheet.
pub(crate) async fn open_sheet(config: &Config, mode: Mode) -> Res<Box<dyn Sheet + Send>> {
    debug!("Opening {} in {mode} mode", config.spreadsheet());
    Ok(match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(config.credentials_path()).await?;
            Box::new(GoogleSheet::new(config.spreadsheet(), token_provider).await?)
        }
        Mode::Testing => Box::new(TestSheet::new(config.spreadsheet())),
    })
}

/// Renders a worksheet title as the sheet part of an A1 range, e.g. `'재고 현황'`.
fn quote_worksheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}
