use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::inventory::Inventory;
use crate::{Config, Result};
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Creates the data directory, its secrets subdirectory and:
/// - Creates an initial `config.json` file pointing at `spreadsheet`
/// - Copies `credentials` into its default location in the data dir.
///
/// # Arguments
/// - `home` - The directory that will be the root of data directory, e.g. `$HOME/stocklog`
/// - `credentials` - The service account key JSON. This will be copied from the `credentials`
///   path to its default location and name in the data directory.
/// - `spreadsheet` - The URL or the title of the Google Sheet where records are logged.
/// - `worksheet` - The tab to use, or `None` for the first tab.
///
/// # Errors
/// - Returns an error if any file operations fail. Nothing is sent to Google.
pub async fn init(
    home: &Path,
    credentials: &Path,
    spreadsheet: &str,
    worksheet: Option<&str>,
) -> Result<Out<()>> {
    let config = Config::create(home, credentials, spreadsheet, worksheet)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the stocklog directory and config at {}",
        config.root().display()
    )
    .into())
}

/// What `check` found.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Status {
    /// The worksheet records are read from and written to.
    pub worksheet: String,
    /// The number of records currently in the worksheet.
    pub records: usize,
    /// The number of rows that could not be read as records.
    pub skipped: usize,
    /// The header row of the worksheet. Empty until the first record is written.
    pub headers: Vec<String>,
}

/// Connects (which `inventory` has already done), reads the worksheet and reports on it.
pub async fn check(inventory: &Inventory) -> Result<Out<Status>> {
    let records = inventory.refresh().await?;
    let status = Status {
        worksheet: inventory.store().worksheet().to_string(),
        records: records.len(),
        skipped: records.skipped().len(),
        headers: records.mapping().headers().to_vec(),
    };
    let mut message = format!(
        "Worksheet '{}' is reachable and holds {} records",
        status.worksheet, status.records
    );
    if status.skipped > 0 {
        let rows: Vec<String> = records.skipped().iter().map(|r| r.to_string()).collect();
        message.push_str(&format!(", rows {} could not be read", rows.join(", ")));
    }
    Ok(Out::new(message, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Mode;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_init_creates_config() {
        let env = TestEnv::new().await;
        let home = env.unused_dir("home");
        let out = init(&home, &env.credentials(), "재고 장부", Some("2025"))
            .await
            .unwrap();
        assert!(out.message().contains("Successfully"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.worksheet(), Some("2025"));
        assert!(config.credentials_path().is_file());
    }

    #[tokio::test]
    async fn test_init_bad_credentials_path() {
        let env = TestEnv::new().await;
        let home = env.unused_dir("home");
        let err = init(&home, &env.unused_dir("missing.json"), "재고 장부", None)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }

    #[tokio::test]
    async fn test_check() {
        let env = TestEnv::seeded().await;
        let inventory = Inventory::open(&env.config(), Mode::Testing).await.unwrap();
        let out = check(&inventory).await.unwrap();
        let status = out.structure().unwrap();
        assert_eq!(status.worksheet, "Sheet1");
        assert_eq!(status.records, 3);
        assert_eq!(status.skipped, 0);
        assert_eq!(status.headers.len(), 5);
    }

    #[tokio::test]
    async fn test_check_reports_unreadable_rows() {
        let env = TestEnv::seeded().await;
        let mut state = env.get_state();
        state.worksheets[0].rows.push(vec![
            "03/01/2025".into(),
            "Gadget".into(),
            "1".into(),
            "입고".into(),
        ]);
        env.set_state(state);
        let inventory = Inventory::open(&env.config(), Mode::Testing).await.unwrap();
        let out = check(&inventory).await.unwrap();
        assert_eq!(out.structure().unwrap().records, 3);
        assert_eq!(out.structure().unwrap().skipped, 1);
        assert!(out.message().ends_with("rows 5 could not be read"));
    }
}
