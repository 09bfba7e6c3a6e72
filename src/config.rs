//! Configuration file handling for stocklog.
//!
//! The configuration file is stored at `$STOCKLOG_HOME/config.json` and names the spreadsheet and
//! worksheet that records are written to, along with the path to the service account key.

use crate::error::{ErrorType, IntoResult, Res};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "stocklog";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const SERVICE_ACCOUNT_JSON: &str = "service_account.json";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$STOCKLOG_HOME` and from there it loads `$STOCKLOG_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet: SpreadsheetRef,
}

impl Config {
    /// Creates the home directory, its subdirectories and:
    /// - Creates an initial `config.json` file pointing at `spreadsheet` and `worksheet`
    /// - Copies `credentials` into its default location in the home directory.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/stocklog`
    /// - `credentials` - The service account key JSON downloaded from the Google Cloud Console.
    /// - `spreadsheet` - Either the URL of the Google Sheet, e.g.
    ///   `https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX`,
    ///   or the title of a spreadsheet that has been shared with the service account.
    /// - `worksheet` - The tab to use. When `None`, the first tab of the spreadsheet is used.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or the spreadsheet reference is malformed.
    pub async fn create(
        dir: impl Into<PathBuf>,
        credentials: &Path,
        spreadsheet: &str,
        worksheet: Option<&str>,
    ) -> Res<Self> {
        // Validate before touching the filesystem
        let spreadsheet_ref = SpreadsheetRef::parse(spreadsheet)?;
        if !credentials.is_file() {
            bail!(
                "The credentials file is missing '{}'",
                credentials.display()
            )
        }

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the stocklog home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        utils::copy_private(credentials, secrets.join(SERVICE_ACCOUNT_JSON)).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            spreadsheet: spreadsheet.to_string(),
            worksheet: worksheet.map(str::to_string),
            credentials_path: None,
        };
        config_file.save(&config_path).await?;
        debug!("Wrote {}", config_path.display());

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            spreadsheet: spreadsheet_ref,
        })
    }

    /// This will
    /// - validate that `home` exists and that the config file exists
    /// - load the config file
    /// - validate that the secrets directory exists
    /// - return the loaded configuration object
    ///
    /// Every failure is a `Config` error.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        if !maybe_relative.is_dir() {
            bail!(
                "The stocklog home directory is missing '{}', run 'stocklog init' first",
                maybe_relative.display()
            )
        }
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let spreadsheet = SpreadsheetRef::parse(&config_file.spreadsheet)
            .context("The spreadsheet in the config file is invalid")?;

        let config = Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            spreadsheet,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn spreadsheet(&self) -> &SpreadsheetRef {
        &self.spreadsheet
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.config_file.worksheet.as_deref()
    }

    /// Returns the stored `credentials_path` if it is absolute, otherwise resolves the relative
    /// path against the home directory.
    pub fn credentials_path(&self) -> PathBuf {
        let p = self.config_file.credentials_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// How the spreadsheet is addressed: by its ID (taken from a URL) or by its title.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum SpreadsheetRef {
    Id(String),
    Title(String),
}

impl SpreadsheetRef {
    /// Anything that looks like a URL must be a Google Sheets URL; anything else is a title.
    pub fn parse(s: &str) -> Res<Self> {
        let s = s.trim();
        if s.is_empty() {
            bail!("The spreadsheet URL or title must not be empty")
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(SpreadsheetRef::Id(extract_spreadsheet_id(s)?))
        } else {
            Ok(SpreadsheetRef::Title(s.to_string()))
        }
    }
}

impl Display for SpreadsheetRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SpreadsheetRef::Id(id) => write!(f, "id:{id}"),
            SpreadsheetRef::Title(title) => write!(f, "title:{title}"),
        }
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "stocklog",
///   "config_version": 1,
///   "spreadsheet": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "worksheet": "재고",
///   "credentials_path": ".secrets/service_account.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "stocklog"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL or title of the Google Sheet
    spreadsheet: String,

    /// Title of the worksheet (tab). The first worksheet is used when this is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    worksheet: Option<String>,

    /// Path to the service account key (optional, relative to the home directory or absolute)
    /// Defaults to $STOCKLOG_HOME/.secrets/service_account.json if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credentials_path: Option<PathBuf>,
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if `app_name` is wrong
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL, i.e. the path segment following `d`.
///
/// e.g. `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/edit#gid=0`
fn extract_spreadsheet_id(s: &str) -> Res<String> {
    let url = url::Url::parse(s).with_context(|| format!("Unable to parse the URL '{s}'"))?;
    let mut segments = url
        .path_segments()
        .with_context(|| format!("The URL '{s}' has no path"))?;
    while let Some(segment) = segments.next() {
        if segment == "d" {
            if let Some(id) = segments.next().filter(|id| !id.is_empty()) {
                return Ok(id.to_string());
            }
        }
    }
    bail!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str =
        "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL/edit";

    async fn credentials(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("key.json");
        utils::write(&path, r#"{"type": "service_account"}"#)
            .await
            .unwrap();
        path
    }

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("stocklog_home");
        let key = credentials(&dir).await;

        let created = Config::create(&home, &key, URL, Some("재고")).await.unwrap();
        assert_eq!(
            created.spreadsheet(),
            &SpreadsheetRef::Id("7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL".into())
        );
        assert_eq!(created.worksheet(), Some("재고"));
        assert!(created.secrets().is_dir());
        assert!(created.credentials_path().is_file());
        // the original is copied, not moved
        assert!(key.is_file());

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.spreadsheet(), created.spreadsheet());
        assert_eq!(loaded.worksheet(), Some("재고"));
        assert_eq!(loaded.credentials_path(), created.credentials_path());
    }

    #[tokio::test]
    async fn test_config_create_with_title() {
        let dir = TempDir::new().unwrap();
        let key = credentials(&dir).await;
        let config = Config::create(dir.path().join("h"), &key, "경영진보고", None)
            .await
            .unwrap();
        assert_eq!(
            config.spreadsheet(),
            &SpreadsheetRef::Title("경영진보고".into())
        );
        assert_eq!(config.worksheet(), None);
    }

    #[tokio::test]
    async fn test_config_create_missing_credentials() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("h");
        let result = Config::create(&home, &dir.path().join("nope.json"), URL, None).await;
        assert!(result.is_err());
        assert!(!home.exists());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path().join("missing")).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("stocklog init"));
    }

    #[tokio::test]
    async fn test_config_load_missing_secrets() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("h");
        let key = credentials(&dir).await;
        let config = Config::create(&home, &key, URL, None).await.unwrap();
        tokio::fs::remove_dir_all(config.secrets()).await.unwrap();
        let err = Config::load(&home).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
        assert!(err.to_string().contains("secrets directory"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "some-other-app",
            "config_version": 1,
            "spreadsheet": "Inventory"
        }"#;
        utils::write(&path, json).await.unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_minimal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "stocklog",
            "config_version": 1,
            "spreadsheet": "Inventory"
        }"#;
        utils::write(&path, json).await.unwrap();
        let config = ConfigFile::load(&path).await.unwrap();
        assert_eq!(config.worksheet, None);
        assert_eq!(
            config.credentials_path(),
            PathBuf::from(SECRETS).join(SERVICE_ACCOUNT_JSON)
        );
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let config = ConfigFile {
            app_name: APP_NAME.into(),
            config_version: CONFIG_VERSION,
            spreadsheet: "Inventory".into(),
            worksheet: None,
            credentials_path: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("worksheet"));
        assert!(!json.contains("credentials_path"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(URL).unwrap(),
            "7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123?foo=bar")
                .unwrap(),
            "ABC123"
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/ABC123#gid=0").unwrap(),
            "ABC123"
        );
        assert!(extract_spreadsheet_id("https://example.com/invalid").is_err());
        assert!(extract_spreadsheet_id("https://example.com/d/").is_err());
    }

    #[test]
    fn test_spreadsheet_ref_parse() {
        assert_eq!(
            SpreadsheetRef::parse("  Inventory ").unwrap(),
            SpreadsheetRef::Title("Inventory".into())
        );
        assert!(SpreadsheetRef::parse("").is_err());
        assert!(SpreadsheetRef::parse("https://example.com/nothing").is_err());
        assert_eq!(
            SpreadsheetRef::parse("https://docs.google.com/spreadsheets/d/X1/edit")
                .unwrap()
                .to_string(),
            "id:X1"
        );
    }
}
