//! These structs provide the CLI interface for the stocklog CLI.

use crate::commands::OutputFormat;
use crate::model::{Amount, Category};
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// stocklog: A command-line tool for logging inventory events to a Google sheet.
///
/// Every event (goods in, goods out, anything else) is appended as a timestamped row to one
/// worksheet of a Google spreadsheet. The rows can be listed or searched by item name.
///
/// You will need a Google Cloud service account with the Sheets and Drive APIs enabled, and the
/// spreadsheet must be shared with the service account's email address.
///
/// There is also a mode in which an AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
#[command(name = "stocklog", version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need two things ready beforehand:
    ///
    /// - The key file of a Google Cloud service account, passed as --credentials. It will be
    ///   copied into the data directory.
    ///
    /// - A spreadsheet shared with the service account, passed as --spreadsheet. This is either
    ///   the URL of the spreadsheet or its title.
    Init(InitArgs),
    /// Connect to the worksheet and report how many records it holds.
    Check,
    /// Log a new record.
    Add(AddArgs),
    /// Show every record.
    List(ListArgs),
    /// Show the records whose name contains a search term, ignoring case.
    Search(SearchArgs),
    /// Run as an MCP server over stdio so an AI agent can log and look up records.
    Mcp,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where stocklog configuration and credentials are held. Defaults to ~/stocklog
    #[arg(long, env = "STOCKLOG_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `stocklog init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the Google sheet, e.g.
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    /// or the title of a spreadsheet that is shared with the service account.
    #[arg(long)]
    spreadsheet: String,

    /// The worksheet (tab) to use. Defaults to the first worksheet.
    #[arg(long)]
    worksheet: Option<String>,

    /// The path to the service account key file. It will be copied into the data directory.
    #[arg(long)]
    credentials: PathBuf,
}

impl InitArgs {
    pub fn new(
        spreadsheet: impl Into<String>,
        worksheet: Option<String>,
        credentials: impl Into<PathBuf>,
    ) -> Self {
        Self {
            spreadsheet: spreadsheet.into(),
            worksheet,
            credentials: credentials.into(),
        }
    }

    pub fn spreadsheet(&self) -> &str {
        &self.spreadsheet
    }

    pub fn worksheet(&self) -> Option<&str> {
        self.worksheet.as_deref()
    }

    pub fn credentials(&self) -> &Path {
        &self.credentials
    }
}

/// Args for the `stocklog add` command and the `add_record` MCP tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct AddArgs {
    /// The item or person the event is about. Required; surrounding whitespace is removed.
    #[arg(long)]
    pub name: String,

    /// The quantity or sum of money. Must not be negative. Defaults to 0.
    #[arg(long, default_value_t = Amount::default())]
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub amount: Amount,

    /// One of 입고 (inbound), 출고 (outbound) or 기타 (other). The English names are accepted too.
    #[arg(long)]
    #[schemars(with = "String")]
    pub category: Category,

    /// A free-form note.
    #[arg(long, default_value = "")]
    #[serde(default)]
    pub note: String,
}

/// Args for the `stocklog list` command and the `list_records` MCP tool.
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize, JsonSchema)]
pub struct ListArgs {
    /// How to render the records: table (markdown), json or csv.
    #[arg(long, value_enum, default_value_t = OutputFormat::default())]
    #[serde(default)]
    pub format: OutputFormat,

    /// Discard cached records and read the worksheet again.
    #[arg(long)]
    #[serde(default)]
    pub refresh: bool,
}

/// Args for the `stocklog search` command and the `search_records` MCP tool.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Text to look for in the name column. Case is ignored; the text is matched literally.
    pub term: String,

    /// How to render the records: table (markdown), json or csv.
    #[arg(long, value_enum, default_value_t = OutputFormat::default())]
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("stocklog"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or STOCKLOG_HOME instead of relying on the default \
                stocklog home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("stocklog")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "stocklog",
            "--home",
            "/tmp/stock",
            "add",
            "--name",
            "Widget A",
            "--amount",
            "1,200",
            "--category",
            "입고",
        ])
        .unwrap();
        assert_eq!(args.common().home().path(), Path::new("/tmp/stock"));
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.name, "Widget A");
                assert_eq!(add.amount.to_string(), "1,200");
                assert_eq!(add.category, Category::Inbound);
                assert_eq!(add.note, "");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_requires_category() {
        assert!(Args::try_parse_from(["stocklog", "add", "--name", "Widget A"]).is_err());
        assert!(Args::try_parse_from([
            "stocklog",
            "add",
            "--name",
            "x",
            "--category",
            "반품"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_search_and_list() {
        let args =
            Args::try_parse_from(["stocklog", "search", "widget", "--format", "csv"]).unwrap();
        match args.command() {
            Command::Search(search) => {
                assert_eq!(search.term, "widget");
                assert_eq!(search.format, OutputFormat::Csv);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let args = Args::try_parse_from(["stocklog", "list", "--refresh"]).unwrap();
        match args.command() {
            Command::List(list) => {
                assert!(list.refresh);
                assert_eq!(list.format, OutputFormat::Table);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_add_args_from_json() {
        let args: AddArgs =
            serde_json::from_str(r#"{"name": "볼트", "amount": 3, "category": "outbound"}"#)
                .unwrap();
        assert_eq!(args.category, Category::Outbound);
        assert_eq!(args.amount.to_string(), "3");
        assert!(args.note.is_empty());
    }
}
