//! The `list` and `search` views, and the rendering of records as a table, JSON or CSV.

use crate::args::{ListArgs, SearchArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult, Res};
use crate::inventory::Inventory;
use crate::model::{Column, Record, Records, SearchTerm};
use crate::Result;
use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

const NO_DATA: &str = "No data.";
const NO_RESULTS: &str = "No results.";

/// How rows are rendered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A markdown table.
    #[default]
    Table,
    /// An array of objects, one per record.
    Json,
    /// Comma separated values with a header line.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Records in the requested output format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// JSON array of objects where each row is a self-describing object with column names as keys.
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({v:?})"),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{s}")
                } else {
                    write!(f, "{v:?}")
                }
            }
            Rows::Table(s) => write!(f, "{s}"),
            Rows::Csv(s) => write!(f, "{s}"),
        }
    }
}

impl Rows {
    /// Renders `records` in `format`.
    pub fn render(records: &[Record], format: OutputFormat) -> Res<Self> {
        Ok(match format {
            OutputFormat::Table => Rows::Table(markdown_table(records)),
            OutputFormat::Json => Rows::Json(serde_json::Value::Array(
                records.iter().map(json_object).collect(),
            )),
            OutputFormat::Csv => Rows::Csv(csv_text(records)?),
        })
    }
}

/// Distinguishes an empty worksheet from a search that matched nothing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Data,
    NoData,
    NoResults,
}

serde_plain::derive_display_from_serialize!(ViewStatus);

/// The outcome of `list` or `search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub status: ViewStatus,
    pub count: usize,
    /// Worksheet rows left out because they could not be read.
    pub skipped: usize,
    pub rows: Rows,
}

impl View {
    /// Builds the view for `list`, or for `search` when `term` is given. `all` is everything that
    /// was read from the worksheet and `shown` are the records to display.
    fn new(
        all: &Records,
        shown: &[Record],
        term: Option<&SearchTerm>,
        format: OutputFormat,
    ) -> Res<Out<View>> {
        let (status, mut message) = if all.is_empty() {
            (ViewStatus::NoData, NO_DATA.to_string())
        } else if shown.is_empty() {
            (ViewStatus::NoResults, NO_RESULTS.to_string())
        } else {
            let count = shown.len();
            let message = match term {
                Some(term) => format!("{count} records matched '{}'.", term.as_str()),
                None => format!("Found {count} records."),
            };
            (ViewStatus::Data, message)
        };
        let skipped = all.skipped().len();
        if skipped > 0 {
            message.push_str(&format!(" Skipped {skipped} unreadable rows."));
        }
        let view = View {
            status,
            count: shown.len(),
            skipped,
            rows: Rows::render(shown, format)?,
        };
        Ok(Out::new(message, view))
    }
}

/// Shows every record.
pub async fn list(inventory: &Inventory, args: ListArgs) -> Result<Out<View>> {
    let records = if args.refresh {
        inventory.refresh().await?
    } else {
        inventory.load_all().await?
    };
    View::new(&records, records.data(), None, args.format).pub_result(ErrorType::Store)
}

/// Shows the records whose name contains `args.term`, ignoring case.
pub async fn search(inventory: &Inventory, args: SearchArgs) -> Result<Out<View>> {
    let term = SearchTerm::new(args.term).pub_result(ErrorType::Validation)?;
    let records = inventory.load_all().await?;
    let found = records.matching(&term);
    View::new(&records, &found, Some(&term), args.format).pub_result(ErrorType::Store)
}

fn cells(record: &Record) -> [String; 5] {
    [
        record.timestamp().to_string(),
        record.name().to_string(),
        record.amount().to_string(),
        record.category().to_string(),
        record.note().to_string(),
    ]
}

fn markdown_table(records: &[Record]) -> String {
    fn line(cells: &[String]) -> String {
        let escaped: Vec<String> = cells
            .iter()
            .map(|c| c.replace('|', "\\|").replace(['\r', '\n'], " "))
            .collect();
        format!("| {} |\n", escaped.join(" | "))
    }

    let mut table = line(&Column::headers());
    table.push_str(&line(&vec!["---".to_string(); Column::ALL.len()]));
    for record in records {
        table.push_str(&line(&cells(record)));
    }
    table
}

fn json_object(record: &Record) -> serde_json::Value {
    let mut object = serde_json::Map::new();
    for (header, value) in record.other_fields() {
        object.insert(header.clone(), value.clone().into());
    }
    for column in Column::ALL {
        let value = match column {
            Column::Timestamp => record.timestamp().to_string().into(),
            Column::Name => record.name().into(),
            Column::Amount => record.amount().to_json(),
            Column::Category => record.category().to_string().into(),
            Column::Note => record.note().into(),
        };
        object.insert(column.to_string(), value);
    }
    serde_json::Value::Object(object)
}

fn csv_text(records: &[Record]) -> Res<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(Column::headers())?;
    for record in records {
        writer.write_record(cells(record))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish writing CSV: {e}"))?;
    String::from_utf8(bytes).context("The CSV output is not UTF-8")
}
