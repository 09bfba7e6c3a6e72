use crate::error::Res;
use crate::model::{Amount, Category, Column, Mapping, Timestamp};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// Represents a single logged inventory event, i.e. one row of the worksheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    pub(crate) timestamp: Timestamp,
    pub(crate) name: String,
    pub(crate) amount: Amount,
    pub(crate) category: Category,
    pub(crate) note: String,
    /// Values from columns we do not know about, keyed by header.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) other_fields: BTreeMap<String, String>,
}

impl Record {
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }

    /// The row as it is appended to a worksheet whose header is `mapping`. Each value goes under
    /// its own header and every other cell is left empty. A column may be missing from the header
    /// only when the value is one a read would fill in anyway, i.e. a zero amount or an empty note.
    pub(crate) fn to_row(&self, mapping: &Mapping) -> Res<Vec<serde_json::Value>> {
        mapping.require(&Column::REQUIRED)?;
        let mut row = Vec::new();
        for column in Column::ALL {
            let (value, blank) = match column {
                Column::Timestamp => (self.timestamp.to_string().into(), false),
                Column::Name => (self.name.clone().into(), false),
                Column::Amount => (self.amount.to_json(), self.amount.is_zero()),
                Column::Category => (self.category.to_string().into(), false),
                Column::Note => (self.note.clone().into(), self.note.is_empty()),
            };
            match mapping.index_of(column) {
                Some(ix) => {
                    if row.len() <= ix {
                        row.resize(ix + 1, serde_json::Value::Null);
                    }
                    row[ix] = value;
                }
                None if blank => {}
                None => bail!(
                    "The header row has no '{}' column to hold the {column} '{value}'",
                    column.header()
                ),
            }
        }
        Ok(row)
    }

    /// Parses one data row using the header `mapping`. Missing trailing cells are treated as
    /// blank.
    fn parse(mapping: &Mapping, values: Vec<String>) -> Res<Self> {
        let mut timestamp = None;
        let mut name = String::new();
        let mut amount = Amount::default();
        let mut category = None;
        let mut note = String::new();
        let mut other_fields = BTreeMap::new();

        for (ix, value) in values.into_iter().enumerate() {
            match mapping.column(ix) {
                Some(Column::Timestamp) => {
                    timestamp = Some(
                        Timestamp::from_str(&value)
                            .with_context(|| format!("Invalid timestamp '{value}'"))?,
                    )
                }
                Some(Column::Name) => name = value,
                Some(Column::Amount) => {
                    amount = Amount::from_str(&value)
                        .with_context(|| format!("Invalid amount '{value}'"))?
                }
                Some(Column::Category) => {
                    category = Some(
                        Category::from_str(value.trim())
                            .with_context(|| format!("Invalid category '{value}'"))?,
                    )
                }
                Some(Column::Note) => note = value,
                None => {
                    let header = &mapping.headers()[ix];
                    if !header.trim().is_empty() {
                        other_fields.insert(header.clone(), value);
                    }
                }
            }
        }

        Ok(Self {
            timestamp: timestamp.context("The timestamp is missing")?,
            name,
            amount,
            category: category.context("The category is missing")?,
            note,
            other_fields,
        })
    }
}

/// The writer's input: a record that has not yet been given a timestamp.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub amount: Amount,
    pub category: Category,
    pub note: String,
}

impl Entry {
    pub fn new(
        name: impl Into<String>,
        amount: Amount,
        category: Category,
        note: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            category,
            note: note.into(),
        }
    }
}

/// All rows of the worksheet, parsed into records using the header row.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Records {
    mapping: Mapping,
    data: Vec<Record>,
    /// Sheet row numbers (1-based) of the rows that could not be read.
    skipped: Vec<usize>,
}

impl Records {
    /// Given the downloaded rows of a worksheet, treat the first row as the header and parse the
    /// rest into records. An empty worksheet, or one with only a header row, has no records.
    ///
    /// A header that cannot be used is an error. A data row that cannot be parsed is skipped with
    /// a warning and its row number is kept in [`Records::skipped`].
    pub fn parse<S, R, I>(rows: I) -> Res<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        let mut rows = rows.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row)?,
            None => return Ok(Self::default()),
        };

        let mut data = Vec::new();
        let mut skipped = Vec::new();
        let mut header_checked = false;
        for (row_ix, row) in rows.enumerate() {
            // Sheet rows are 1-based and the header occupies the first one.
            let sheet_row = row_ix + 2;
            let values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            if !header_checked {
                mapping
                    .require(&Column::REQUIRED)
                    .context("Unable to parse the worksheet")?;
                header_checked = true;
            }
            if values.len() > mapping.len() {
                warn!("Skipping row {sheet_row}, it is longer than the header row");
                skipped.push(sheet_row);
                continue;
            }
            match Record::parse(&mapping, values) {
                Ok(record) => data.push(record),
                Err(e) => {
                    warn!("Skipping row {sheet_row}: {e:#}");
                    skipped.push(sheet_row);
                }
            }
        }
        Ok(Self {
            mapping,
            data,
            skipped,
        })
    }

    pub fn data(&self) -> &[Record] {
        &self.data
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The sheet row numbers of rows that were skipped because they could not be read.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The records whose name contains `term`, ignoring case, in sheet order.
    pub fn matching(&self, term: &SearchTerm) -> Vec<Record> {
        self.data
            .iter()
            .filter(|r| term.matches(&r.name))
            .cloned()
            .collect()
    }
}

/// A non-empty search term for a case-insensitive substring match on the name.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SearchTerm {
    original: String,
    lowercase: String,
}

impl SearchTerm {
    pub fn new(term: impl Into<String>) -> Res<Self> {
        let original = term.into();
        if original.is_empty() {
            bail!("A search term is required")
        }
        let lowercase = original.to_lowercase();
        Ok(Self {
            original,
            lowercase,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn rows() -> Vec<Vec<&'static str>> {
        vec![
            vec!["일시", "품목명/이름", "수량/금액", "카테고리", "비고"],
            vec!["2025-01-02 09:00:00", "Widget A", "10", "입고", ""],
            vec!["2025-01-02 10:30:00", "widget b", "1,200", "출고", "to store 3"],
            vec!["", "", "", "", ""],
            vec!["2025-01-03 08:15:00", "볼트 M8", "", "기타"],
        ]
    }

    #[test]
    fn test_parse_records() {
        let records = Records::parse(rows()).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records.data()[0];
        assert_eq!(first.timestamp().to_string(), "2025-01-02 09:00:00");
        assert_eq!(first.name(), "Widget A");
        assert_eq!(first.amount().to_string(), "10");
        assert_eq!(first.category(), Category::Inbound);
        assert_eq!(first.note(), "");

        let second = &records.data()[1];
        assert_eq!(second.amount().value(), Decimal::from(1200));
        assert_eq!(second.category(), Category::Outbound);
        assert_eq!(second.note(), "to store 3");

        // short row, blank amount
        let third = &records.data()[2];
        assert!(third.amount().is_zero());
        assert_eq!(third.note(), "");
    }

    #[test]
    fn test_parse_empty_worksheet() {
        let records = Records::parse(Vec::<Vec<String>>::new()).unwrap();
        assert!(records.is_empty());
        assert!(records.mapping().is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let records = Records::parse(vec![Column::headers()]).unwrap();
        assert!(records.is_empty());
        assert_eq!(records.mapping().len(), 5);
    }

    #[test]
    fn test_parse_extra_columns() {
        let records = Records::parse(vec![
            vec!["Timestamp", "Name", "Category", "Location"],
            vec!["2025-01-02 09:00:00", "Widget A", "inbound", "A-1"],
        ])
        .unwrap();
        let record = &records.data()[0];
        assert_eq!(record.other_fields().get("Location").unwrap(), "A-1");
        assert!(record.amount().is_zero());
    }

    #[test]
    fn test_parse_skips_bad_rows() {
        let records = Records::parse(vec![
            vec!["일시", "품목명/이름", "수량/금액", "카테고리", "비고"],
            vec!["2025-01-02 09:00:00", "Widget A", "10", "입고", ""],
            vec!["2/1/2025", "Widget B", "10", "입고", ""],
            vec!["2025-01-02 09:00:00", "Widget C", "₩1,200", "출고", ""],
            vec!["2025-01-02 09:00:00", "Widget D", "3", "반품", ""],
            vec!["2025-01-02 09:00:00", "Widget E", "3", "기타", "", "extra"],
            vec!["2025-01-04 11:00:00", "Widget F", "1,000", "출고", ""],
        ])
        .unwrap();
        let names: Vec<&str> = records.data().iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Widget A", "Widget F"]);
        assert_eq!(records.skipped(), &[3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_all_rows_bad() {
        let records = Records::parse(vec![
            vec!["일시", "품목명/이름", "카테고리"],
            vec!["yesterday", "Widget A", "입고"],
        ])
        .unwrap();
        assert!(records.is_empty());
        assert_eq!(records.skipped(), &[2]);
    }

    #[test]
    fn test_parse_missing_required_column() {
        let err = Records::parse(vec![
            vec!["일시", "Item", "카테고리"],
            vec!["2025-01-02 09:00:00", "Widget A", "입고"],
        ])
        .unwrap_err();
        assert!(format!("{err:#}").contains("품목명/이름"));

        // no data rows, nothing to complain about
        assert!(Records::parse(vec![vec!["일시", "Item"]]).is_ok());
    }

    #[test]
    fn test_search_term() {
        assert!(SearchTerm::new("").is_err());
        let term = SearchTerm::new("WIDGET").unwrap();
        assert_eq!(term.as_str(), "WIDGET");
        assert!(term.matches("Widget A"));
        assert!(term.matches("big widget"));
        assert!(!term.matches("Gadget"));
    }

    #[test]
    fn test_search_term_is_literal() {
        let term = SearchTerm::new("a.c").unwrap();
        assert!(term.matches("A.C. adapter"));
        assert!(!term.matches("abc"));
    }

    #[test]
    fn test_matching() {
        let records = Records::parse(rows()).unwrap();
        let term = SearchTerm::new("widget").unwrap();
        let found = records.matching(&term);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| term.matches(r.name())));
        let zzz = SearchTerm::new("zzz").unwrap();
        assert!(records.matching(&zzz).is_empty());
        let korean = SearchTerm::new("볼트").unwrap();
        assert_eq!(records.matching(&korean).len(), 1);
    }

    #[test]
    fn test_to_row() {
        let records = Records::parse(rows()).unwrap();
        let row = records.data()[1].to_row(records.mapping()).unwrap();
        assert_eq!(
            row,
            vec![
                serde_json::json!("2025-01-02 10:30:00"),
                serde_json::json!("widget b"),
                serde_json::json!(1200),
                serde_json::json!("출고"),
                serde_json::json!("to store 3"),
            ]
        );
    }

    #[test]
    fn test_to_row_follows_header() {
        let records = Records::parse(rows()).unwrap();
        let record = &records.data()[1];
        let mapping = Mapping::new(vec![
            "Location",
            "Name",
            "Category",
            "",
            "Amount",
            "Note",
            "Timestamp",
        ])
        .unwrap();
        let row = record.to_row(&mapping).unwrap();
        assert_eq!(
            row,
            vec![
                serde_json::Value::Null,
                serde_json::json!("widget b"),
                serde_json::json!("출고"),
                serde_json::Value::Null,
                serde_json::json!(1200),
                serde_json::json!("to store 3"),
                serde_json::json!("2025-01-02 10:30:00"),
            ]
        );
    }

    #[test]
    fn test_to_row_missing_columns() {
        let records = Records::parse(rows()).unwrap();
        let mapping = Mapping::new(vec!["Timestamp", "Name", "Category"]).unwrap();

        // zero amount and empty note have nowhere to go, which is fine
        let row = records.data()[2].to_row(&mapping).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row[2], serde_json::json!("기타"));

        // a quantity would be lost
        let err = records.data()[1].to_row(&mapping).unwrap_err();
        assert!(err.to_string().contains("수량/금액"));

        let mapping = Mapping::new(vec!["Timestamp", "Name", "Amount"]).unwrap();
        assert!(records.data()[2].to_row(&mapping).is_err());
    }
}
