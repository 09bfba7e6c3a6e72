use crate::error::Res;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The columns this program knows about, in the order in which a record is written.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Timestamp,
    Name,
    Amount,
    Category,
    Note,
}

serde_plain::derive_display_from_serialize!(Column);

impl Column {
    /// The write order: `[timestamp, name, amount, category, note]`.
    pub const ALL: [Column; 5] = [
        Column::Timestamp,
        Column::Name,
        Column::Amount,
        Column::Category,
        Column::Note,
    ];

    /// The columns a worksheet must have before records can be read from or written to it.
    pub const REQUIRED: [Column; 3] = [Column::Timestamp, Column::Name, Column::Category];

    /// The header written to an empty worksheet.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Timestamp => TIMESTAMP_STR,
            Column::Name => NAME_STR,
            Column::Amount => AMOUNT_STR,
            Column::Category => CATEGORY_STR,
            Column::Note => NOTE_STR,
        }
    }

    /// Recognizes both the Korean headers and their English equivalents.
    pub fn from_header(header: impl AsRef<str>) -> Option<Column> {
        let header = header.as_ref().trim();
        match header {
            TIMESTAMP_STR => return Some(Column::Timestamp),
            NAME_STR => return Some(Column::Name),
            AMOUNT_STR => return Some(Column::Amount),
            CATEGORY_STR => return Some(Column::Category),
            NOTE_STR => return Some(Column::Note),
            _ => {}
        }
        match header.to_lowercase().as_str() {
            "timestamp" => Some(Column::Timestamp),
            "name" => Some(Column::Name),
            "amount" => Some(Column::Amount),
            "category" => Some(Column::Category),
            "note" => Some(Column::Note),
            _ => None,
        }
    }

    /// The default header row.
    pub fn headers() -> Vec<String> {
        Column::ALL.iter().map(|c| c.header().to_string()).collect()
    }
}

const TIMESTAMP_STR: &str = "일시";
const NAME_STR: &str = "품목명/이름";
const AMOUNT_STR: &str = "수량/금액";
const CATEGORY_STR: &str = "카테고리";
const NOTE_STR: &str = "비고";

/// The header row of a worksheet, resolved to known columns where possible.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Mapping {
    headers: Vec<String>,
    columns: Vec<Option<Column>>,
}

impl Mapping {
    /// Create a new `Mapping` from the header row. Blank headers are allowed, duplicate non-blank
    /// headers are not, and neither are two headers that resolve to the same column.
    pub fn new<S, I>(headers: I) -> Res<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let headers: Vec<String> = headers.into_iter().map(|s| s.into()).collect();

        let mut seen = HashSet::new();
        for header in headers.iter().filter(|h| !h.trim().is_empty()) {
            if !seen.insert(header.trim()) {
                bail!("Encountered a duplicate header '{header}'")
            }
        }

        let columns: Vec<Option<Column>> = headers.iter().map(Column::from_header).collect();
        let mut seen = HashSet::new();
        for column in columns.iter().flatten() {
            if !seen.insert(*column) {
                bail!("Two headers refer to the same '{column}' column")
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The known column at `index`, if the header there is one we recognize.
    pub fn column(&self, index: usize) -> Option<Column> {
        self.columns.get(index).copied().flatten()
    }

    pub fn contains(&self, column: Column) -> bool {
        self.columns.contains(&Some(column))
    }

    /// The index of the header that resolves to `column`.
    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|c| *c == Some(column))
    }

    /// Errors if any of `required` has no header.
    pub fn require(&self, required: &[Column]) -> Res<()> {
        for column in required {
            if !self.contains(*column) {
                bail!(
                    "The header row is missing the '{}' column (expected a header named '{}')",
                    column,
                    column.header()
                )
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_korean_headers() {
        let mapping = Mapping::new(Column::headers()).unwrap();
        assert_eq!(mapping.len(), 5);
        for (ix, column) in Column::ALL.iter().enumerate() {
            assert_eq!(mapping.column(ix), Some(*column));
        }
        assert!(mapping.require(&Column::ALL).is_ok());
    }

    #[test]
    fn test_mapping_english_headers_and_extras() {
        let mapping = Mapping::new(vec!["Timestamp", "NAME", "Location", "", "category"]).unwrap();
        assert_eq!(mapping.column(0), Some(Column::Timestamp));
        assert_eq!(mapping.column(1), Some(Column::Name));
        assert_eq!(mapping.column(2), None);
        assert_eq!(mapping.column(3), None);
        assert_eq!(mapping.column(4), Some(Column::Category));
        assert_eq!(mapping.column(99), None);
        assert_eq!(mapping.index_of(Column::Category), Some(4));
        assert_eq!(mapping.index_of(Column::Amount), None);
        assert!(!mapping.contains(Column::Amount));
        assert!(mapping
            .require(&Column::REQUIRED)
            .is_ok());
        let err = mapping.require(&[Column::Note]).unwrap_err();
        assert!(err.to_string().contains("비고"));
    }

    #[test]
    fn test_mapping_duplicates() {
        assert!(Mapping::new(vec!["Location", "Location"]).is_err());
        assert!(Mapping::new(vec!["Name", "품목명/이름"]).is_err());
        assert!(Mapping::new(vec!["", ""]).is_ok());
    }
}
