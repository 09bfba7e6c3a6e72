use serde::{Deserialize, Serialize};

/// The kind of inventory event a record describes.
///
/// The Korean labels are what is written to, and expected in, the sheet. The English names are
/// accepted as input for convenience.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub enum Category {
    /// Goods received.
    #[serde(rename = "입고", alias = "inbound", alias = "Inbound")]
    Inbound,
    /// Goods shipped or consumed.
    #[serde(rename = "출고", alias = "outbound", alias = "Outbound")]
    Outbound,
    /// Anything else, e.g. a stock count correction.
    #[default]
    #[serde(rename = "기타", alias = "other", alias = "Other")]
    Other,
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

impl Category {
    pub const ALL: [Category; 3] = [Category::Inbound, Category::Outbound, Category::Other];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Inbound.to_string(), "입고");
        assert_eq!(Category::Outbound.to_string(), "출고");
        assert_eq!(Category::Other.to_string(), "기타");
    }

    #[test]
    fn test_category_from_str() {
        for c in Category::ALL {
            assert_eq!(c.to_string().parse::<Category>().unwrap(), c);
        }
        assert_eq!("inbound".parse::<Category>().unwrap(), Category::Inbound);
        assert_eq!("Outbound".parse::<Category>().unwrap(), Category::Outbound);
        assert!("returns".parse::<Category>().is_err());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_json() {
        let json = serde_json::to_string(&Category::Inbound).unwrap();
        assert_eq!(json, "\"입고\"");
        let c: Category = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(c, Category::Other);
    }
}
