use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The format of the timestamp column: `YYYY-MM-DD HH:MM:SS`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The moment a record was written, in local time, to the second.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// The current local time with the sub-second part dropped.
    pub fn now() -> Self {
        Self::from(Local::now().naive_local())
    }

    pub fn value(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).map(Self)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Timestamp::from_str("2025-03-01 09:05:07").unwrap();
        assert_eq!(ts.to_string(), "2025-03-01 09:05:07");
    }

    #[test]
    fn test_timestamp_rejects_other_formats() {
        assert!(Timestamp::from_str("2025-03-01").is_err());
        assert!(Timestamp::from_str("03/01/2025 9:05:07").is_err());
        assert!(Timestamp::from_str("2025-03-01T09:05:07").is_err());
        assert!(Timestamp::from_str("").is_err());
    }

    #[test]
    fn test_now_is_well_formed() {
        let now = Timestamp::now();
        assert_eq!(now.value().nanosecond(), 0);
        let s = now.to_string();
        assert_eq!(s.len(), 19);
        assert_eq!(Timestamp::from_str(&s).unwrap(), now);
    }
}
