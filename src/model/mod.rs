//! Types that represent the core data model, such as `Record` and `Category`.
mod amount;
mod category;
mod mapping;
mod record;
mod timestamp;

pub use amount::{Amount, AmountError};
pub use category::Category;
pub use mapping::{Column, Mapping};
pub use record::{Entry, Record, Records, SearchTerm};
pub use timestamp::{Timestamp, TIMESTAMP_FORMAT};
