//! Data models for the attendance dataset.
//!
//! - `Record`: one CSV row (name, group, ..., attendance marks)
//! - `Dataset`: raw CSV bytes plus fetch/change timestamps
//! - `SearchMode`: which field a query is matched against

pub mod dataset;
pub mod search_mode;

pub use dataset::{Dataset, Record};
pub use search_mode::{ParseSearchModeError, SearchMode};
