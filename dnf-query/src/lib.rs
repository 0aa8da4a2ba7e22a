//! The lazy filter-pipeline query layer (§4.5) and the selector it builds
//! on (§4.3, merged here since a selector is just a small, validated
//! conjunction of the same filter vocabulary).

mod filter;
mod query;
mod selector;

pub use filter::{ComparisonKind, Filter, FilterKey, FilterValue};
pub use query::Query;
pub use selector::{arch_preference, Selector};
