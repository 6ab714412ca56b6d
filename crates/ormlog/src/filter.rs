//! Filter predicates
use std::sync::Arc;

use crate::level::LogLevel;

/// Decides, per category and level, whether a record is written
pub type Filter = Arc<dyn Fn(&str, LogLevel) -> bool + Send + Sync>;

/// Categories of the persistence layer itself
///
/// Their diagnostics are emitted while a row is being written; persisting them would write again
/// from inside the write.
pub const RESERVED_CATEGORIES: [&str; 2] = ["ormlog_sql_common", "ormlog_sqlite"];

/// Whether `category` is, or is nested under, one of the [`RESERVED_CATEGORIES`]
pub fn is_reserved(category: &str) -> bool {
    RESERVED_CATEGORIES.iter().any(|reserved| {
        category
            .strip_prefix(reserved)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// Accepts everything; filtering is left to the host pipeline
pub fn always() -> Filter {
    Arc::new(|_, _| true)
}

/// Accepts records at or above `min`
pub fn min_level(min: LogLevel) -> Filter {
    Arc::new(move |_, level| level >= min)
}

/// Wraps a closure into a [`Filter`]
pub fn from_fn<P>(predicate: P) -> Filter
where
    P: Fn(&str, LogLevel) -> bool + Send + Sync + 'static,
{
    Arc::new(predicate)
}
