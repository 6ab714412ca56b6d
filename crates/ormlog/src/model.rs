//! Table shape shared by every log row
use ormlog_sql_common::EntityBuilder;

use crate::log::LogKey;

/// Longest category name stored in the `name` column
pub const MAX_NAME_LENGTH: usize = 255;

/// Declares the primary key and the bounded `name` column of a log row
///
/// Call it from [`Entity::configure`](ormlog_sql_common::Entity::configure) after the row's own
/// columns are declared, so their order is kept.
pub fn build<K: LogKey>(builder: &mut EntityBuilder) {
    builder.property("id").of_type(K::COLUMN_TYPE);
    builder.has_key("id", K::GENERATED);
    builder.property("name").has_max_length(MAX_NAME_LENGTH);
}
