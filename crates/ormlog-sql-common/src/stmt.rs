//! Statements mod
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::database::DatabaseExecutor;
use crate::value::Value;
use crate::Error;

/// The Column type
pub type Column = Value;

/// Expected response type for a given SQL statement
#[derive(Debug, Clone, Copy, Default)]
pub enum ExpectedSqlResponse {
    /// A single row
    SingleRow,
    /// All the rows that matches a query
    #[default]
    ManyRows,
    /// How many rows were affected by the query
    AffectedRows,
    /// Return the first column of the first row
    Pluck,
    /// Batch
    Batch,
}

/// SQL Part
#[derive(Debug, Clone)]
pub enum SqlPart {
    /// Raw SQL statement
    Raw(Arc<str>),
    /// Placeholder
    Placeholder(Arc<str>, Option<Value>),
}

/// SQL parser error
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SqlParseError {
    /// Invalid SQL
    #[error("Unterminated String literal")]
    UnterminatedStringLiteral,
    /// Invalid placeholder name
    #[error("Invalid placeholder name")]
    InvalidPlaceholder,
}

/// Rudimentary SQL parser.
///
/// This function does not validate the SQL statement, it only extracts the `:name` placeholders so
/// statements stay database agnostic. Quoted literals are copied verbatim, a doubled quote inside a
/// literal is an escaped quote.
pub fn split_sql_parts(input: &str) -> Result<Vec<SqlPart>, SqlParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                current.push(c);

                let mut closed = false;
                while let Some(next) = chars.next() {
                    current.push(next);

                    if next == c {
                        if chars.next_if_eq(&c).is_some() {
                            current.push(c);
                        } else {
                            closed = true;
                            break;
                        }
                    }
                }

                if !closed {
                    return Err(SqlParseError::UnterminatedStringLiteral);
                }
            }

            ':' => {
                if !current.is_empty() {
                    parts.push(SqlPart::Raw(std::mem::take(&mut current).into()));
                }

                let mut name = String::new();
                while let Some(next) = chars.next_if(|n| n.is_alphanumeric() || *n == '_') {
                    name.push(next);
                }

                if name.is_empty() {
                    return Err(SqlParseError::InvalidPlaceholder);
                }

                parts.push(SqlPart::Placeholder(name.into(), None));
            }

            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        parts.push(SqlPart::Raw(current.into()));
    }

    Ok(parts)
}

type Cache = HashMap<String, Vec<SqlPart>>;

/// Sql message
#[derive(Debug, Default)]
pub struct Statement {
    /// The SQL statement
    pub parts: Vec<SqlPart>,
    /// The expected response type
    pub expected_response: ExpectedSqlResponse,
}

impl Statement {
    /// Creates a new statement, reusing the parsed parts of an identical SQL string
    fn new(sql: &str, cache: &RwLock<Cache>) -> Result<Self, SqlParseError> {
        let parsed = cache
            .read()
            .map(|cache| cache.get(sql).cloned())
            .ok()
            .flatten();

        let parts = match parsed {
            Some(parts) => parts,
            None => {
                let parts = split_sql_parts(sql)?;

                if let Ok(mut cache) = cache.write() {
                    cache.insert(sql.to_owned(), parts.clone());
                } else {
                    tracing::warn!("Failed to acquire write lock for SQL statement cache");
                }

                parts
            }
        };

        Ok(Self {
            parts,
            ..Default::default()
        })
    }

    /// Convert Statement into a SQL statement and the list of placeholder values
    ///
    /// Placeholders are rendered as `$1..$n`, in order of appearance.
    pub fn to_sql(self) -> Result<(String, Vec<Value>), Error> {
        let mut placeholder_values = Vec::new();
        let sql = self
            .parts
            .into_iter()
            .map(|part| match part {
                SqlPart::Placeholder(name, value) => {
                    placeholder_values
                        .push(value.ok_or_else(|| Error::MissingPlaceholder(name.to_string()))?);
                    Ok(format!("${}", placeholder_values.len()))
                }
                SqlPart::Raw(raw) => Ok(raw.trim().to_string()),
            })
            .collect::<Result<Vec<String>, Error>>()?
            .join(" ");

        Ok((sql, placeholder_values))
    }

    /// Binds a given placeholder to a value.
    #[inline]
    pub fn bind<C, V>(mut self, name: C, value: V) -> Self
    where
        C: AsRef<str>,
        V: Into<Value>,
    {
        let name = name.as_ref();
        let value = value.into();

        for part in self.parts.iter_mut() {
            if let SqlPart::Placeholder(part_name, part_value) = part {
                if **part_name == *name {
                    *part_value = Some(value.clone());
                }
            }
        }

        self
    }

    /// Executes a query and returns the first column of the first row
    pub fn pluck<C>(self, conn: &C) -> Result<Option<Value>, Error>
    where
        C: DatabaseExecutor + ?Sized,
    {
        conn.pluck(self)
    }

    /// Executes the statement as a batch, without placeholders
    pub fn batch<C>(self, conn: &C) -> Result<(), Error>
    where
        C: DatabaseExecutor + ?Sized,
    {
        conn.batch(self)
    }

    /// Executes a query and returns the affected rows
    pub fn execute<C>(self, conn: &C) -> Result<usize, Error>
    where
        C: DatabaseExecutor + ?Sized,
    {
        conn.execute(self)
    }

    /// Runs the query and returns the first row or None
    pub fn fetch_one<C>(self, conn: &C) -> Result<Option<Vec<Column>>, Error>
    where
        C: DatabaseExecutor + ?Sized,
    {
        conn.fetch_one(self)
    }

    /// Runs the query and returns all the rows
    pub fn fetch_all<C>(self, conn: &C) -> Result<Vec<Vec<Column>>, Error>
    where
        C: DatabaseExecutor + ?Sized,
    {
        conn.fetch_all(self)
    }
}

/// Creates a new query statement
#[inline(always)]
pub fn query(sql: &str) -> Result<Statement, Error> {
    static CACHE: Lazy<RwLock<Cache>> = Lazy::new(|| RwLock::new(HashMap::new()));
    Statement::new(sql, &CACHE).map_err(|e| Error::Database(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_placeholders() {
        let parts = split_sql_parts("SELECT * FROM logs WHERE name = :name AND level >= :level")
            .expect("valid sql");

        let names = parts
            .iter()
            .filter_map(|part| match part {
                SqlPart::Placeholder(name, _) => Some(name.to_string()),
                SqlPart::Raw(_) => None,
            })
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["name".to_owned(), "level".to_owned()]);
    }

    #[test]
    fn test_colon_inside_literal_is_not_a_placeholder() {
        let parts = split_sql_parts("SELECT 'a:b', 'it''s' FROM logs").expect("valid sql");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_unterminated_literal() {
        assert_eq!(
            split_sql_parts("SELECT 'oops FROM logs").unwrap_err(),
            SqlParseError::UnterminatedStringLiteral
        );
    }

    #[test]
    fn test_empty_placeholder_name() {
        assert_eq!(
            split_sql_parts("SELECT * FROM logs WHERE id = :").unwrap_err(),
            SqlParseError::InvalidPlaceholder
        );
    }

    #[test]
    fn test_to_sql_renders_positional_placeholders() {
        let (sql, values) = query("INSERT INTO logs (name, level) VALUES (:name, :level)")
            .expect("valid sql")
            .bind("name", "Configure")
            .bind("level", 2)
            .to_sql()
            .expect("all placeholders bound");

        assert_eq!(sql, "INSERT INTO logs (name, level) VALUES ( $1 , $2 )");
        assert_eq!(
            values,
            vec![Value::Text("Configure".to_owned()), Value::Integer(2)]
        );
    }

    #[test]
    fn test_to_sql_missing_placeholder() {
        let err = query("SELECT * FROM logs WHERE id = :id")
            .expect("valid sql")
            .to_sql()
            .unwrap_err();

        assert!(matches!(err, Error::MissingPlaceholder(name) if name == "id"));
    }
}
