//! Macros to digest rows read back from a generic SQL database

/// Unpacks a row of columns into individual variables, consuming it and checking that it holds
/// enough columns.
#[macro_export]
macro_rules! unpack_into {
    (let ($($var:ident),+) = $row:expr) => {
        let ($($var),+) = {
            let mut columns = $row.into_iter();
            let required = 0 $(+ {let _ = stringify!($var); 1})+;
            let available = columns.len();
            (
                $(
                    {
                        let _ = stringify!($var);
                        columns
                            .next()
                            .ok_or($crate::ConversionError::MissingColumn(required, available))?
                    }
                ),+
            )
        };
    };
}

/// Parses a SQL column as a string or NULL
#[macro_export]
macro_rules! column_as_nullable_string {
    ($col:expr) => {
        (match $col {
            $crate::stmt::Column::Text(text) => Ok(Some(text)),
            $crate::stmt::Column::Blob(bytes) => {
                Ok(Some(String::from_utf8_lossy(&bytes).to_string()))
            }
            $crate::stmt::Column::Null => Ok(None),
            _ => Err($crate::ConversionError::InvalidType(
                "String".to_owned(),
                stringify!($col).to_owned(),
            )),
        })?
    };
}

/// Parses a SQL column as a string
///
/// With a callback, the text is parsed by it and its error is turned into a
/// [`ConversionError`](crate::ConversionError).
#[macro_export]
macro_rules! column_as_string {
    ($col:expr, $callback:expr) => {
        (match $col {
            $crate::stmt::Column::Text(text) => {
                $callback(&text).map_err($crate::ConversionError::from)
            }
            $crate::stmt::Column::Blob(bytes) => {
                $callback(&String::from_utf8_lossy(&bytes)).map_err($crate::ConversionError::from)
            }
            _ => Err($crate::ConversionError::InvalidType(
                "String".to_owned(),
                stringify!($col).to_owned(),
            )),
        })?
    };
    ($col:expr) => {
        (match $col {
            $crate::stmt::Column::Text(text) => Ok(text),
            $crate::stmt::Column::Blob(bytes) => Ok(String::from_utf8_lossy(&bytes).to_string()),
            _ => Err($crate::ConversionError::InvalidType(
                "String".to_owned(),
                stringify!($col).to_owned(),
            )),
        })?
    };
}

/// Parses a column as a number
#[macro_export]
macro_rules! column_as_number {
    ($col:expr) => {
        (match $col {
            $crate::stmt::Column::Text(text) => text.parse().map_err(|_| {
                $crate::ConversionError::InvalidConversion(
                    stringify!($col).to_owned(),
                    "Number".to_owned(),
                )
            }),
            $crate::stmt::Column::Integer(n) => n.try_into().map_err(|_| {
                $crate::ConversionError::InvalidConversion(
                    stringify!($col).to_owned(),
                    "Number".to_owned(),
                )
            }),
            _ => Err($crate::ConversionError::InvalidType(
                "Number".to_owned(),
                stringify!($col).to_owned(),
            )),
        })?
    };
}

#[cfg(test)]
mod tests {
    use crate::stmt::Column;
    use crate::{ConversionError, Error};

    fn unpack(row: Vec<Column>) -> Result<(String, i32, Option<String>), Error> {
        unpack_into!(let (name, level, detail) = row);
        Ok((
            column_as_string!(name),
            column_as_number!(level),
            column_as_nullable_string!(detail),
        ))
    }

    #[test]
    fn test_unpack_row() {
        let row = vec![
            Column::Text("app".to_owned()),
            Column::Integer(3),
            Column::Null,
        ];

        assert_eq!(
            unpack(row).expect("valid row"),
            ("app".to_owned(), 3, None)
        );
    }

    #[test]
    fn test_unpack_short_row() {
        let row = vec![Column::Text("app".to_owned())];

        assert!(matches!(
            unpack(row),
            Err(Error::Conversion(ConversionError::MissingColumn(3, 1)))
        ));
    }

    #[test]
    fn test_wrong_column_type() {
        let row = vec![Column::Integer(1), Column::Integer(3), Column::Null];

        assert!(matches!(
            unpack(row),
            Err(Error::Conversion(ConversionError::InvalidType(_, _)))
        ));
    }
}
