//! Delimited-text rendering of serializable rows.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Field delimiter of every export.
pub const DELIMITER: char = ',';

const LINE_SEPARATOR: &str = "\n";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize row {index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Rows must serialize to a map of column key to value.
    #[error("row {index} does not serialize to an object")]
    NotAnObject { index: usize },

    #[error("unknown export kind: {0}")]
    UnknownKind(String),
}

/// Render `rows` under a header of `columns`.
///
/// Each row is looked up by column key after serialization. Missing keys and
/// nulls render empty. Text is quoted when it contains the delimiter, a
/// double quote or a line break. Lines are joined with `\n`, without a
/// trailing newline.
pub fn to_delimited_text<T: Serialize>(
    rows: &[T],
    columns: &[&str],
) -> Result<String, ExportError> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(join(columns.iter().map(|c| quote_field(c))));

    for (index, row) in rows.iter().enumerate() {
        let value = serde_json::to_value(row)
            .map_err(|source| ExportError::Serialize { index, source })?;
        let Value::Object(fields) = value else {
            return Err(ExportError::NotAnObject { index });
        };
        lines.push(join(
            columns
                .iter()
                .map(|c| fields.get(*c).map(render_value).unwrap_or_default()),
        ));
    }

    Ok(lines.join(LINE_SEPARATOR))
}

/// Quote `field` if it would otherwise break the row; inner quotes are doubled.
pub fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([DELIMITER, '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn render_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => quote_field(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        nested => Cow::Owned(quote_field(&nested.to_string()).into_owned()),
    }
}

fn join<'a>(fields: impl Iterator<Item = Cow<'a, str>>) -> String {
    let mut line = String::new();
    for (i, field) in fields.enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&field);
    }
    line
}
