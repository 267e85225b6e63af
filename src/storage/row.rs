//! Row codec
//!
//! Rows are stored as delimited text, one row per line, values in declared
//! field order. A value is quoted when it is empty or contains a delimiter,
//! a quote, or a line break; quotes inside a quoted value are doubled.

use crate::error::{DbError, Result};
use crate::schema::Row;
use crate::types::{FieldType, Value};

const DELIMITER: char = ',';
const QUOTE: char = '"';

// =============================================================================
// Encoding
// =============================================================================

/// Encode one row, terminated by a newline
pub fn encode_row(row: &[Value]) -> String {
    let mut line = String::new();
    for (i, value) in row.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        push_field(&mut line, &value.to_text());
    }
    line.push('\n');
    line
}

/// Encode a whole page
pub fn encode_rows(rows: &[Row]) -> String {
    rows.iter().map(|r| encode_row(r)).collect()
}

fn push_field(out: &mut String, text: &str) {
    let needs_quotes = text.is_empty()
        || text.contains(|c: char| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');

    if !needs_quotes {
        out.push_str(text);
        return;
    }

    out.push(QUOTE);
    for c in text.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a page's content into typed rows
pub fn decode_rows(content: &str, types: &[FieldType]) -> Result<Vec<Row>> {
    split_records(content)?
        .into_iter()
        .map(|raw| cast_row(raw, types))
        .collect()
}

/// Cast raw text values to their declared types
fn cast_row(raw: Vec<String>, types: &[FieldType]) -> Result<Row> {
    if raw.len() != types.len() {
        return Err(DbError::Corruption(format!(
            "row has {} values, schema declares {}",
            raw.len(),
            types.len()
        )));
    }

    raw.iter()
        .zip(types)
        .map(|(text, ty)| {
            ty.parse_value(text).ok_or_else(|| {
                DbError::Corruption(format!("cannot read {:?} as {}", text, ty))
            })
        })
        .collect()
}

/// Split page content into rows of raw text values
fn split_records(content: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut was_quoted = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    chars.next();
                    field.push(QUOTE);
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            QUOTE if field.is_empty() && !was_quoted => {
                in_quotes = true;
                was_quoted = true;
            }
            DELIMITER => {
                fields.push(std::mem::take(&mut field));
                was_quoted = false;
            }
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
                was_quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DbError::Corruption("unterminated quoted value".to_string()));
    }

    // Last row without a trailing newline
    if !field.is_empty() || was_quoted || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }

    Ok(records)
}
