//! Row extraction from MySQL-style `INSERT INTO` dumps.
//!
//! Only the subset the reference dumps use is understood: one or more
//! `INSERT INTO `table` [(cols)] VALUES (...), (...);` statements with
//! single-quoted strings, bare numbers and `NULL`.

use super::types::{CityRow, DistrictRow};
use regex::Regex;
use std::sync::OnceLock;

pub const CITY_FIELDS: usize = 11;
pub const DISTRICT_FIELDS: usize = 5;

/// A single value inside a VALUES tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Text(String),
}

impl SqlValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s),
        }
    }

    fn into_text(self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => Some(s),
        }
    }
}

fn insert_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"(?i)INSERT\s+INTO\s+`?(\w+)`?\s*(?:\([^)]*\)\s*)?VALUES")
            .expect("static regex")
    })
}

/// Every VALUES tuple of every INSERT statement targeting `table`, in
/// source order.
pub fn parse_inserts(dump: &str, table: &str) -> Vec<Vec<SqlValue>> {
    let mut rows = Vec::new();
    let mut from = 0;

    while let Some(caps) = insert_header().captures_at(dump, from) {
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(dump.len());
        let target = caps.get(1).map(|m| m.as_str()).unwrap_or("");

        let end = if target.eq_ignore_ascii_case(table) {
            scan_tuples(dump, whole, &mut rows)
        } else {
            scan_tuples(dump, whole, &mut Vec::new())
        };
        from = end.max(whole);
    }
    rows
}

/// Walk `(...), (...);` from `start`. Returns the byte offset just past the
/// terminating semicolon (or end of input).
fn scan_tuples(src: &str, start: usize, out: &mut Vec<Vec<SqlValue>>) -> usize {
    let bytes = src.as_bytes();
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                let (tuple, next) = scan_tuple(src, i + 1);
                out.push(tuple);
                i = next;
            }
            b';' => return i + 1,
            _ => i += 1,
        }
    }
    i
}

/// Parse one tuple body starting after `(`. Returns the values and the
/// offset after the closing `)`.
fn scan_tuple(src: &str, start: usize) -> (Vec<SqlValue>, usize) {
    let mut values = Vec::new();
    let mut chars = src[start..].char_indices().peekable();
    let mut field = String::new();
    let mut quoted = false;
    let mut in_quotes = false;

    while let Some((off, c)) = chars.next() {
        if in_quotes {
            match c {
                '\\' => {
                    if let Some((_, esc)) = chars.next() {
                        field.push(match esc {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '0' => '\0',
                            other => other,
                        });
                    }
                }
                '\'' => {
                    if matches!(chars.peek(), Some((_, '\''))) {
                        chars.next();
                        field.push('\'');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '\'' => {
                in_quotes = true;
                quoted = true;
            }
            ',' => values.push(finish_field(&mut field, &mut quoted)),
            ')' => {
                values.push(finish_field(&mut field, &mut quoted));
                return (values, start + off + 1);
            }
            c if c.is_whitespace() => {}
            _ => field.push(c),
        }
    }

    // Unterminated tuple: keep what was read.
    values.push(finish_field(&mut field, &mut quoted));
    (values, src.len())
}

fn finish_field(field: &mut String, quoted: &mut bool) -> SqlValue {
    let raw = std::mem::take(field);
    let was_quoted = std::mem::replace(quoted, false);
    if !was_quoted && raw.eq_ignore_ascii_case("NULL") {
        SqlValue::Null
    } else {
        SqlValue::Text(raw)
    }
}

fn int_field(v: &SqlValue) -> Option<i64> {
    v.as_text()?.trim().parse().ok()
}

/// `NULL` → `Some(None)`; a number → `Some(Some(x))`; garbage → `None`.
fn float_field(v: &SqlValue) -> Option<Option<f64>> {
    match v {
        SqlValue::Null => Some(None),
        SqlValue::Text(s) => s.trim().parse().ok().map(Some),
    }
}

/// Map a `cities` tuple to a row. Short tuples and unparseable numerics
/// yield `None`.
pub fn city_row(values: Vec<SqlValue>) -> Option<CityRow> {
    if values.len() < CITY_FIELDS {
        return None;
    }
    let id = int_field(&values[0])?;
    let district_id = int_field(&values[1])?;
    let latitude = float_field(&values[9])?;
    let longitude = float_field(&values[10])?;

    let mut text = values.into_iter().map(SqlValue::into_text).skip(2);
    Some(CityRow {
        id,
        district_id,
        name_en: text.next().flatten(),
        name_si: text.next().flatten(),
        name_ta: text.next().flatten(),
        sub_name_en: text.next().flatten(),
        sub_name_si: text.next().flatten(),
        sub_name_ta: text.next().flatten(),
        postcode: text.next().flatten(),
        latitude,
        longitude,
    })
}

pub fn district_row(values: Vec<SqlValue>) -> Option<DistrictRow> {
    if values.len() < DISTRICT_FIELDS {
        return None;
    }
    let id = int_field(&values[0])?;
    let province_id = int_field(&values[1])?;

    let mut text = values.into_iter().map(SqlValue::into_text).skip(2);
    Some(DistrictRow {
        id,
        province_id,
        name_en: text.next().flatten(),
        name_si: text.next().flatten(),
        name_ta: text.next().flatten(),
    })
}

/// Rows parsed from a dump plus the count of tuples that were dropped.
#[derive(Debug, Clone, Default)]
pub struct Parsed<T> {
    pub rows: Vec<T>,
    pub malformed: usize,
}

fn collect<T>(tuples: Vec<Vec<SqlValue>>, map: fn(Vec<SqlValue>) -> Option<T>) -> Parsed<T> {
    let mut parsed = Parsed {
        rows: Vec::with_capacity(tuples.len()),
        malformed: 0,
    };
    for tuple in tuples {
        match map(tuple) {
            Some(row) => parsed.rows.push(row),
            None => parsed.malformed += 1,
        }
    }
    if parsed.malformed > 0 {
        tracing::warn!(malformed = parsed.malformed, "dropped malformed rows");
    }
    parsed
}

pub fn city_rows(dump: &str) -> Parsed<CityRow> {
    collect(parse_inserts(dump, "cities"), city_row)
}

pub fn district_rows(dump: &str) -> Parsed<DistrictRow> {
    collect(parse_inserts(dump, "districts"), district_row)
}
