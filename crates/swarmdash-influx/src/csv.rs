//! Annotated-CSV response decoding.
//!
//! The `InfluxDB` 2.x query API answers in annotated CSV: each result
//! table is preceded by `#datatype` / `#group` / `#default` annotation
//! lines and its own header row, tables are separated by blank lines,
//! and every data row leads with an empty annotation column. This
//! module flattens that framing into one list of string-keyed records;
//! typed parsing of individual values is the collector's job.

use std::collections::BTreeMap;

use crate::error::InfluxError;

/// One data row, keyed by its table's header columns.
pub type Record = BTreeMap<String, String>;

/// Decode an annotated-CSV response body into records.
///
/// Annotation lines are skipped, each table's header is applied to the
/// rows that follow it, and tables are concatenated.
///
/// # Errors
///
/// Returns [`InfluxError::Decode`] when a data row's field count does
/// not match its header, which means the response framing is broken.
pub fn decode(body: &str) -> Result<Vec<Record>, InfluxError> {
    let mut records = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut pending_header = false;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');

        if line.is_empty() {
            // Table boundary; the next table brings its own header.
            header = None;
            pending_header = false;
            continue;
        }

        if line.starts_with('#') {
            pending_header = true;
            continue;
        }

        if pending_header || header.is_none() {
            header = Some(split_fields(line));
            pending_header = false;
            continue;
        }

        let fields = split_fields(line);
        if let Some(columns) = &header {
            if fields.len() != columns.len() {
                return Err(InfluxError::Decode(format!(
                    "row has {} fields but header has {} columns",
                    fields.len(),
                    columns.len()
                )));
            }
            records.push(columns.iter().cloned().zip(fields).collect());
        }
    }

    Ok(records)
}

/// Split one CSV line into fields, honoring double-quoted values and
/// doubled-quote escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                let _ = chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
