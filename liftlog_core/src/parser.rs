//! Tabular parser for imported CSV and JSON files.
//!
//! CSV input is split on `\n` or `\r\n` line breaks and commas only; a lone
//! `\r` is ordinary cell text. There is no quoting or
//! escaping, so a field containing a literal comma is split in two; this is a
//! known limitation of the import format. The first line is the header row and
//! every later line is zipped positionally against it.
//!
//! JSON input is either an array of row objects or an object mapping exercise
//! ids to previously exported sessions.

use crate::{Error, ExerciseLogs, RawRow, RawValue, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// Declared format of an import file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect the format from a file extension (`.csv` or `.json`)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::Json),
            _ => Err(Error::Format(path.display().to_string())),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Csv => f.write_str("csv"),
            InputFormat::Json => f.write_str("json"),
        }
    }
}

/// Result of parsing an import file
#[derive(Clone, Debug)]
pub enum ParsedInput {
    /// Row records to classify and merge
    Table(Table),
    /// Sessions keyed by exercise id, merged into the exercise logs as-is
    ExerciseLogs(ExerciseLogs),
}

impl ParsedInput {
    /// Number of entries offered to the user before merging
    pub fn entry_count(&self) -> usize {
        match self {
            ParsedInput::Table(table) => table.len(),
            ParsedInput::ExerciseLogs(logs) => logs.len(),
        }
    }
}

/// A restartable sequence of raw rows
#[derive(Clone, Debug)]
pub enum Table {
    Csv(CsvTable),
    Json(JsonTable),
}

impl Table {
    /// Iterate the rows from the start; may be called any number of times
    pub fn rows(&self) -> Rows<'_> {
        match self {
            Table::Csv(table) => Rows::Csv(table.rows()),
            Table::Json(table) => Rows::Json(table.objects.iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Table::Csv(table) => table.rows().count(),
            Table::Json(table) => table.objects.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positions of input elements that could not be read as rows
    pub fn rejected(&self) -> &[usize] {
        match self {
            Table::Csv(_) => &[],
            Table::Json(table) => &table.rejected,
        }
    }
}

/// CSV text with its header row, rows are produced lazily
#[derive(Clone, Debug)]
pub struct CsvTable {
    text: String,
    headers: Vec<String>,
}

impl CsvTable {
    fn new(text: String) -> Result<Self> {
        let headers = reader_for(&text)
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        Ok(Self { text, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn rows(&self) -> CsvRows<'_> {
        CsvRows {
            headers: &self.headers,
            records: reader_for(&self.text).into_records(),
        }
    }
}

fn reader_for(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_reader(text.as_bytes())
}

/// Row objects of a JSON array
#[derive(Clone, Debug)]
pub struct JsonTable {
    objects: Vec<Map<String, Value>>,
    rejected: Vec<usize>,
}

/// Iterator over the rows of a [`Table`]
pub enum Rows<'a> {
    Csv(CsvRows<'a>),
    Json(std::slice::Iter<'a, Map<String, Value>>),
}

impl Iterator for Rows<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        match self {
            Rows::Csv(rows) => rows.next(),
            Rows::Json(objects) => objects.next().map(|object| {
                object
                    .iter()
                    .map(|(k, v)| (k.clone(), RawValue::from(v.clone())))
                    .collect()
            }),
        }
    }
}

pub struct CsvRows<'a> {
    headers: &'a [String],
    records: csv::StringRecordsIntoIter<&'a [u8]>,
}

impl Iterator for CsvRows<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Skipping unreadable CSV line: {}", e);
                    continue;
                }
            };

            // The reader splits on `\n` only, so a CRLF line keeps its `\r`
            let last = record.len().saturating_sub(1);
            let cell = |idx: usize| {
                record.get(idx).map(|cell| {
                    if idx == last {
                        cell.strip_suffix('\r').unwrap_or(cell)
                    } else {
                        cell
                    }
                })
            };

            // A blank CRLF line is a single empty cell
            if record.len() == 1 && cell(0) == Some("") {
                continue;
            }

            // Cells past the last header are ignored, missing ones stay Missing
            let row = self
                .headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = cell(idx)
                        .map(|cell| RawValue::Text(cell.to_string()))
                        .unwrap_or(RawValue::Missing);
                    (header.clone(), value)
                })
                .collect();
            return Some(row);
        }
    }
}

/// Parse raw import text in the declared format.
///
/// CSV text with fewer than two lines yields an empty table. Malformed JSON,
/// or JSON that is neither an array nor an object, fails with [`Error::Parse`].
pub fn parse(text: impl Into<String>, format: InputFormat) -> Result<ParsedInput> {
    let text = text.into();
    match format {
        InputFormat::Csv => {
            let table = CsvTable::new(text)?;
            tracing::debug!("Parsed CSV header: {:?}", table.headers());
            Ok(ParsedInput::Table(Table::Csv(table)))
        }
        InputFormat::Json => parse_json(&text),
    }
}

fn parse_json(text: &str) -> Result<ParsedInput> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::Parse(e.to_string()))?;

    match value {
        Value::Array(elements) => {
            let mut objects = Vec::with_capacity(elements.len());
            let mut rejected = Vec::new();
            for (idx, element) in elements.into_iter().enumerate() {
                match element {
                    Value::Object(object) => objects.push(object),
                    other => {
                        tracing::warn!("Ignoring non-object element {} in JSON array: {}", idx, other);
                        rejected.push(idx);
                    }
                }
            }
            tracing::debug!("Parsed {} JSON rows", objects.len());
            Ok(ParsedInput::Table(Table::Json(JsonTable { objects, rejected })))
        }
        Value::Object(_) => {
            let logs: ExerciseLogs = serde_json::from_value(value)
                .map_err(|e| Error::Parse(format!("invalid exercise log object: {}", e)))?;
            tracing::debug!("Parsed exercise logs for {} exercises", logs.len());
            Ok(ParsedInput::ExerciseLogs(logs))
        }
        other => Err(Error::Parse(format!(
            "expected an array or object at the top level, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
