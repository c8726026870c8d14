//! Core domain types for the liftlog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Timestamps in the persisted ISO-8601 form
//! - Raw rows produced by the tabular parser
//! - Weight logs, body stats and exercise logs
//! - Exercise catalog and routine entries

use chrono::{DateTime, Datelike, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Timestamps
// ============================================================================

/// A UTC instant with millisecond precision.
///
/// Serialized as `2024-01-01T00:00:00.000Z`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at.trunc_subsecs(3))
    }

    /// Like [`Timestamp::new`], but `None` for years outside 0..=9999.
    ///
    /// Those years have no four-digit RFC 3339 form, so a stored value
    /// could not be read back.
    pub fn checked(at: DateTime<Utc>) -> Option<Self> {
        (0..=9999).contains(&at.year()).then(|| Self::new(at))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(at: DateTime<Utc>) -> Self {
        Self::new(at)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Timestamp::new(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Raw Import Rows
// ============================================================================

/// A single cell of an imported row
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// Column absent from this row (short CSV line, JSON null)
    Missing,
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    /// Whether the cell carries a usable value.
    ///
    /// Missing cells and empty strings do not; they fall through to the next alias.
    pub fn is_present(&self) -> bool {
        match self {
            RawValue::Missing => false,
            RawValue::Text(s) => !s.is_empty(),
            RawValue::Number(_) => true,
        }
    }

    /// Text form of the value, if any
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Missing => None,
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) => Some(n.to_string()),
        }
    }

    /// Numeric form of the value; strings are parsed after trimming
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Missing => None,
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            RawValue::Number(n) => n.as_f64(),
        }
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Missing,
            serde_json::Value::String(s) => RawValue::Text(s),
            serde_json::Value::Number(n) => RawValue::Number(n),
            other => RawValue::Text(other.to_string()),
        }
    }
}

/// One imported record: header name to cell value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRow {
    fields: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field; a repeated header overwrites the earlier cell
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        self.fields.insert(key.into(), value);
    }

    /// Whether the key exists at all, regardless of its value
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// First present value among `aliases`, in order
    pub fn first_present(&self, aliases: &[&str]) -> Option<&RawValue> {
        aliases
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .find(|value| value.is_present())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, RawValue)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (key, value) in iter {
            row.insert(key, value);
        }
        row
    }
}

// ============================================================================
// Sets and Logs
// ============================================================================

/// Reps or weight of a single set, as entered or imported
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SetValue {
    Number(serde_json::Number),
    Text(String),
}

impl SetValue {
    pub fn empty() -> Self {
        SetValue::Text(String::new())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, SetValue::Text(s) if s.is_empty())
    }
}

impl Default for SetValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&RawValue> for SetValue {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Missing => SetValue::empty(),
            RawValue::Text(s) => SetValue::Text(s.clone()),
            RawValue::Number(n) => SetValue::Number(n.clone()),
        }
    }
}

impl fmt::Display for SetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetValue::Number(n) => write!(f, "{}", n),
            SetValue::Text(s) => f.write_str(s),
        }
    }
}

/// One set of an exercise
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    #[serde(default)]
    pub reps: SetValue,
    #[serde(default)]
    pub weight: SetValue,
}

/// One logged session of an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLogEntry {
    pub date: Timestamp,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

/// Exercise id to its sessions, most recent last
pub type ExerciseLogs = BTreeMap<String, Vec<ExerciseLogEntry>>;

/// A body-weight log entry owned by one user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightLogEntry {
    pub date: Timestamp,
    pub weight: f64,
    pub body_fat: Option<f64>,
    pub water: Option<f64>,
    pub lean: Option<f64>,
}

/// An imported body measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyStatEntry {
    pub date: Timestamp,
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean: Option<f64>,
}

// ============================================================================
// Catalog and Routines
// ============================================================================

/// An exercise known to the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseCatalogEntry {
    pub id: String,
    pub name: String,
    pub group: String,
}

/// An exercise slot in a routine with its default sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

/// A named, ordered collection of exercises
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RoutineEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<RoutineExercise>,
}
