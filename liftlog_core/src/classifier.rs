//! Row classification for imported records.
//!
//! Every raw row is either a workout set (it names an exercise), a body
//! measurement (it has no exercise column and a `weight` or `bodyFat` value),
//! or is skipped. Field names are resolved through ordered alias lists because
//! real-world exports disagree on header spelling.

use crate::{RawRow, RawValue, SetValue, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Aliases for the exercise name, first present wins
pub const EXERCISE_ALIASES: &[&str] = &[
    "exercise",
    "exercise_name",
    "exerciseName",
    "Exercise",
    "ExerciseName",
    "Exercise_name",
];

/// Aliases for the category or program name.
///
/// `Caregory` is a misspelling found in some source exports and is kept on purpose.
pub const CATEGORY_ALIASES: &[&str] = &["category", "program", "Category", "Program", "Caregory"];

pub const REPS_ALIASES: &[&str] = &["reps", "Reps", "repetitions", "Repetitions"];

pub const WEIGHT_ALIASES: &[&str] = &["weight", "Weight", "kg", "KG"];

pub const DATE_ALIASES: &[&str] = &["timestamp", "date", "Date"];

/// Keys that mark a row as a body measurement (case-sensitive)
pub const BODY_STAT_KEYS: &[&str] = &["weight", "bodyFat"];

/// Category used when a workout row names none
pub const DEFAULT_CATEGORY: &str = "Imported";

/// Date of a classified row
#[derive(Clone, Debug, PartialEq)]
pub enum DateField {
    Parsed(Timestamp),
    /// Absent or unparseable; the merge engine substitutes its clock
    Unresolved { raw: Option<String> },
}

impl DateField {
    /// Resolve against the merge-time clock
    pub fn resolve(&self, now: Timestamp) -> Timestamp {
        match self {
            DateField::Parsed(ts) => *ts,
            DateField::Unresolved { .. } => now,
        }
    }
}

/// A workout set extracted from a row
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutSetRow {
    pub exercise_name: String,
    pub category: String,
    pub reps: SetValue,
    pub weight: SetValue,
    pub date: DateField,
}

/// A body measurement extracted from a row
#[derive(Clone, Debug, PartialEq)]
pub struct BodyStatRow {
    pub weight: Option<f64>,
    pub body_fat: Option<f64>,
    pub water: Option<f64>,
    pub lean: Option<f64>,
    pub date: DateField,
    /// Fields that were present but not numeric
    pub invalid_fields: Vec<String>,
}

/// Why a row was dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    MissingExerciseName,
    /// Body measurement row with neither `weight` nor `bodyFat` filled in
    EmptyMeasurement,
}

/// Tagged result of classifying one row
#[derive(Clone, Debug, PartialEq)]
pub enum ClassifiedRow {
    BodyStat(BodyStatRow),
    WorkoutSet(WorkoutSetRow),
    Skipped(SkipReason),
}

/// Classify one raw row
pub fn classify(row: &RawRow) -> ClassifiedRow {
    if let Some(exercise_name) = row.first_present(EXERCISE_ALIASES).and_then(RawValue::as_text) {
        let category = row
            .first_present(CATEGORY_ALIASES)
            .and_then(RawValue::as_text)
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        return ClassifiedRow::WorkoutSet(WorkoutSetRow {
            exercise_name,
            category,
            reps: resolve_set_value(row, REPS_ALIASES),
            weight: resolve_set_value(row, WEIGHT_ALIASES),
            date: resolve_date(row),
        });
    }

    // A blank exercise cell means a workout row without a name, even when the
    // same row carries a `weight` column
    if EXERCISE_ALIASES.iter().any(|key| row.contains_key(key)) {
        return ClassifiedRow::Skipped(SkipReason::MissingExerciseName);
    }

    if BODY_STAT_KEYS.iter().any(|key| row.contains_key(key)) {
        let measured = BODY_STAT_KEYS
            .iter()
            .any(|key| row.get(key).is_some_and(RawValue::is_present));
        if !measured {
            return ClassifiedRow::Skipped(SkipReason::EmptyMeasurement);
        }

        let mut invalid_fields = Vec::new();
        let mut number = |key: &str| -> Option<f64> {
            let value = row.get(key).filter(|v| v.is_present())?;
            let parsed = value.as_f64();
            if parsed.is_none() {
                invalid_fields.push(key.to_string());
            }
            parsed
        };

        let weight = number("weight");
        let body_fat = number("bodyFat");
        let water = number("water");
        let lean = number("lean");

        return ClassifiedRow::BodyStat(BodyStatRow {
            weight,
            body_fat,
            water,
            lean,
            date: resolve_date(row),
            invalid_fields,
        });
    }

    ClassifiedRow::Skipped(SkipReason::MissingExerciseName)
}

fn resolve_set_value(row: &RawRow, aliases: &[&str]) -> SetValue {
    row.first_present(aliases)
        .map(SetValue::from)
        .unwrap_or_default()
}

fn resolve_date(row: &RawRow) -> DateField {
    match row.first_present(DATE_ALIASES) {
        Some(value) => match parse_date(value) {
            Some(ts) => DateField::Parsed(ts),
            None => DateField::Unresolved {
                raw: value.as_text(),
            },
        },
        None => DateField::Unresolved { raw: None },
    }
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// General date parser for imported cells.
///
/// Numbers are epoch milliseconds. Strings may be RFC 3339, RFC 2822, or one
/// of the common date and date-time layouts; values without an offset are
/// read as UTC and bare dates as UTC midnight.
pub fn parse_date(value: &RawValue) -> Option<Timestamp> {
    match value {
        RawValue::Missing => None,
        RawValue::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis)
                .single()
                .and_then(Timestamp::checked)
        }
        RawValue::Text(s) => parse_date_str(s.trim()),
    }
}

fn parse_date_str(s: &str) -> Option<Timestamp> {
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Timestamp::checked(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Timestamp::checked(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Timestamp::checked(naive.and_utc());
        }
    }

    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| Timestamp::checked(naive.and_utc()));
        }
    }

    None
}
