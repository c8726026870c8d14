//! CSV export of weight logs and workout logs.
//!
//! Output is written without quoting, in the same plain comma-separated form
//! the importer reads. Empty collections are reported as [`Error::NoData`] so
//! the caller can tell the user instead of writing an empty file.

use crate::state::load_weight_logs;
use crate::store::{keys, load_json, Store};
use crate::{Error, ExerciseLogs, Result, WeightLogEntry};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const WEIGHT_LOG_HEADER: [&str; 5] = ["date", "weight", "bodyFat", "water", "lean"];

pub const WORKOUT_LOG_HEADER: [&str; 5] = ["exerciseId", "date", "setNumber", "reps", "weight"];

/// Export file name for a user's weight log
pub fn weight_log_file_name(user_id: &str) -> String {
    format!("weight_logs_{}.csv", user_id)
}

/// Export file name for a user's workout log
pub fn workout_log_file_name(user_id: &str) -> String {
    format!("workout_logs_{}.csv", user_id)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("export is not UTF-8: {}", e)))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Serialize weight log entries in storage order
pub fn export_weight_log(entries: &[WeightLogEntry]) -> Result<String> {
    if entries.is_empty() {
        return Err(Error::NoData("No weight logs to export".into()));
    }

    let mut writer = csv_writer();
    writer.write_record(WEIGHT_LOG_HEADER)?;
    for entry in entries {
        writer.write_record([
            entry.date.to_iso_string(),
            entry.weight.to_string(),
            optional(entry.body_fat),
            optional(entry.water),
            optional(entry.lean),
        ])?;
    }

    tracing::info!("Exported {} weight log entries", entries.len());
    finish(writer)
}

/// Flatten every logged set into one CSV row.
///
/// `setNumber` is the 1-based position of the set within its session. A
/// numeric zero is written as `0`, only blank values become empty cells.
pub fn export_workout_log(logs: &ExerciseLogs) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(WORKOUT_LOG_HEADER)?;

    let mut rows = 0;
    for (exercise_id, sessions) in logs {
        for session in sessions {
            for (idx, set) in session.sets.iter().enumerate() {
                writer.write_record([
                    exercise_id.clone(),
                    session.date.to_iso_string(),
                    (idx + 1).to_string(),
                    set.reps.to_string(),
                    set.weight.to_string(),
                ])?;
                rows += 1;
            }
        }
    }

    if rows == 0 {
        return Err(Error::NoData("No workout logs to export".into()));
    }

    tracing::info!("Exported {} workout sets", rows);
    finish(writer)
}

/// Export the weight log stored for `user_id`
pub fn export_weight_log_from(store: &dyn Store, user_id: &str) -> Result<String> {
    let entries = load_weight_logs(store, user_id)?;
    export_weight_log(&entries)
}

/// Export the stored exercise logs
pub fn export_workout_log_from(store: &dyn Store) -> Result<String> {
    let logs: ExerciseLogs = load_json(store, keys::EXERCISE_LOGS)?;
    export_workout_log(&logs)
}

/// Write an export into `dir` atomically, returning the file path
pub fn write_export(dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(&path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Wrote export to {:?}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::save_weight_logs;
    use crate::store::{save_json, MemoryStore};
    use crate::{ExerciseLogEntry, SetEntry, SetValue, Timestamp};
    use chrono::{TimeZone, Utc};

    fn at(day: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2024, 1, day, 7, 0, 0).unwrap())
    }

    fn weight_entry(day: u32, weight: f64, body_fat: Option<f64>) -> WeightLogEntry {
        WeightLogEntry {
            date: at(day),
            weight,
            body_fat,
            water: None,
            lean: None,
        }
    }

    fn set(reps: &str, weight: &str) -> SetEntry {
        SetEntry {
            reps: SetValue::Text(reps.into()),
            weight: SetValue::Text(weight.into()),
        }
    }

    #[test]
    fn test_empty_weight_log_is_no_data() {
        assert!(matches!(export_weight_log(&[]), Err(Error::NoData(_))));
    }

    #[test]
    fn test_weight_log_in_storage_order() {
        let entries = vec![
            weight_entry(3, 80.5, Some(18.2)),
            weight_entry(1, 81.0, None),
        ];
        let csv = export_weight_log(&entries).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "date,weight,bodyFat,water,lean",
                "2024-01-03T07:00:00.000Z,80.5,18.2,,",
                "2024-01-01T07:00:00.000Z,81,,,",
            ]
        );
    }

    #[test]
    fn test_workout_log_flattens_sets() {
        let mut logs = ExerciseLogs::new();
        logs.insert(
            "bench".into(),
            vec![ExerciseLogEntry {
                date: at(2),
                sets: vec![set("10", "60"), set("8", "")],
            }],
        );
        logs.insert(
            "squat".into(),
            vec![ExerciseLogEntry {
                date: at(4),
                sets: vec![SetEntry {
                    reps: SetValue::Number(serde_json::Number::from(5u64)),
                    weight: SetValue::Number(serde_json::Number::from(100u64)),
                }],
            }],
        );

        let csv = export_workout_log(&logs).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "exerciseId,date,setNumber,reps,weight",
                "bench,2024-01-02T07:00:00.000Z,1,10,60",
                "bench,2024-01-02T07:00:00.000Z,2,8,",
                "squat,2024-01-04T07:00:00.000Z,1,5,100",
            ]
        );
    }

    #[test]
    fn test_workout_log_keeps_zero_values() {
        let zero = || SetValue::Number(serde_json::Number::from(0u64));
        let mut logs = ExerciseLogs::new();
        logs.insert(
            "plank".into(),
            vec![ExerciseLogEntry {
                date: at(5),
                sets: vec![SetEntry {
                    reps: zero(),
                    weight: zero(),
                }],
            }],
        );

        let csv = export_workout_log(&logs).unwrap();
        assert_eq!(csv.lines().nth(1), Some("plank,2024-01-05T07:00:00.000Z,1,0,0"));
    }

    #[test]
    fn test_workout_log_without_sets_is_no_data() {
        let mut logs = ExerciseLogs::new();
        logs.insert(
            "bench".into(),
            vec![ExerciseLogEntry {
                date: at(2),
                sets: vec![],
            }],
        );

        assert!(matches!(export_workout_log(&logs), Err(Error::NoData(_))));
        assert!(matches!(
            export_workout_log(&ExerciseLogs::new()),
            Err(Error::NoData(_))
        ));
    }

    #[test]
    fn test_export_from_store() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            export_weight_log_from(&store, "alice"),
            Err(Error::NoData(_))
        ));

        save_weight_logs(&mut store, "alice", &[weight_entry(1, 70.0, None)]).unwrap();
        let csv = export_weight_log_from(&store, "alice").unwrap();
        assert_eq!(csv.lines().count(), 2);

        let mut logs = ExerciseLogs::new();
        logs.insert(
            "plank".into(),
            vec![ExerciseLogEntry {
                date: at(5),
                sets: vec![set("1", "")],
            }],
        );
        save_json(&mut store, keys::EXERCISE_LOGS, &logs).unwrap();
        let csv = export_workout_log_from(&store).unwrap();
        assert!(csv.contains("plank,2024-01-05T07:00:00.000Z,1,1,"));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(weight_log_file_name("alice"), "weight_logs_alice.csv");
        assert_eq!(workout_log_file_name("alice"), "workout_logs_alice.csv");
    }

    #[test]
    fn test_write_export() {
        let temp_dir = tempfile::tempdir().unwrap();
        let out_dir = temp_dir.path().join("exports");

        let path = write_export(&out_dir, "weight_logs_alice.csv", "date,weight\n").unwrap();
        assert_eq!(path, out_dir.join("weight_logs_alice.csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "date,weight\n");
    }
}
