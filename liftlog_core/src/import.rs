//! File import: detect, parse, confirm, merge, save.
//!
//! The whole file is read and parsed before anything else happens, so a parse
//! failure leaves the store untouched. The caller sees an [`ImportPreview`]
//! and may decline; once merging starts it runs to completion.

use crate::classifier::classify;
use crate::merge::{merge_chunks_into, MergeOutcome, MergeReport, Merger, Progress};
use crate::parser::{parse, InputFormat, ParsedInput};
use crate::store::Store;
use crate::{Logbook, Result, Timestamp};
use std::path::Path;

/// What the user is asked to confirm
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportPreview {
    pub file_name: String,
    pub format: InputFormat,
    pub entry_count: usize,
}

/// A fully parsed import waiting to be merged
#[derive(Clone, Debug)]
pub struct PreparedImport {
    preview: ImportPreview,
    input: ParsedInput,
}

/// How an import ended
#[derive(Clone, Debug)]
pub enum ImportOutcome {
    /// Nothing to import in the file
    Empty(ImportPreview),
    /// The user declined after the preview
    Declined(ImportPreview),
    Imported {
        preview: ImportPreview,
        report: MergeReport,
    },
}

impl PreparedImport {
    /// Check the extension, read the whole file and parse it
    pub fn from_path(path: &Path) -> Result<Self> {
        let format = InputFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!("Reading {} import from {:?}", format, path);
        Self::from_text(file_name, text, format)
    }

    /// Parse text already in memory
    pub fn from_text(
        file_name: impl Into<String>,
        text: impl Into<String>,
        format: InputFormat,
    ) -> Result<Self> {
        let input = parse(text, format)?;
        let preview = ImportPreview {
            file_name: file_name.into(),
            format,
            entry_count: input.entry_count(),
        };
        tracing::debug!(
            "Prepared import of {} entries from {}",
            preview.entry_count,
            preview.file_name
        );
        Ok(Self { preview, input })
    }

    pub fn preview(&self) -> &ImportPreview {
        &self.preview
    }

    /// Merge into a snapshot without touching any store
    pub fn merge<F>(
        self,
        state: Logbook,
        now: Timestamp,
        chunk_size: usize,
        on_chunk: F,
    ) -> MergeOutcome
    where
        F: FnMut(Progress),
    {
        let mut merger = Merger::new(state, now);
        match self.input {
            ParsedInput::Table(table) => {
                for &idx in table.rejected() {
                    merger.reject(idx);
                }
                let rows = table.rows().map(|row| classify(&row));
                merge_chunks_into(&mut merger, rows, chunk_size, on_chunk);
            }
            ParsedInput::ExerciseLogs(logs) => {
                merger.apply_exercise_logs(logs);
            }
        }
        merger.finish()
    }

    /// Load the logbook, merge, and save it back
    pub fn apply<F>(
        self,
        store: &mut dyn Store,
        now: Timestamp,
        chunk_size: usize,
        on_chunk: F,
    ) -> Result<MergeReport>
    where
        F: FnMut(Progress),
    {
        let state = Logbook::load(store)?;
        let file_name = self.preview.file_name.clone();
        let outcome = self.merge(state, now, chunk_size, on_chunk);

        if outcome.report.changed() {
            outcome.state.save(store)?;
        }

        tracing::info!(
            "Imported {}: {} sessions and {} body stats added, {} duplicates, {} skipped",
            file_name,
            outcome.report.sessions_added,
            outcome.report.body_stats_added,
            outcome.report.sessions_duplicate + outcome.report.body_stats_duplicate,
            outcome.report.rows_skipped
        );
        for diagnostic in &outcome.report.diagnostics {
            tracing::debug!("{}", diagnostic);
        }

        Ok(outcome.report)
    }
}

/// Run a complete import of `path` into `store`.
///
/// `confirm` sees the preview after the file is parsed and before anything is
/// merged; returning false leaves the store unchanged.
pub fn import_file<C, F>(
    store: &mut dyn Store,
    path: &Path,
    now: Timestamp,
    chunk_size: usize,
    confirm: C,
    on_chunk: F,
) -> Result<ImportOutcome>
where
    C: FnOnce(&ImportPreview) -> bool,
    F: FnMut(Progress),
{
    let prepared = PreparedImport::from_path(path)?;
    let preview = prepared.preview().clone();

    if preview.entry_count == 0 {
        tracing::info!("No entries found in {}", preview.file_name);
        return Ok(ImportOutcome::Empty(preview));
    }

    if !confirm(&preview) {
        tracing::info!("Import of {} declined", preview.file_name);
        return Ok(ImportOutcome::Declined(preview));
    }

    let report = prepared.apply(store, now, chunk_size, on_chunk)?;
    Ok(ImportOutcome::Imported { preview, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{keys, FileStore, MemoryStore};
    use crate::Error;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap())
    }

    fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_import_csv_file() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "strong.csv",
            "Date,Exercise,Caregory,Reps,Weight\n2024-03-01,Bench Press,Push,8,60\n2024-03-01,Bench Press,Push,6,65\n",
        );
        let mut store = MemoryStore::new();

        let mut seen = None;
        let outcome = import_file(
            &mut store,
            &path,
            now(),
            100,
            |preview| {
                seen = Some(preview.clone());
                true
            },
            |_| {},
        )
        .unwrap();

        let preview = seen.unwrap();
        assert_eq!(preview.file_name, "strong.csv");
        assert_eq!(preview.format, InputFormat::Csv);
        assert_eq!(preview.entry_count, 2);

        match outcome {
            ImportOutcome::Imported { report, .. } => {
                assert_eq!(report.sessions_added, 2);
                assert_eq!(report.exercises_created, 1);
            }
            other => panic!("Expected import, got {:?}", other),
        }

        let logbook = Logbook::load(&store).unwrap();
        assert_eq!(logbook.exercise_logs["bench-press"].len(), 2);
        assert_eq!(logbook.imported_routines[0].id, "imported-push");
    }

    #[test]
    fn test_declined_import_leaves_store_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "log.json", r#"[{"exercise":"Plank"}]"#);
        let mut store = MemoryStore::new();

        let outcome = import_file(&mut store, &path, now(), 100, |_| false, |_| {}).unwrap();
        assert!(matches!(outcome, ImportOutcome::Declined(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unsupported_extension_rejected_before_reading() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.txt");
        let mut store = MemoryStore::new();

        let result = import_file(&mut store, &path, now(), 100, |_| true, |_| {});
        assert!(matches!(result, Err(Error::Format(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_json_aborts_whole_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "bad.json", r#"[{"exercise":"Plank"},"#);
        let mut store = MemoryStore::new();

        let mut asked = false;
        let result = import_file(
            &mut store,
            &path,
            now(),
            100,
            |_| {
                asked = true;
                true
            },
            |_| {},
        );
        assert!(matches!(result, Err(Error::Parse(_))));
        assert!(!asked);
        assert!(store.is_empty());
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "empty.csv", "exercise,reps\n");
        let mut store = MemoryStore::new();

        let outcome = import_file(&mut store, &path, now(), 100, |_| true, |_| {}).unwrap();
        assert!(matches!(outcome, ImportOutcome::Empty(_)));
    }

    #[test]
    fn test_reimport_into_file_store_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(
            temp_dir.path(),
            "stats.json",
            r#"[{"date":"2024-01-01","weight":81.2,"bodyFat":19},{"date":"2024-01-08","weight":80.7}]"#,
        );
        let mut store = FileStore::new(temp_dir.path().join("data"));

        for _ in 0..2 {
            import_file(&mut store, &path, now(), 100, |_| true, |_| {}).unwrap();
        }

        let logbook = Logbook::load(&store).unwrap();
        assert_eq!(logbook.body_stats.len(), 2);
        assert_eq!(logbook.body_stats[0].body_fat, Some(19.0));
    }

    #[test]
    fn test_rejected_json_elements_are_diagnosed() {
        let prepared = PreparedImport::from_text(
            "mixed.json",
            r#"[42, {"exercise":"Plank","date":"2024-01-01"}]"#,
            InputFormat::Json,
        )
        .unwrap();
        assert_eq!(prepared.preview().entry_count, 1);

        let outcome = prepared.merge(Logbook::default(), now(), 100, |_| {});
        assert_eq!(outcome.report.rows_skipped, 1);
        assert_eq!(outcome.report.diagnostics.len(), 1);
        assert_eq!(
            outcome.report.diagnostics[0].to_string(),
            "element 1: not an object, skipped"
        );
        assert_eq!(outcome.state.exercise_logs["plank"].len(), 1);
    }

    #[test]
    fn test_far_future_dates_keep_store_readable() {
        let mut store = MemoryStore::new();
        let prepared = PreparedImport::from_text(
            "future.json",
            r#"[{"exercise":"Squats","reps":5,"date":1000000000000000},
                {"weight":80,"date":"10000-01-01"}]"#,
            InputFormat::Json,
        )
        .unwrap();

        let report = prepared.apply(&mut store, now(), 100, |_| {}).unwrap();
        assert_eq!(report.sessions_added, 1);
        assert_eq!(report.body_stats_added, 1);

        let logbook = Logbook::load(&store).unwrap();
        assert_eq!(logbook.exercise_logs["squats"][0].date, now());
        assert_eq!(logbook.body_stats[0].date, now());
    }

    #[test]
    fn test_exercise_log_object_import() {
        let mut store = MemoryStore::new();
        let prepared = PreparedImport::from_text(
            "backup.json",
            r#"{"squat":[{"date":"2024-01-05T18:00:00.000Z","sets":[{"reps":5,"weight":100},{"reps":5,"weight":100}]}]}"#,
            InputFormat::Json,
        )
        .unwrap();

        let report = prepared.apply(&mut store, now(), 100, |_| {}).unwrap();
        assert_eq!(report.sessions_added, 1);

        let stored = store.get(keys::EXERCISE_LOGS).unwrap().unwrap();
        assert!(stored.contains("\"squat\""));
        // Imported sessions do not touch the catalog
        assert!(store.get(keys::IMPORTED_EXERCISES).unwrap().is_some());
        assert_eq!(Logbook::load(&store).unwrap().imported_exercises.len(), 0);
    }
}
