//! Merge engine for classified import rows.
//!
//! Merging takes a [`Logbook`] snapshot and returns a new one; persisting the
//! result is the caller's job. Rows are applied in input order, which only
//! matters for the first-seen metadata of exercises and routines. Duplicate
//! detection is by value and does not depend on order, so importing the same
//! dated rows twice leaves the logbook unchanged the second time.

use crate::classifier::{BodyStatRow, ClassifiedRow, DateField, SkipReason, WorkoutSetRow};
use crate::slug::{routine_id_for_category, slugify};
use crate::{
    BodyStatEntry, ExerciseCatalogEntry, ExerciseLogEntry, ExerciseLogs, Logbook, RoutineEntry,
    RoutineExercise, SetEntry, Timestamp,
};
use std::fmt;

/// Rows merged between two progress callbacks
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Description given to routines created by the importer
pub const IMPORTED_ROUTINE_DESCRIPTION: &str = "Imported from file";

/// Something the merge engine substituted or dropped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Row had no exercise name and no body measurement
    MissingExerciseName,
    /// Body measurement row with no weight and no body fat
    EmptyMeasurement,
    /// Date absent or unparseable, merge time used instead
    DateSubstituted { raw: Option<String> },
    /// Body measurement field present but not a number
    InvalidNumber { field: String },
    /// JSON array element that was not an object
    RejectedElement,
}

/// A per-row note collected during merging
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based position among parsed rows, or of the array element when rejected
    pub row: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MissingExerciseName => {
                write!(f, "row {}: no exercise name, row skipped", self.row)
            }
            DiagnosticKind::EmptyMeasurement => {
                write!(f, "row {}: no weight or body fat, row skipped", self.row)
            }
            DiagnosticKind::DateSubstituted { raw: Some(raw) } => {
                write!(f, "row {}: unparseable date {:?}, import time used", self.row, raw)
            }
            DiagnosticKind::DateSubstituted { raw: None } => {
                write!(f, "row {}: no date, import time used", self.row)
            }
            DiagnosticKind::InvalidNumber { field } => {
                write!(f, "row {}: {} is not a number, left empty", self.row, field)
            }
            DiagnosticKind::RejectedElement => {
                write!(f, "element {}: not an object, skipped", self.row)
            }
        }
    }
}

/// Counts and diagnostics of one merge
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub rows_seen: usize,
    pub rows_skipped: usize,
    pub body_stats_added: usize,
    pub body_stats_duplicate: usize,
    pub sessions_added: usize,
    pub sessions_duplicate: usize,
    pub exercises_created: usize,
    pub routines_created: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl MergeReport {
    /// Whether the merge changed the logbook
    pub fn changed(&self) -> bool {
        self.body_stats_added > 0
            || self.sessions_added > 0
            || self.exercises_created > 0
            || self.routines_created > 0
    }
}

/// New snapshot plus what happened while building it
#[derive(Clone, Debug)]
pub struct MergeOutcome {
    pub state: Logbook,
    pub report: MergeReport,
}

/// Progress after a merged chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub chunks: usize,
}

/// Incremental merger holding the snapshot being built
pub struct Merger {
    state: Logbook,
    report: MergeReport,
    now: Timestamp,
}

impl Merger {
    /// Start merging into `state`; `now` replaces unresolved row dates
    pub fn new(state: Logbook, now: Timestamp) -> Self {
        Self {
            state,
            report: MergeReport::default(),
            now,
        }
    }

    /// Apply the next row in input order
    pub fn apply(&mut self, row: ClassifiedRow) {
        self.report.rows_seen += 1;
        let position = self.report.rows_seen;

        match row {
            ClassifiedRow::BodyStat(stat) => self.apply_body_stat(position, stat),
            ClassifiedRow::WorkoutSet(set) => self.apply_workout_set(position, set),
            ClassifiedRow::Skipped(reason) => {
                self.report.rows_skipped += 1;
                let kind = match reason {
                    SkipReason::MissingExerciseName => DiagnosticKind::MissingExerciseName,
                    SkipReason::EmptyMeasurement => DiagnosticKind::EmptyMeasurement,
                };
                self.note(position, kind);
            }
        }
    }

    /// Record an input element the parser could not turn into a row
    pub fn reject(&mut self, index: usize) {
        self.report.rows_skipped += 1;
        self.note(index + 1, DiagnosticKind::RejectedElement);
    }

    /// Append previously exported sessions keyed by exercise id
    pub fn apply_exercise_logs(&mut self, logs: ExerciseLogs) {
        for (exercise_id, sessions) in logs {
            let log = self.state.exercise_logs.entry(exercise_id).or_default();
            for session in sessions {
                self.report.rows_seen += 1;
                if log.contains(&session) {
                    self.report.sessions_duplicate += 1;
                } else {
                    log.push(session);
                    self.report.sessions_added += 1;
                }
            }
        }
    }

    pub fn report(&self) -> &MergeReport {
        &self.report
    }

    pub fn finish(self) -> MergeOutcome {
        tracing::debug!(
            "Merge finished: {} rows, {} sessions added, {} body stats added, {} skipped",
            self.report.rows_seen,
            self.report.sessions_added,
            self.report.body_stats_added,
            self.report.rows_skipped
        );
        MergeOutcome {
            state: self.state,
            report: self.report,
        }
    }

    fn note(&mut self, row: usize, kind: DiagnosticKind) {
        tracing::debug!("Import diagnostic at row {}: {:?}", row, kind);
        self.report.diagnostics.push(Diagnostic { row, kind });
    }

    fn resolve_date(&mut self, position: usize, date: &DateField) -> Timestamp {
        if let DateField::Unresolved { raw } = date {
            self.note(position, DiagnosticKind::DateSubstituted { raw: raw.clone() });
        }
        date.resolve(self.now)
    }

    fn apply_body_stat(&mut self, position: usize, stat: BodyStatRow) {
        for field in &stat.invalid_fields {
            self.note(
                position,
                DiagnosticKind::InvalidNumber {
                    field: field.clone(),
                },
            );
        }

        let entry = BodyStatEntry {
            date: self.resolve_date(position, &stat.date),
            weight: stat.weight,
            body_fat: stat.body_fat,
            water: stat.water,
            lean: stat.lean,
        };

        let duplicate = self.state.body_stats.iter().any(|existing| {
            existing.date == entry.date
                && existing.weight == entry.weight
                && existing.body_fat == entry.body_fat
        });

        if duplicate {
            self.report.body_stats_duplicate += 1;
        } else {
            self.state.body_stats.push(entry);
            self.report.body_stats_added += 1;
        }
    }

    fn apply_workout_set(&mut self, position: usize, set: WorkoutSetRow) {
        let date = self.resolve_date(position, &set.date);
        let id = slugify(&set.exercise_name);

        // First occurrence of an id decides its catalog metadata
        if !self.state.imported_exercises.iter().any(|e| e.id == id) {
            tracing::debug!("Adding imported exercise {} ({})", id, set.exercise_name);
            self.state.imported_exercises.push(ExerciseCatalogEntry {
                id: id.clone(),
                name: set.exercise_name.clone(),
                group: set.category.clone(),
            });
            self.report.exercises_created += 1;
        }

        let default_set = SetEntry {
            reps: set.reps,
            weight: set.weight,
        };

        let routine_idx = match self
            .state
            .imported_routines
            .iter()
            .position(|r| r.name == set.category)
        {
            Some(idx) => idx,
            None => {
                let routine_id = routine_id_for_category(&set.category);
                tracing::debug!("Creating imported routine {}", routine_id);
                self.state.imported_routines.push(RoutineEntry {
                    id: routine_id,
                    name: set.category.clone(),
                    description: IMPORTED_ROUTINE_DESCRIPTION.to_string(),
                    exercises: Vec::new(),
                });
                self.report.routines_created += 1;
                self.state.imported_routines.len() - 1
            }
        };

        let routine = &mut self.state.imported_routines[routine_idx];
        if !routine.exercises.iter().any(|e| e.id == id) {
            routine.exercises.push(RoutineExercise {
                id: id.clone(),
                name: set.exercise_name,
                sets: vec![default_set.clone()],
            });
        }

        let entry = ExerciseLogEntry {
            date,
            sets: vec![default_set],
        };
        let log = self.state.exercise_logs.entry(id).or_default();
        if log.contains(&entry) {
            self.report.sessions_duplicate += 1;
        } else {
            log.push(entry);
            self.report.sessions_added += 1;
        }
    }
}

/// Merge classified rows into a snapshot in one pass
pub fn merge<I>(state: Logbook, rows: I, now: Timestamp) -> MergeOutcome
where
    I: IntoIterator<Item = ClassifiedRow>,
{
    let mut merger = Merger::new(state, now);
    for row in rows {
        merger.apply(row);
    }
    merger.finish()
}

/// Merge classified rows in fixed-size chunks, reporting after each chunk.
///
/// Chunks are applied strictly in order; a `chunk_size` of zero is treated as one.
pub fn merge_in_chunks<I, F>(
    state: Logbook,
    rows: I,
    now: Timestamp,
    chunk_size: usize,
    mut on_chunk: F,
) -> MergeOutcome
where
    I: IntoIterator<Item = ClassifiedRow>,
    F: FnMut(Progress),
{
    let mut merger = Merger::new(state, now);
    merge_chunks_into(&mut merger, rows, chunk_size, &mut on_chunk);
    merger.finish()
}

/// Feed rows to an existing merger in fixed-size chunks
pub fn merge_chunks_into<I, F>(merger: &mut Merger, rows: I, chunk_size: usize, mut on_chunk: F)
where
    I: IntoIterator<Item = ClassifiedRow>,
    F: FnMut(Progress),
{
    let chunk_size = chunk_size.max(1);
    let mut rows = rows.into_iter().peekable();
    let mut processed = 0;
    let mut chunks = 0;

    while rows.peek().is_some() {
        for row in rows.by_ref().take(chunk_size) {
            merger.apply(row);
            processed += 1;
        }
        chunks += 1;
        on_chunk(Progress { processed, chunks });
    }
}
