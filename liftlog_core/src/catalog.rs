//! Built-in exercise catalog and routines.
//!
//! Imported exercises and routines are appended after the built-in ones when
//! listing; they never replace them.

use crate::types::*;
use once_cell::sync::Lazy;

/// Built-in exercises and routines
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: Vec<ExerciseCatalogEntry>,
    pub routines: Vec<RoutineEntry>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(id: &str, name: &str, group: &str) -> ExerciseCatalogEntry {
    ExerciseCatalogEntry {
        id: id.into(),
        name: name.into(),
        group: group.into(),
    }
}

fn sets(template: &[(u64, u64)]) -> Vec<SetEntry> {
    template
        .iter()
        .map(|(reps, weight)| SetEntry {
            reps: SetValue::Number((*reps).into()),
            weight: SetValue::Number((*weight).into()),
        })
        .collect()
}

fn slot(id: &str, name: &str, template: &[(u64, u64)]) -> RoutineExercise {
    RoutineExercise {
        id: id.into(),
        name: name.into(),
        sets: sets(template),
    }
}

/// Builds the default catalog with built-in exercises and routines
pub fn build_default_catalog() -> Catalog {
    let exercises = vec![
        exercise("bench", "Bench Press", "Chest"),
        exercise("deadlift", "Deadlift", "Back"),
        exercise("squat", "Squats", "Legs"),
        exercise("overhead", "Overhead Press", "Shoulders"),
        exercise("bicep", "Bicep Curls", "Arms"),
        exercise("plank", "Plank", "Core"),
    ];

    let routines = vec![
        RoutineEntry {
            id: "push".into(),
            name: "Push Day".into(),
            description: "Chest, shoulders and triceps".into(),
            exercises: vec![
                slot("bench", "Bench Press", &[(10, 60), (8, 60), (6, 60)]),
                slot("overhead", "Overhead Press", &[(10, 40), (8, 40), (6, 40)]),
            ],
        },
        RoutineEntry {
            id: "pull".into(),
            name: "Pull Day".into(),
            description: "Back and biceps".into(),
            exercises: vec![
                slot("deadlift", "Deadlift", &[(5, 80), (5, 90), (5, 100)]),
                slot("rows", "Bent Over Row", &[(10, 50), (8, 55), (6, 60)]),
            ],
        },
        RoutineEntry {
            id: "legs".into(),
            name: "Leg Day".into(),
            description: "Legs and lower body".into(),
            exercises: vec![
                slot("squat", "Squats", &[(10, 80), (8, 90), (6, 100)]),
                slot("legpress", "Leg Press", &[(12, 100), (12, 100), (12, 100)]),
            ],
        },
    ];

    Catalog {
        exercises,
        routines,
    }
}

impl Catalog {
    /// Built-in exercises followed by imported ones
    pub fn all_exercises(&self, imported: &[ExerciseCatalogEntry]) -> Vec<ExerciseCatalogEntry> {
        self.exercises.iter().chain(imported).cloned().collect()
    }

    /// Built-in routines followed by imported ones
    pub fn all_routines(&self, imported: &[RoutineEntry]) -> Vec<RoutineEntry> {
        self.routines.iter().chain(imported).cloned().collect()
    }

    /// Look up an exercise by id, built-in first
    pub fn find_exercise<'a>(
        &'a self,
        imported: &'a [ExerciseCatalogEntry],
        id: &str,
    ) -> Option<&'a ExerciseCatalogEntry> {
        self.exercises.iter().chain(imported).find(|e| e.id == id)
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for exercise in &self.exercises {
            if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise id '{}'", exercise.id));
            }
        }

        let mut routine_ids = std::collections::HashSet::new();
        for routine in &self.routines {
            if !routine_ids.insert(routine.id.as_str()) {
                errors.push(format!("Duplicate routine id '{}'", routine.id));
            }
            if routine.exercises.is_empty() {
                errors.push(format!("Routine '{}' has no exercises", routine.id));
            }
        }

        errors
    }
}
