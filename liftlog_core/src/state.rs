//! Logbook snapshots loaded from and saved to a [`Store`].
//!
//! The import pipeline works on a [`Logbook`] value: load it, merge into
//! it, save it back. Nothing here keeps state between calls.

use crate::store::{keys, load_json, save_json, Store};
use crate::{
    BodyStatEntry, Error, ExerciseCatalogEntry, ExerciseLogs, Result, RoutineEntry,
    WeightLogEntry,
};

/// Shared collections touched by imports
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Logbook {
    pub exercise_logs: ExerciseLogs,
    pub imported_exercises: Vec<ExerciseCatalogEntry>,
    pub imported_routines: Vec<RoutineEntry>,
    pub body_stats: Vec<BodyStatEntry>,
}

impl Logbook {
    /// Load every collection; absent keys are empty
    pub fn load(store: &dyn Store) -> Result<Self> {
        let logbook = Self {
            exercise_logs: load_json(store, keys::EXERCISE_LOGS)?,
            imported_exercises: load_json(store, keys::IMPORTED_EXERCISES)?,
            imported_routines: load_json(store, keys::IMPORTED_ROUTINES)?,
            body_stats: load_json(store, keys::BODY_STATS)?,
        };
        tracing::debug!(
            "Loaded logbook: {} exercises logged, {} imported exercises, {} routines, {} body stats",
            logbook.exercise_logs.len(),
            logbook.imported_exercises.len(),
            logbook.imported_routines.len(),
            logbook.body_stats.len()
        );
        Ok(logbook)
    }

    /// Write every collection back
    pub fn save(&self, store: &mut dyn Store) -> Result<()> {
        save_json(store, keys::EXERCISE_LOGS, &self.exercise_logs)?;
        save_json(store, keys::IMPORTED_EXERCISES, &self.imported_exercises)?;
        save_json(store, keys::IMPORTED_ROUTINES, &self.imported_routines)?;
        save_json(store, keys::BODY_STATS, &self.body_stats)?;
        tracing::debug!("Saved logbook");
        Ok(())
    }

    /// Load the logbook, modify it, and save it back
    pub fn update<F>(store: &mut dyn Store, f: F) -> Result<Self>
    where
        F: FnOnce(&mut Logbook) -> Result<()>,
    {
        let mut logbook = Self::load(store)?;
        f(&mut logbook)?;
        logbook.save(store)?;
        Ok(logbook)
    }
}

/// Load a user's weight log in storage order
pub fn load_weight_logs(store: &dyn Store, user_id: &str) -> Result<Vec<WeightLogEntry>> {
    load_json(store, &keys::weight_logs(user_id))
}

pub fn save_weight_logs(
    store: &mut dyn Store,
    user_id: &str,
    entries: &[WeightLogEntry],
) -> Result<()> {
    save_json(store, &keys::weight_logs(user_id), entries)
}

/// The user selected last, if any
pub fn current_user(store: &dyn Store) -> Result<Option<String>> {
    let user: Option<String> = load_json(store, keys::CURRENT_USER_ID)?;
    Ok(user.filter(|u| !u.is_empty()))
}

/// Remember `user_id`; it must be usable in a weight log key
pub fn set_current_user(store: &mut dyn Store, user_id: &str) -> Result<()> {
    if !keys::is_valid_user_id(user_id) {
        return Err(Error::Validation(format!(
            "invalid user id {:?}: use letters, digits, '_', '-' or '.'",
            user_id
        )));
    }
    save_json(store, keys::CURRENT_USER_ID, user_id)
}
