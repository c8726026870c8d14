//! Day-to-day logbook entries: body weight and workout sessions.

use crate::state::{load_weight_logs, save_weight_logs};
use crate::store::Store;
use crate::{
    Error, ExerciseLogEntry, Logbook, Result, SetEntry, SetValue, Timestamp, WeightLogEntry,
};

/// Body measurements for a new weight log entry
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WeightInput {
    pub weight: f64,
    pub body_fat: Option<f64>,
    pub water: Option<f64>,
    pub lean: Option<f64>,
}

impl WeightInput {
    fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(Error::Validation(format!(
                "weight must be a positive number, got {}",
                self.weight
            )));
        }

        let optional = [
            ("body fat", self.body_fat),
            ("water", self.water),
            ("lean mass", self.lean),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(Error::Validation(format!(
                        "{} must be a non-negative number, got {}",
                        name, v
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Append a weight entry to a user's log and return it
pub fn add_weight_entry(
    store: &mut dyn Store,
    user_id: &str,
    input: WeightInput,
    now: Timestamp,
) -> Result<WeightLogEntry> {
    input.validate()?;

    let entry = WeightLogEntry {
        date: now,
        weight: input.weight,
        body_fat: input.body_fat,
        water: input.water,
        lean: input.lean,
    };

    let mut entries = load_weight_logs(store, user_id)?;
    entries.push(entry.clone());
    save_weight_logs(store, user_id, &entries)?;

    tracing::info!("Logged weight {} for {}", entry.weight, user_id);
    Ok(entry)
}

fn set_value(raw: &str) -> SetValue {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return SetValue::Number(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(SetValue::Number)
        .unwrap_or_else(|| SetValue::Text(raw.to_string()))
}

/// Parse a set written as `REPSxWEIGHT`, e.g. `8x62.5`.
///
/// The weight part may be omitted for bodyweight sets (`12` or `12x`).
pub fn parse_set(text: &str) -> Result<SetEntry> {
    let (reps, weight) = match text.split_once(['x', 'X']) {
        Some((reps, weight)) => (reps, weight),
        None => (text, ""),
    };

    if reps.trim().is_empty() {
        return Err(Error::Validation(format!(
            "invalid set '{}', expected REPSxWEIGHT",
            text
        )));
    }

    let weight = if weight.trim().is_empty() {
        SetValue::empty()
    } else {
        set_value(weight)
    };

    Ok(SetEntry {
        reps: set_value(reps),
        weight,
    })
}

/// Append a session of sets for an exercise
pub fn record_session(
    logbook: &mut Logbook,
    exercise_id: &str,
    sets: Vec<SetEntry>,
    now: Timestamp,
) -> Result<()> {
    if exercise_id.is_empty() {
        return Err(Error::Validation("exercise id must not be empty".into()));
    }
    if sets.is_empty() {
        return Err(Error::Validation("a session needs at least one set".into()));
    }

    logbook
        .exercise_logs
        .entry(exercise_id.to_string())
        .or_default()
        .push(ExerciseLogEntry { date: now, sets });

    tracing::info!("Recorded session for {}", exercise_id);
    Ok(())
}

/// Remove and return the most recent session of an exercise
pub fn remove_last_session(logbook: &mut Logbook, exercise_id: &str) -> Option<ExerciseLogEntry> {
    let sessions = logbook.exercise_logs.get_mut(exercise_id)?;
    let removed = sessions.pop();
    if sessions.is_empty() {
        logbook.exercise_logs.remove(exercise_id);
    }

    if removed.is_some() {
        tracing::info!("Removed last session for {}", exercise_id);
    }
    removed
}
