//! Next working weight for an exercise.
//!
//! Progressive overload with a plateau and deload policy:
//! - a successful last performance adds two of the lightest plates
//! - a single failure repeats the weight
//! - two consecutive failures at the same weight deload by 10%

use crate::models::{AppData, ExerciseKey, ExercisePerformed, Session, WorkoutProgram};

/// Increment used when no plates are configured.
pub const FALLBACK_INCREMENT_KG: f64 = 1.0;
/// Share of the working weight kept on a deload.
pub const DELOAD_FACTOR: f64 = 0.9;
/// Deloaded weights are rounded to this step.
pub const DELOAD_ROUNDING_KG: f64 = 0.5;

const WEIGHT_EPSILON: f64 = 1e-6;

/// Added to the bar for a first attempt, by name keyword, in priority order.
const STARTING_EXTRAS: [(&[&str], f64); 3] = [
    (&["squat", "deadlift"], 20.0),
    (&["bench", "row"], 10.0),
    (&["press", "lunge"], 5.0),
];
const DEFAULT_STARTING_EXTRA_KG: f64 = 5.0;

/// Recommended weight for the next time `exercise_name` is performed.
pub fn next_weight(exercise_name: &str, data: &AppData) -> f64 {
    let key = ExerciseKey::new(exercise_name);
    let program = data.active_program();
    let settings = &data.user_settings;

    if program
        .and_then(|p| p.find_exercise(key))
        .is_some_and(|e| e.is_bodyweight)
    {
        return 0.0;
    }

    let recent = sessions_with(key, &data.session_history);
    let Some((last_session, last)) = recent.first().copied() else {
        return starting_weight(exercise_name, settings.barbell_weight);
    };
    let Some(last_weight) = last.working_weight() else {
        return starting_weight(exercise_name, settings.barbell_weight);
    };

    let Some(spec) = program.and_then(|p| p.exercise_in(&last_session.workout_id, key)) else {
        return sanitize(last_weight);
    };
    if spec.reps.target().is_none() {
        return sanitize(last_weight);
    }

    if spec.is_met_by(last) {
        let increment = settings
            .lightest_plate()
            .map_or(FALLBACK_INCREMENT_KG, |plate| plate * 2.0);
        return sanitize(last_weight + increment);
    }

    let failed_twice = recent
        .get(1)
        .zip(program)
        .is_some_and(|(&(session, performance), program)| {
            failed_at(program, session, performance, key, last_weight)
        });

    if failed_twice {
        sanitize(deload(last_weight))
    } else {
        sanitize(last_weight)
    }
}

/// First-time weight for an exercise with no usable history.
///
/// Only the first matching category applies.
pub fn starting_weight(exercise_name: &str, barbell_weight: f64) -> f64 {
    let name = exercise_name.to_lowercase();
    let extra = STARTING_EXTRAS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
        .map_or(DEFAULT_STARTING_EXTRA_KG, |&(_, extra)| extra);
    sanitize(barbell_weight + extra)
}

/// 10% off, rounded to the nearest 0.5 kg.
pub fn deload(weight: f64) -> f64 {
    ((weight * DELOAD_FACTOR) / DELOAD_ROUNDING_KG).round() * DELOAD_ROUNDING_KG
}

/// Sessions that include `key`, most recent first, paired with the matching
/// performance. Sessions on the same date keep their recorded order.
fn sessions_with<'a>(
    key: ExerciseKey<'_>,
    history: &'a [Session],
) -> Vec<(&'a Session, &'a ExercisePerformed)> {
    let mut found: Vec<_> = history
        .iter()
        .filter_map(|s| s.performance(key).map(|p| (s, p)))
        .collect();
    found.sort_by(|a, b| b.0.date.cmp(&a.0.date));
    found
}

/// Whether an earlier performance also missed its target at `weight`.
fn failed_at(
    program: &WorkoutProgram,
    session: &Session,
    performance: &ExercisePerformed,
    key: ExerciseKey<'_>,
    weight: f64,
) -> bool {
    let Some(spec) = program.exercise_in(&session.workout_id, key) else {
        return false;
    };
    let Some(previous_weight) = performance.working_weight() else {
        return false;
    };
    spec.reps.target().is_some()
        && !spec.is_met_by(performance)
        && (previous_weight - weight).abs() < WEIGHT_EPSILON
}

fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}
