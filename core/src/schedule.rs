//! Cyclic schedule advancement.

use crate::models::{AppData, Session, Workout, WorkoutProgram};

/// Next workout of the active program, given the recorded history.
pub fn next_workout(data: &AppData) -> Option<&Workout> {
    next_in_schedule(data.active_program()?, &data.session_history)
}

/// Next workout in `program`'s schedule after the last session of `history`.
///
/// History is taken in recorded order. When the last session's workout is
/// not part of the schedule (for example after the program was regenerated)
/// the cycle restarts at the first entry.
pub fn next_in_schedule<'a>(program: &'a WorkoutProgram, history: &[Session]) -> Option<&'a Workout> {
    let schedule = &program.schedule;
    if schedule.is_empty() {
        return None;
    }

    let next_index = match history.last() {
        None => 0,
        Some(last) => schedule
            .iter()
            .position(|id| *id == last.workout_id)
            .map_or(0, |index| (index + 1) % schedule.len()),
    };

    program.workout(&schedule[next_index])
}
