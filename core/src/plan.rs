//! The next workout with per-exercise weights and plate loading.

use serde::{Deserialize, Serialize};

use crate::models::{AppData, Reps};
use crate::plates::{PlateCount, loaded_weight, plate_breakdown};
use crate::progression::next_weight;
use crate::schedule::next_workout;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub workout_id: String,
    pub name: String,
    pub exercises: Vec<PlannedExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedExercise {
    pub name: String,
    pub sets: u32,
    pub reps: Reps,
    pub is_bodyweight: bool,
    pub weight: f64,
    /// Weight suggested by the program author, if any.
    pub program_weight: Option<f64>,
    /// Plates per side, heaviest first.
    pub plates: Vec<PlateCount>,
    /// What the bar weighs once `plates` are loaded.
    pub loaded_weight: f64,
    pub bar_only: bool,
}

pub fn plan_next_workout(data: &AppData) -> Option<WorkoutPlan> {
    let workout = next_workout(data)?;
    let settings = &data.user_settings;

    let exercises = workout
        .exercises
        .iter()
        .map(|exercise| {
            let weight = next_weight(&exercise.name, data);
            let (plates, loaded, bar_only) = if exercise.is_bodyweight {
                (Vec::new(), 0.0, false)
            } else {
                let plates = plate_breakdown(weight, settings);
                let loaded = loaded_weight(settings.barbell_weight, &plates);
                (plates, loaded, weight <= settings.barbell_weight)
            };

            PlannedExercise {
                name: exercise.name.clone(),
                sets: exercise.sets,
                reps: exercise.reps,
                is_bodyweight: exercise.is_bodyweight,
                weight,
                program_weight: exercise.target_weight,
                plates,
                loaded_weight: loaded,
                bar_only,
            }
        })
        .collect();

    Some(WorkoutPlan {
        workout_id: workout.id.clone(),
        name: workout.name.clone(),
        exercises,
    })
}
