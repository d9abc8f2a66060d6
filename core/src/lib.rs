//! Workout tracking rules shared by the server: the data model, schedule
//! advancement, weight progression, plate loading and interpretation of
//! model output.

mod error;
mod models;

pub mod ai;
pub mod bundle;
pub mod plan;
pub mod plates;
pub mod progression;
pub mod schedule;

pub use error::{Error, Result};
pub use models::*;

pub use ai::{Advice, AdviceKind, DietSuggestion, NextWorkoutSuggestion, PostSetFeedback};
pub use bundle::{export_bundle, import_bundle, load_bundle};
pub use plan::{PlannedExercise, WorkoutPlan, plan_next_workout};
pub use plates::{PlateCount, loaded_weight, plate_breakdown};
pub use progression::next_weight;
pub use schedule::next_workout;
