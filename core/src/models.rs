use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    CompleteBeginner,
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Plate {
    pub weight: f64,
    pub quantity: u32,
}

/// Equipment profile and personal details.
///
/// Every field has a default so that documents written before a field
/// existed still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    pub name: String,
    pub barbell_weight: f64,
    pub available_plates: Vec<Plate>,
    pub rest_timer_seconds: u32,
    pub experience: ExperienceLevel,
    pub sex: Sex,
    pub session_duration_minutes: u32,
    pub bodyweight_kg: f64,
    pub country: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: "Lifter".to_string(),
            barbell_weight: 7.0,
            available_plates: vec![
                Plate { weight: 10.0, quantity: 4 },
                Plate { weight: 5.0, quantity: 4 },
                Plate { weight: 2.0, quantity: 4 },
                Plate { weight: 1.0, quantity: 4 },
                Plate { weight: 0.5, quantity: 2 },
            ],
            rest_timer_seconds: 90,
            experience: ExperienceLevel::Beginner,
            sex: Sex::Male,
            session_duration_minutes: 60,
            bodyweight_kg: 80.0,
            country: String::new(),
        }
    }
}

impl UserSettings {
    /// Lightest plate actually in the inventory.
    pub fn lightest_plate(&self) -> Option<f64> {
        self.available_plates
            .iter()
            .filter(|p| p.quantity > 0)
            .map(|p| p.weight)
            .min_by(f64::total_cmp)
    }
}

/// Profile fields a program setup may change. Equipment other than the bar
/// is left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub experience: Option<ExperienceLevel>,
    pub sex: Option<Sex>,
    pub session_duration_minutes: Option<u32>,
    pub bodyweight_kg: Option<f64>,
    pub country: Option<String>,
    pub barbell_weight: Option<f64>,
}

impl ProfileUpdate {
    pub fn apply(self, settings: &mut UserSettings) {
        if let Some(name) = self.name {
            settings.name = name;
        }
        if let Some(experience) = self.experience {
            settings.experience = experience;
        }
        if let Some(sex) = self.sex {
            settings.sex = sex;
        }
        if let Some(minutes) = self.session_duration_minutes {
            settings.session_duration_minutes = minutes;
        }
        if let Some(bodyweight) = self.bodyweight_kg {
            settings.bodyweight_kg = bodyweight;
        }
        if let Some(country) = self.country {
            settings.country = country;
        }
        if let Some(barbell_weight) = self.barbell_weight {
            settings.barbell_weight = barbell_weight;
        }
    }
}

// ============================================================================
// Program
// ============================================================================

/// Identity of an exercise across program definitions and history.
///
/// Matching is by exact name; renaming an exercise starts a new history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExerciseKey<'a>(&'a str);

impl<'a> ExerciseKey<'a> {
    pub fn new(name: &'a str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0 == name
    }
}

/// Rep target for an exercise: a fixed count, or as many as possible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RepsRepr", into = "RepsRepr")]
pub enum Reps {
    Target(u32),
    Max,
}

impl Reps {
    pub fn target(&self) -> Option<u32> {
        match self {
            Reps::Target(n) => Some(*n),
            Reps::Max => None,
        }
    }
}

impl std::fmt::Display for Reps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reps::Target(n) => write!(f, "{n}"),
            Reps::Max => write!(f, "max"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RepsRepr {
    Count(u32),
    Text(String),
}

impl TryFrom<RepsRepr> for Reps {
    type Error = String;

    fn try_from(value: RepsRepr) -> Result<Self, Self::Error> {
        let count = match value {
            RepsRepr::Count(n) => n,
            RepsRepr::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("max") {
                    return Ok(Reps::Max);
                }
                s.parse::<u32>()
                    .map_err(|_| format!("reps must be a positive number or \"max\", got {s:?}"))?
            }
        };
        if count == 0 {
            return Err("reps must be positive".to_string());
        }
        Ok(Reps::Target(count))
    }
}

impl From<Reps> for RepsRepr {
    fn from(value: Reps) -> Self {
        match value {
            Reps::Target(n) => RepsRepr::Count(n),
            Reps::Max => RepsRepr::Text("max".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: u32,
    pub reps: Reps,
    #[serde(rename = "targetWeight", default, skip_serializing_if = "Option::is_none")]
    pub target_weight: Option<f64>,
    #[serde(rename = "isBodyweight", default)]
    pub is_bodyweight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<String>>,
}

impl Exercise {
    pub fn key(&self) -> ExerciseKey<'_> {
        ExerciseKey::new(&self.name)
    }

    /// Whether a performance meets this definition: enough sets, and every
    /// set at or above the rep target. AMRAP definitions never qualify.
    pub fn is_met_by(&self, performance: &ExercisePerformed) -> bool {
        let Some(target_reps) = self.reps.target() else {
            return false;
        };
        performance.sets_completed.len() >= self.sets as usize
            && performance
                .sets_completed
                .iter()
                .all(|set| set.reps >= target_reps)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    pub fn exercise(&self, key: ExerciseKey<'_>) -> Option<&Exercise> {
        self.exercises.iter().find(|e| key.matches(&e.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutProgram {
    pub program_name: String,
    pub schedule: Vec<String>,
    /// Workouts per week. Zero means "not recorded" and is replaced by the
    /// schedule length when a bundle is loaded.
    #[serde(default)]
    pub frequency: u32,
    pub workouts: Vec<Workout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
}

impl WorkoutProgram {
    pub fn workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    /// First definition of an exercise anywhere in the program.
    pub fn find_exercise(&self, key: ExerciseKey<'_>) -> Option<&Exercise> {
        self.workouts.iter().find_map(|w| w.exercise(key))
    }

    /// Definition of an exercise as it appears in a specific workout.
    pub fn exercise_in(&self, workout_id: &str, key: ExerciseKey<'_>) -> Option<&Exercise> {
        self.workout(workout_id).and_then(|w| w.exercise(key))
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SetCompleted {
    pub reps: u32,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExercisePerformed {
    pub name: String,
    #[serde(default)]
    pub sets_completed: Vec<SetCompleted>,
}

impl ExercisePerformed {
    pub fn key(&self) -> ExerciseKey<'_> {
        ExerciseKey::new(&self.name)
    }

    /// Working weight of the performance, taken from the first set.
    pub fn working_weight(&self) -> Option<f64> {
        self.sets_completed.first().map(|s| s.weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub date: DateTime<Utc>,
    pub workout_id: String,
    #[serde(default)]
    pub exercises_performed: Vec<ExercisePerformed>,
}

impl Session {
    pub fn performance(&self, key: ExerciseKey<'_>) -> Option<&ExercisePerformed> {
        self.exercises_performed.iter().find(|e| key.matches(&e.name))
    }
}

// ============================================================================
// Bundle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppData {
    pub user_settings: UserSettings,
    pub workout_programs: Vec<WorkoutProgram>,
    pub session_history: Vec<Session>,
}

impl AppData {
    /// The program consulted for scheduling and progression.
    pub fn active_program(&self) -> Option<&WorkoutProgram> {
        self.workout_programs.first()
    }

    /// Fills values that older documents did not record.
    pub fn normalize(&mut self) {
        for program in &mut self.workout_programs {
            if program.frequency == 0 {
                program.frequency = program.schedule.len() as u32;
            }
        }
    }
}
