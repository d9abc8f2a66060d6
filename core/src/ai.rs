//! Interpreting text returned by the language model.
//!
//! Program drafts must parse into a complete [`WorkoutProgram`] or be
//! rejected. Advisory text is best effort: parsers return `None` rather than
//! an error, and callers omit the suggestion.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::WorkoutProgram;

/// Fields a drafted program must carry before it is accepted.
pub const REQUIRED_PROGRAM_FIELDS: [&str; 5] =
    ["program_name", "schedule", "workouts", "ai_description", "frequency"];

pub const POST_SET_FALLBACK: &str = "Great effort on that set! Let's get ready for the next one.";

// ============================================================================
// Program drafts
// ============================================================================

pub fn parse_program(text: &str) -> Result<WorkoutProgram> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidProgram("response was empty".to_string()));
    }

    let json = extract_json(trimmed)
        .ok_or_else(|| Error::InvalidProgram("no JSON object in response".to_string()))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::InvalidProgram(format!("response is not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidProgram("expected a JSON object".to_string()))?;
    for field in REQUIRED_PROGRAM_FIELDS {
        if !object.get(field).is_some_and(is_present) {
            return Err(Error::InvalidProgram(format!("missing `{field}`")));
        }
    }

    serde_json::from_value(value).map_err(|e| Error::InvalidProgram(e.to_string()))
}

/// Locates the JSON object in a model reply. A surrounding markdown fence is
/// dropped first, then the outermost braces are taken.
fn extract_json(text: &str) -> Option<&str> {
    let text = strip_fence(text).unwrap_or(text);
    if text.starts_with('{') {
        return Some(text);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn strip_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?.strip_suffix("```")?;
    // Skip an optional language tag on the opening line.
    let body = match body.find('\n') {
        Some(newline) if !body[..newline].contains('{') => &body[newline + 1..],
        _ => body,
    };
    Some(body.trim())
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// Advisory text
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdviceKind {
    NextWorkoutDate,
    Diet,
    PostSet,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advice {
    NextWorkoutDate(NextWorkoutSuggestion),
    Diet(DietSuggestion),
    PostSet(PostSetFeedback),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextWorkoutSuggestion {
    pub date: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietSuggestion {
    pub title: String,
    pub items: Vec<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostSetFeedback {
    pub feedback: String,
    pub quote: Option<String>,
}

pub fn parse_advice(kind: AdviceKind, text: &str) -> Option<Advice> {
    match kind {
        AdviceKind::NextWorkoutDate => parse_next_workout_date(text).map(Advice::NextWorkoutDate),
        AdviceKind::Diet => parse_diet(text).map(Advice::Diet),
        AdviceKind::PostSet => Some(Advice::PostSet(parse_post_set(text))),
    }
}

/// `date|reason` on one line.
pub fn parse_next_workout_date(text: &str) -> Option<NextWorkoutSuggestion> {
    let mut parts = text.trim().split('|').map(str::trim);
    let date = parts.next().filter(|s| !s.is_empty())?;
    let reason = parts.next().filter(|s| !s.is_empty())?;
    Some(NextWorkoutSuggestion {
        date: date.to_string(),
        reason: reason.to_string(),
    })
}

/// Title line, `- ` item lines, and an optional closing reasoning line.
pub fn parse_diet(text: &str) -> Option<DietSuggestion> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    match lines.as_slice() {
        [] => None,
        [only] => Some(DietSuggestion {
            title: "Diet Tip".to_string(),
            items: Vec::new(),
            reasoning: only.to_string(),
        }),
        [title, rest @ ..] => {
            let (items, reasoning) = match rest.split_last() {
                Some((last, items)) if !last.starts_with('-') => (items, last.to_string()),
                _ => (rest, String::new()),
            };
            Some(DietSuggestion {
                title: title.to_string(),
                items: items
                    .iter()
                    .map(|l| l.strip_prefix("- ").unwrap_or(*l).trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect(),
                reasoning,
            })
        }
    }
}

/// Feedback line followed by a short quote line.
pub fn parse_post_set(text: &str) -> PostSetFeedback {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    match lines.next() {
        Some(feedback) => PostSetFeedback {
            feedback: feedback.to_string(),
            quote: lines.next().map(str::to_string),
        },
        None => PostSetFeedback {
            feedback: POST_SET_FALLBACK.to_string(),
            quote: None,
        },
    }
}
