//! Task Data Structures
//!
//! Tasks live in one of three fixed lanes (TODO / IN_PROGRESS / DONE). Each
//! lane imposes a total order over its tasks; the order is authoritative on
//! the server and the client's sequence is a cache.
//!
//! Partial updates use [`FieldPatch`]: omitting a field and explicitly
//! clearing it are different wire operations and must not be conflated.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// Lane a task sits in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Not started; every task is created here
    Todo,
    /// Being worked on
    InProgress,
    /// Finished
    Done,
}

impl TaskStatus {
    /// All lanes in display order
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire name of the lane
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

/// A task as held in the local cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID; the server is the id authority
    pub id: Uuid,
    /// Owning board
    pub board_id: Uuid,
    /// Task name
    pub name: String,
    /// Lane the task sits in
    pub status: TaskStatus,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// Assigned member user ids; removal of a member from the board does
    /// not retroactively unassign
    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
    /// Last server-side modification time
    pub updated_at: DateTime<Utc>,
}

/// Three-state patch for one optional field.
///
/// `Keep` leaves the field out of the request body entirely, `Clear` sends
/// an explicit `null`, `Set` sends the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Leave the field untouched (omitted from the wire)
    Keep,
    /// Explicitly clear the field (sent as `null`)
    Clear,
    /// Replace the field with a new value
    Set(T),
}

// Manual impl: the derive would demand `T: Default`, which rules out
// `FieldPatch<DateTime<Utc>>`.
impl<T> Default for FieldPatch<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> FieldPatch<T> {
    /// Whether the patch leaves the field untouched
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Partial update for `PATCH tasks/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New name, if changing
    pub name: Option<String>,
    /// Description patch
    pub description: FieldPatch<String>,
    /// Deadline patch
    pub deadline: FieldPatch<DateTime<Utc>>,
    /// Full replacement assignee set, if changing
    pub assigned_to: Option<Vec<Uuid>>,
}

impl TaskPatch {
    /// Whether the patch carries no change at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_keep()
            && self.deadline.is_keep()
            && self.assigned_to.is_none()
    }

    /// Render the patch to a JSON request body.
    ///
    /// `Keep` fields are absent from the object, `Clear` fields are present
    /// as `null`.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(name) = &self.name {
            body.insert("name".to_string(), json!(name));
        }
        match &self.description {
            FieldPatch::Keep => {}
            FieldPatch::Clear => {
                body.insert("description".to_string(), Value::Null);
            }
            FieldPatch::Set(text) => {
                body.insert("description".to_string(), json!(text));
            }
        }
        match &self.deadline {
            FieldPatch::Keep => {}
            FieldPatch::Clear => {
                body.insert("deadline".to_string(), Value::Null);
            }
            FieldPatch::Set(when) => {
                body.insert("deadline".to_string(), json!(when));
            }
        }
        if let Some(user_ids) = &self.assigned_to {
            body.insert("assignedTo".to_string(), json!(user_ids));
        }
        Value::Object(body)
    }
}

/// Build a deadline patch from form-style date and time inputs.
///
/// A date without a time is normalized to end-of-day in the given timezone.
/// Clearing both inputs when a deadline previously existed sends an explicit
/// clear; clearing them when none existed is a no-op.
pub fn deadline_patch_in<Tz: TimeZone>(
    tz: &Tz,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    had_deadline: bool,
) -> FieldPatch<DateTime<Utc>> {
    let Some(date) = date else {
        if had_deadline {
            return FieldPatch::Clear;
        }
        return FieldPatch::Keep;
    };
    let time = time.unwrap_or_else(end_of_day);
    let naive = date.and_time(time);
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        // DST gap or fold: take the earlier interpretation
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz.from_utc_datetime(&naive),
    };
    FieldPatch::Set(local.with_timezone(&Utc))
}

/// [`deadline_patch_in`] against the machine's local timezone
pub fn deadline_patch(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    had_deadline: bool,
) -> FieldPatch<DateTime<Utc>> {
    deadline_patch_in(&chrono::Local, date, time, had_deadline)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        let status: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
        assert_eq!(TaskStatus::Todo.as_str(), "TODO");
    }

    #[test]
    fn test_task_tolerates_missing_optional_fields() {
        let json = format!(
            r#"{{"id":"{}","boardId":"{}","name":"Ship it","status":"TODO","updatedAt":"2026-01-10T12:00:00Z"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let task: Task = serde_json::from_str(&json).unwrap();
        assert!(task.description.is_none());
        assert!(task.deadline.is_none());
        assert!(task.assigned_to.is_empty());
    }

    #[test]
    fn test_empty_patch_body_is_empty_object() {
        let patch = TaskPatch::default();
        assert!(patch.is_empty());
        assert_eq!(patch.to_body(), serde_json::json!({}));
    }

    #[test]
    fn test_clear_is_null_and_keep_is_absent() {
        let patch = TaskPatch {
            description: FieldPatch::Clear,
            ..TaskPatch::default()
        };
        let body = patch.to_body();
        assert!(body.get("description").unwrap().is_null());
        assert!(body.get("deadline").is_none());
        assert!(body.get("name").is_none());
    }

    #[test]
    fn test_set_fields_serialize_values() {
        let id = Uuid::new_v4();
        let patch = TaskPatch {
            name: Some("Renamed".to_string()),
            description: FieldPatch::Set("details".to_string()),
            assigned_to: Some(vec![id]),
            ..TaskPatch::default()
        };
        let body = patch.to_body();
        assert_eq!(body["name"], "Renamed");
        assert_eq!(body["description"], "details");
        assert_eq!(body["assignedTo"][0], serde_json::json!(id));
    }

    #[test]
    fn test_date_only_deadline_becomes_end_of_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let patch = deadline_patch_in(&Utc, Some(date), None, false);
        match patch {
            FieldPatch::Set(when) => {
                assert_eq!(when, Utc.with_ymd_and_hms(2026, 3, 14, 23, 59, 59).unwrap());
            }
            _ => panic!("Expected Set"),
        }
    }

    #[test]
    fn test_date_and_time_combine() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        let patch = deadline_patch_in(&Utc, Some(date), Some(time), true);
        match patch {
            FieldPatch::Set(when) => {
                assert_eq!(when, Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap());
            }
            _ => panic!("Expected Set"),
        }
    }

    #[test]
    fn test_cleared_inputs_with_prior_deadline_send_clear() {
        let patch = deadline_patch_in(&Utc, None, None, true);
        assert_eq!(patch, FieldPatch::Clear);
    }

    #[test]
    fn test_cleared_inputs_without_prior_deadline_are_kept_out() {
        let patch = deadline_patch_in(&Utc, None, None, false);
        assert_eq!(patch, FieldPatch::Keep);
    }
}
