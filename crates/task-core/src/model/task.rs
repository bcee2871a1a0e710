use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// The three lifecycle states of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Wire form, identical to the serialized value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the known statuses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}': expected one of todo, in-progress, done")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// A single field change applied by [`Task::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskUpdate {
    Description(String),
    Status(Status),
}

/// One persisted task record.
///
/// Keys not known to this version are carried in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub description: String,
    pub status: Status,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Task {
    /// Create a `todo` task whose two timestamps are both `now`.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: Status::Todo,
            created_at: now,
            updated_at: now,
            extra: BTreeMap::new(),
        }
    }

    /// Set the named field and refresh `updated_at`.
    pub fn apply(&mut self, update: TaskUpdate, now: DateTime<Utc>) {
        match update {
            TaskUpdate::Description(description) => self.description = description,
            TaskUpdate::Status(status) => self.status = status,
        }
        self.updated_at = now;
    }

    /// Exact string match against the status wire form.
    #[must_use]
    pub fn has_status(&self, status: &str) -> bool {
        self.status.as_str() == status
    }
}

/// Current time at the millisecond precision the task file stores.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// RFC 3339 timestamps with millisecond precision and a `Z` suffix.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_708_012_200_000 + ms).unwrap()
    }

    #[test]
    fn status_wire_forms() {
        assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in-progress\"");
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>(), Ok(status));
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn status_parse_is_exact() {
        assert!("Done".parse::<Status>().is_err());
        assert!("in_progress".parse::<Status>().is_err());
        assert!(" todo".parse::<Status>().is_err());
    }

    #[test]
    fn new_task_is_todo_with_equal_timestamps() {
        let task = Task::new("42", "buy milk", fixed(0));
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.description, "buy milk");
    }

    #[test]
    fn apply_refreshes_only_updated_at() {
        let mut task = Task::new("42", "buy milk", fixed(0));
        task.apply(TaskUpdate::Status(Status::Done), fixed(5));
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.created_at, fixed(0));
        assert_eq!(task.updated_at, fixed(5));

        task.apply(TaskUpdate::Description("buy oat milk".into()), fixed(9));
        assert_eq!(task.description, "buy oat milk");
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.updated_at, fixed(9));
    }

    #[test]
    fn serializes_camel_case_keys_and_millisecond_timestamps() {
        let task = Task::new("1", "a", fixed(7));
        let value = serde_json::to_value(&task).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["createdAt", "description", "id", "status", "updatedAt"]);
        assert_eq!(obj["createdAt"], "2024-02-15T15:50:00.007Z");
        assert_eq!(obj["status"], "todo");
    }

    #[test]
    fn reads_records_written_by_other_tools() {
        let raw = r#"{
          "id": "8337423512038847",
          "description": "water plants",
          "status": "in-progress",
          "createdAt": "2024-09-01T08:15:30.123Z",
          "updatedAt": "2024-09-02T10:00:00.000Z",
          "priority": 2
        }"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.status, Status::InProgress);
        assert_eq!(task.extra.get("priority"), Some(&serde_json::json!(2)));

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["priority"], 2);
        assert_eq!(back["createdAt"], "2024-09-01T08:15:30.123Z");
    }

    #[test]
    fn rejects_unknown_status_and_bad_timestamps() {
        let bad_status = r#"{"id":"1","description":"","status":"blocked",
            "createdAt":"2024-09-01T08:15:30.123Z","updatedAt":"2024-09-01T08:15:30.123Z"}"#;
        assert!(serde_json::from_str::<Task>(bad_status).is_err());

        let bad_time = r#"{"id":"1","description":"","status":"todo",
            "createdAt":"yesterday","updatedAt":"2024-09-01T08:15:30.123Z"}"#;
        assert!(serde_json::from_str::<Task>(bad_time).is_err());
    }

    #[test]
    fn now_has_millisecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn has_status_matches_wire_form_only() {
        let task = Task::new("1", "a", fixed(0));
        assert!(task.has_status("todo"));
        assert!(!task.has_status("Todo"));
        assert!(!task.has_status("done"));
    }
}
