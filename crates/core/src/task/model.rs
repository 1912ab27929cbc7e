//! Task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::serde_helpers::{flexible_id, timestamp};
use crate::Error;

/// Task status. Older service revisions call the second state `inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    #[serde(alias = "inactive")]
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// The other status, as used by a toggle control
    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Completed,
            Self::Completed => Self::Active,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" | "inactive" => Ok(Self::Completed),
            _ => Err(Error::validation(format!(
                "Unsupported task status '{}'",
                value
            ))),
        }
    }
}

/// A to-do item as held by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(deserialize_with = "flexible_id::deserialize")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    /// Identity the task belongs to, when the service reports it
    #[serde(
        default,
        alias = "user_id",
        deserialize_with = "flexible_id::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<String>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Status a toggle control should request next
    pub fn toggled_status(&self) -> TaskStatus {
        self.status.toggled()
    }

    /// Case-insensitive substring match on title or description.
    /// An empty query matches every task.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// Which slice of the collection a list view shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => task.status == TaskStatus::Active,
            Self::Completed => task.status == TaskStatus::Completed,
        }
    }
}

impl FromStr for TaskFilter {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(Error::validation(format!("Unsupported filter '{}'", value))),
        }
    }
}

/// Per-status tallies of the collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Active => counts.active += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
            counts
        })
    }
}
