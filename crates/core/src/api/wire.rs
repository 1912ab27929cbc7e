//! Request and response bodies exchanged with the service

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};
use crate::{Error, Result};

/// Endpoint paths, relative to the configured base URL
pub mod endpoints {
    pub const SIGNUP: &str = "/signup_action.php";
    pub const LOGIN: &str = "/signin_action.php";
    pub const LIST_TASKS: &str = "/getItems_action.php";
    pub const ADD_TASK: &str = "/addItem_action.php";
    pub const UPDATE_TASK: &str = "/editItem_action.php";
    pub const SET_STATUS: &str = "/statusItem_action.php";
    pub const DELETE_TASK: &str = "/deleteItem_action.php";
}

/// Every response body is wrapped in this envelope
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Fail with the service's message (or `fallback`) unless `success`.
    pub fn check(&self, fallback: &str) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(Error::application(
            self.error
                .clone()
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        ))
    }

    /// The payload of a successful envelope
    pub fn into_data(self, fallback: &str) -> Result<T> {
        self.check(fallback)?;
        self.data
            .ok_or_else(|| Error::InvalidResponse("response is missing its data".into()))
    }
}

/// Body of a non-success HTTP response, when it is JSON at all
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskListData {
    #[serde(default)]
    pub todos: Vec<Task>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskData {
    pub todo: Task,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct AddTaskRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Serialize)]
pub(crate) struct UpdateTaskRequest<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Serialize)]
pub(crate) struct StatusRequest<'a> {
    pub id: &'a str,
    pub status: TaskStatus,
}

#[derive(Serialize)]
pub(crate) struct DeleteRequest<'a> {
    pub id: &'a str,
}
