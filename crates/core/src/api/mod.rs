//! Remote task service API
//!
//! [`TodoApi`] is the seam the stores talk through. [`HttpTodoApi`] is the
//! real implementation; tests substitute scripted fakes.

mod http;
mod wire;

use async_trait::async_trait;

use crate::session::{AuthPayload, Identity};
use crate::task::{Task, TaskStatus};
use crate::Result;

pub use http::HttpTodoApi;
pub use wire::{endpoints, Envelope, SignupRequest};

/// One method per logical operation; each call is exactly one request.
#[async_trait]
pub trait TodoApi: Send + Sync {
    /// Register a new account
    async fn signup(&self, request: &SignupRequest) -> Result<AuthPayload>;

    /// Exchange credentials for an identity
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload>;

    /// List the identity's tasks, optionally restricted to one status
    async fn list_tasks(&self, identity: &Identity, status: Option<TaskStatus>)
        -> Result<Vec<Task>>;

    /// Create a task
    async fn add_task(&self, identity: &Identity, title: &str, description: &str) -> Result<Task>;

    /// Replace a task's title and description
    async fn update_task(
        &self,
        identity: &Identity,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Task>;

    /// Set a task's status
    async fn set_task_status(&self, identity: &Identity, id: &str, status: TaskStatus)
        -> Result<Task>;

    /// Delete a task
    async fn delete_task(&self, identity: &Identity, id: &str) -> Result<()>;
}
