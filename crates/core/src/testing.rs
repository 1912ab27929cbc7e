//! Scripted in-memory stand-in for the remote service

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::api::{SignupRequest, TodoApi};
use crate::session::{AuthPayload, Identity, UserProfile};
use crate::task::{Task, TaskStatus};
use crate::{Error, Result};

struct Account {
    identity: Identity,
    password: String,
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<Account>,
    tasks: Vec<Task>,
    next_id: u64,
    offline: bool,
    failing_status: Option<TaskStatus>,
    list_gate: Option<Arc<Notify>>,
    calls: Vec<&'static str>,
}

/// Service double: accounts and tasks live in memory, failures are toggled
/// by the test.
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

pub(crate) const ADA_EMAIL: &str = "ada@example.com";
pub(crate) const GRACE_EMAIL: &str = "grace@example.com";
pub(crate) const PASSWORD: &str = "secret1";

impl FakeApi {
    /// Two accounts (Ada, Grace) sharing [`PASSWORD`], no tasks
    pub(crate) fn new() -> Arc<Self> {
        let api = Self {
            state: Mutex::new(FakeState::default()),
        };
        api.add_account("1", "Ada", "Lovelace", ADA_EMAIL);
        api.add_account("2", "Grace", "Hopper", GRACE_EMAIL);
        Arc::new(api)
    }

    fn add_account(&self, id: &str, first: &str, last: &str, email: &str) {
        self.state.lock().unwrap().accounts.push(Account {
            identity: Identity {
                id: id.into(),
                first_name: first.into(),
                last_name: last.into(),
                email: email.into(),
                token: Some(format!("token-{}", id)),
            },
            password: PASSWORD.into(),
        });
    }

    /// Insert a task on the service side only
    pub(crate) fn seed_task(&self, owner: &str, title: &str, status: TaskStatus) -> Task {
        let mut state = self.state.lock().unwrap();
        let task = Self::new_task(&mut state, owner, title, "", status);
        state.tasks.push(task.clone());
        task
    }

    /// Every call fails with a transport error while set
    pub(crate) fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// List calls filtered by this status fail
    pub(crate) fn fail_list_for(&self, status: TaskStatus) {
        self.state.lock().unwrap().failing_status = Some(status);
    }

    /// List calls take their result immediately but only return once the
    /// returned handle is notified.
    pub(crate) fn hold_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state.lock().unwrap().list_gate = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn server_tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    fn new_task(
        state: &mut FakeState,
        owner: &str,
        title: &str,
        description: &str,
        status: TaskStatus,
    ) -> Task {
        state.next_id += 1;
        let now = Utc::now();
        Task {
            id: format!("t{}", state.next_id),
            title: title.into(),
            description: description.into(),
            status,
            created_at: now,
            updated_at: now,
            user_id: Some(owner.into()),
        }
    }

    fn begin(&self, call: &'static str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.offline {
            return Err(Error::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn edit<F>(&self, identity: &Identity, id: &str, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task),
    {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id.as_deref() == Some(identity.id.as_str()))
            .ok_or_else(|| Error::application("Task not found"))?;
        f(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }
}

#[async_trait]
impl TodoApi for FakeApi {
    async fn signup(&self, request: &SignupRequest) -> Result<AuthPayload> {
        self.begin("signup")?;
        let mut state = self.state.lock().unwrap();
        if state.accounts.iter().any(|a| a.identity.email == request.email) {
            return Err(Error::application("Email already registered"));
        }
        let id = format!("{}", state.accounts.len() + 1);
        let identity = Identity {
            id: id.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            token: Some(format!("token-{}", id)),
        };
        state.accounts.push(Account {
            identity: identity.clone(),
            password: request.password.clone(),
        });
        Ok(payload(identity))
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload> {
        self.begin("login")?;
        let state = self.state.lock().unwrap();
        state
            .accounts
            .iter()
            .find(|a| a.identity.email == email && a.password == password)
            .map(|a| payload(a.identity.clone()))
            .ok_or_else(|| Error::application("Invalid credentials"))
    }

    async fn list_tasks(
        &self,
        identity: &Identity,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>> {
        self.begin("list")?;
        let (tasks, gate) = {
            let state = self.state.lock().unwrap();
            if status.is_some() && status == state.failing_status {
                return Err(Error::Status {
                    status: 500,
                    message: "Something went wrong (500)".into(),
                });
            }
            let tasks: Vec<Task> = state
                .tasks
                .iter()
                .filter(|t| t.user_id.as_deref() == Some(identity.id.as_str()))
                .filter(|t| status.map_or(true, |s| t.status == s))
                .cloned()
                .collect();
            (tasks, state.list_gate.clone())
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(tasks)
    }

    async fn add_task(&self, identity: &Identity, title: &str, description: &str) -> Result<Task> {
        self.begin("add")?;
        let mut state = self.state.lock().unwrap();
        let task = Self::new_task(&mut state, &identity.id, title, description, TaskStatus::Active);
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        identity: &Identity,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Task> {
        self.begin("update")?;
        self.edit(identity, id, |task| {
            task.title = title.to_string();
            task.description = description.to_string();
        })
    }

    async fn set_task_status(
        &self,
        identity: &Identity,
        id: &str,
        status: TaskStatus,
    ) -> Result<Task> {
        self.begin("status")?;
        self.edit(identity, id, |task| task.status = status)
    }

    async fn delete_task(&self, identity: &Identity, id: &str) -> Result<()> {
        self.begin("delete")?;
        let mut state = self.state.lock().unwrap();
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.id == id && t.user_id.as_deref() == Some(identity.id.as_str())));
        if state.tasks.len() == before {
            return Err(Error::application("Task not found"));
        }
        Ok(())
    }
}

fn payload(identity: Identity) -> AuthPayload {
    AuthPayload {
        token: identity.token.clone(),
        user: UserProfile {
            id: identity.id,
            first_name: identity.first_name,
            last_name: identity.last_name,
            email: identity.email,
            token: None,
        },
    }
}
