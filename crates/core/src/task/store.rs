//! Task store
//!
//! In-memory task collection for the current session. Every operation
//! reads the live identity from the [`SessionStore`], performs one service
//! round trip without holding any lock, then applies the result. Results
//! are applied in arrival order; a slow refresh can overwrite a task
//! appended by a faster create.

use futures::future::try_join;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::model::{Task, TaskCounts, TaskFilter, TaskStatus};
use crate::api::TodoApi;
use crate::config::RefreshMode;
use crate::in_flight::{is_busy, InFlight};
use crate::notify::{Notification, Notifier};
use crate::session::{Identity, SessionStore};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct TaskState {
    tasks: Vec<Task>,
    error: Option<String>,
    /// Session epoch the collection belongs to
    epoch: u64,
    /// Set when a signed-in epoch begins, cleared by the first successful
    /// refresh in it
    needs_load: bool,
}

/// Task collection state container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<TaskInner>,
}

struct TaskInner {
    api: Arc<dyn TodoApi>,
    session: SessionStore,
    notifier: Notifier,
    refresh_mode: RefreshMode,
    state: RwLock<TaskState>,
    in_flight: AtomicUsize,
}

impl TaskStore {
    pub fn new(
        api: Arc<dyn TodoApi>,
        session: SessionStore,
        notifier: Notifier,
        refresh_mode: RefreshMode,
    ) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                api,
                session,
                notifier,
                refresh_mode,
                state: RwLock::new(TaskState::default()),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Snapshot of the collection
    pub async fn tasks(&self) -> Vec<Task> {
        self.view(|state| state.tasks.clone()).await
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        self.view(|state| state.tasks.iter().find(|t| t.id == id).cloned())
            .await
    }

    /// Tasks passing `filter` whose title or description contains `query`
    pub async fn filtered(&self, filter: TaskFilter, query: &str) -> Vec<Task> {
        self.view(|state| {
            state
                .tasks
                .iter()
                .filter(|t| filter.matches(t) && t.matches_query(query))
                .cloned()
                .collect()
        })
        .await
    }

    pub async fn counts(&self) -> TaskCounts {
        self.view(|state| TaskCounts::from_tasks(&state.tasks)).await
    }

    /// Message of the most recent failed operation
    pub async fn error(&self) -> Option<String> {
        self.view(|state| state.error.clone()).await
    }

    pub fn is_loading(&self) -> bool {
        is_busy(&self.inner.in_flight)
    }

    /// Follow the session: drop a collection left over from an earlier
    /// identity and, until the current one has loaded successfully,
    /// fetch theirs.
    pub async fn sync_session(&self) -> Result<()> {
        let (_, identity, needs_load) = self.scope().await;
        match identity {
            Some(_) if needs_load => self.refresh().await,
            _ => Ok(()),
        }
    }

    /// Replace the collection with the service's copy
    pub async fn refresh(&self) -> Result<()> {
        let (epoch, Some(identity), _) = self.scope().await else {
            return Ok(());
        };
        let _loading = self.begin(epoch).await;

        match self.fetch_all(&identity).await {
            Ok(tasks) => {
                let count = tasks.len();
                let loaded = self
                    .apply(epoch, |state| {
                        state.tasks = tasks;
                        state.needs_load = false;
                    })
                    .await;
                if loaded {
                    info!("Loaded {} tasks", count);
                }
                Ok(())
            }
            Err(e) => self.fail(epoch, "refresh", e).await,
        }
    }

    /// Create a task and append it. An empty title is rejected locally.
    pub async fn create(&self, title: &str, description: &str) -> Result<Option<Task>> {
        let (epoch, Some(identity), _) = self.scope().await else {
            return Ok(None);
        };
        let _loading = self.begin(epoch).await;

        let title = title.trim();
        if title.is_empty() {
            return self
                .fail(epoch, "create", Error::validation("Title is required"))
                .await;
        }

        match self
            .inner
            .api
            .add_task(&identity, title, description.trim())
            .await
        {
            Ok(task) => {
                let created = task.clone();
                if self.apply(epoch, |state| state.tasks.push(task)).await {
                    self.succeed("Task added successfully");
                }
                Ok(Some(created))
            }
            Err(e) => self.fail(epoch, "create", e).await,
        }
    }

    /// Replace a task's title and description. A task missing from the
    /// local collection is left alone.
    pub async fn update(&self, id: &str, title: &str, description: &str) -> Result<Option<Task>> {
        let (epoch, Some(identity), _) = self.scope().await else {
            return Ok(None);
        };
        let _loading = self.begin(epoch).await;

        let title = title.trim();
        if title.is_empty() {
            return self
                .fail(epoch, "update", Error::validation("Title is required"))
                .await;
        }

        match self
            .inner
            .api
            .update_task(&identity, id, title, description.trim())
            .await
        {
            Ok(task) => {
                self.replace(epoch, id, task.clone(), "Task updated successfully")
                    .await;
                Ok(Some(task))
            }
            Err(e) => self.fail(epoch, "update", e).await,
        }
    }

    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<Option<Task>> {
        let (epoch, Some(identity), _) = self.scope().await else {
            return Ok(None);
        };
        let _loading = self.begin(epoch).await;

        match self
            .inner
            .api
            .set_task_status(&identity, id, status)
            .await
        {
            Ok(task) => {
                let message = format!("Task marked as {}", status);
                self.replace(epoch, id, task.clone(), &message).await;
                Ok(Some(task))
            }
            Err(e) => self.fail(epoch, "set status", e).await,
        }
    }

    /// Flip a loaded task between active and completed
    pub async fn toggle(&self, id: &str) -> Result<Option<Task>> {
        let Some(task) = self.get(id).await else {
            debug!("Toggle ignored, task {} is not loaded", id);
            return Ok(None);
        };
        self.set_status(id, task.toggled_status()).await
    }

    /// Delete a task. Only the service's answer decides failure; a task
    /// already missing locally is fine.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let (epoch, Some(identity), _) = self.scope().await else {
            return Ok(());
        };
        let _loading = self.begin(epoch).await;

        match self.inner.api.delete_task(&identity, id).await {
            Ok(()) => {
                if self
                    .apply(epoch, |state| state.tasks.retain(|t| t.id != id))
                    .await
                {
                    self.succeed("Task deleted successfully");
                }
                Ok(())
            }
            Err(e) => self.fail(epoch, "delete", e).await,
        }
    }

    async fn fetch_all(&self, identity: &Identity) -> Result<Vec<Task>> {
        let api = &self.inner.api;
        match self.inner.refresh_mode {
            RefreshMode::Combined => api.list_tasks(identity, None).await,
            RefreshMode::SplitByStatus => {
                let (mut active, completed) = try_join(
                    api.list_tasks(identity, Some(TaskStatus::Active)),
                    api.list_tasks(identity, Some(TaskStatus::Completed)),
                )
                .await?;
                active.extend(completed);
                Ok(active)
            }
        }
    }

    /// Read the state, or an empty one if the session has moved on since
    /// the collection was loaded.
    async fn view<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&TaskState) -> R,
    {
        let (epoch, _) = self.inner.session.current().await;
        let state = self.inner.state.read().await;
        if state.epoch == epoch {
            f(&*state)
        } else {
            f(&TaskState::default())
        }
    }

    /// Align the collection with the session epoch, clearing it on change.
    /// Also reports whether the current identity still needs its first load.
    async fn scope(&self) -> (u64, Option<Identity>, bool) {
        let (epoch, identity) = self.inner.session.current().await;
        let mut state = self.inner.state.write().await;
        if state.epoch != epoch {
            debug!("Session changed, clearing {} tasks", state.tasks.len());
            state.tasks.clear();
            state.error = None;
            state.epoch = epoch;
            state.needs_load = identity.is_some();
        }
        (epoch, identity, state.needs_load)
    }

    async fn begin(&self, epoch: u64) -> InFlight<'_> {
        let loading = InFlight::enter(&self.inner.in_flight);
        let mut state = self.inner.state.write().await;
        if state.epoch == epoch {
            state.error = None;
        }
        loading
    }

    /// Run `f` on the state if it still belongs to `epoch`
    async fn apply<F>(&self, epoch: u64, f: F) -> bool
    where
        F: FnOnce(&mut TaskState),
    {
        let mut state = self.inner.state.write().await;
        if state.epoch != epoch {
            debug!("Dropping result from a previous session");
            return false;
        }
        f(&mut state);
        true
    }

    async fn replace(&self, epoch: u64, id: &str, task: Task, message: &str) {
        let applied = self
            .apply(epoch, |state| {
                match state.tasks.iter_mut().find(|t| t.id == id) {
                    Some(slot) => *slot = task,
                    None => debug!("Task {} not in local collection, ignoring", id),
                }
            })
            .await;
        if applied {
            self.succeed(message);
        }
    }

    fn succeed(&self, message: &str) {
        self.inner
            .notifier
            .notify(Notification::success("Success", message));
    }

    async fn fail<T>(&self, epoch: u64, operation: &str, error: Error) -> Result<T> {
        warn!("Task {} failed: {}", operation, error);
        let message = error.to_string();
        {
            let mut state = self.inner.state.write().await;
            if state.epoch == epoch {
                state.error = Some(message.clone());
            }
        }
        self.inner
            .notifier
            .notify(Notification::error("Error", message));
        Err(error)
    }
}
