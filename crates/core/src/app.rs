//! Client facade
//!
//! Owns the API client and both stores, and keeps the task collection in
//! step with session transitions.

use std::sync::Arc;

use crate::api::{HttpTodoApi, TodoApi};
use crate::config::ClientConfig;
use crate::notify::{Notification, Notifier};
use crate::session::{FileSnapshotStore, Identity, SessionStore, SnapshotStore};
use crate::task::TaskStore;
use crate::Result;

/// Wiring handed to the presentation layer
#[derive(Clone)]
pub struct TodoClient {
    session: SessionStore,
    tasks: TaskStore,
    notifier: Notifier,
}

impl TodoClient {
    /// HTTP API plus a file snapshot store in `config.data_dir`
    pub async fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = Arc::new(HttpTodoApi::new(config)?);
        let snapshots = Arc::new(FileSnapshotStore::open(&config.data_dir).await?);
        Ok(Self::with_parts(api, snapshots, config))
    }

    pub fn with_parts(
        api: Arc<dyn TodoApi>,
        snapshots: Arc<dyn SnapshotStore>,
        config: &ClientConfig,
    ) -> Self {
        let notifier = Notifier::new();
        let session = SessionStore::new(Arc::clone(&api), snapshots, notifier.clone());
        let tasks = TaskStore::new(api, session.clone(), notifier.clone(), config.refresh_mode);
        Self {
            session,
            tasks,
            notifier,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Restore the persisted session and load its tasks.
    ///
    /// A failing task load is reported through the task store; the
    /// restored identity is returned either way.
    pub async fn restore(&self) -> Option<Identity> {
        let identity = self.session.restore().await;
        let _ = self.tasks.sync_session().await;
        identity
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self.session.login(email, password).await?;
        let _ = self.tasks.sync_session().await;
        Ok(identity)
    }

    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity> {
        let identity = self
            .session
            .signup(first_name, last_name, email, password)
            .await?;
        let _ = self.tasks.sync_session().await;
        Ok(identity)
    }

    pub async fn logout(&self) {
        self.session.logout().await;
        let _ = self.tasks.sync_session().await;
    }
}
