//! Session store
//!
//! Holds the authenticated identity (at most one per process) and keeps
//! the persisted snapshot in step with it.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};

use super::model::Identity;
use super::snapshot::{SnapshotStore, SESSION_KEY};
use crate::api::{SignupRequest, TodoApi};
use crate::in_flight::{is_busy, InFlight};
use crate::notify::{Notification, Notifier};
use crate::Result;

#[derive(Debug, Default)]
struct SessionState {
    identity: Option<Identity>,
    error: Option<String>,
    /// Bumped on every identity transition, including re-login as the
    /// same user.
    epoch: u64,
}

/// Authentication state container. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn TodoApi>,
    snapshots: Arc<dyn SnapshotStore>,
    notifier: Notifier,
    state: RwLock<SessionState>,
    in_flight: AtomicUsize,
    identity_tx: watch::Sender<Option<Identity>>,
}

impl SessionStore {
    pub fn new(
        api: Arc<dyn TodoApi>,
        snapshots: Arc<dyn SnapshotStore>,
        notifier: Notifier,
    ) -> Self {
        let (identity_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner {
                api,
                snapshots,
                notifier,
                state: RwLock::new(SessionState::default()),
                in_flight: AtomicUsize::new(0),
                identity_tx,
            }),
        }
    }

    /// Current identity, if authenticated
    pub async fn identity(&self) -> Option<Identity> {
        self.inner.state.read().await.identity.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.state.read().await.identity.is_some()
    }

    /// Message of the most recent failed login/signup
    pub async fn error(&self) -> Option<String> {
        self.inner.state.read().await.error.clone()
    }

    /// True while a login or signup request is outstanding
    pub fn is_loading(&self) -> bool {
        is_busy(&self.inner.in_flight)
    }

    /// Watch identity transitions
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity_tx.subscribe()
    }

    /// Identity together with the epoch it was installed in
    pub(crate) async fn current(&self) -> (u64, Option<Identity>) {
        let state = self.inner.state.read().await;
        (state.epoch, state.identity.clone())
    }

    /// Re-establish the session from the persisted snapshot.
    ///
    /// Never fails: a missing or unreadable snapshot leaves the store
    /// unauthenticated, and an unreadable one is deleted.
    pub async fn restore(&self) -> Option<Identity> {
        let mut state = self.inner.state.write().await;
        let raw = match self.inner.snapshots.get(SESSION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read session snapshot: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Identity>(&raw) {
            Ok(identity) => {
                info!("Restored session for {}", identity.email);
                self.install(&mut state, Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                warn!("Discarding unreadable session snapshot: {}", e);
                if let Err(e) = self.inner.snapshots.remove(SESSION_KEY).await {
                    warn!("Failed to remove session snapshot: {}", e);
                }
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let _loading = InFlight::enter(&self.inner.in_flight);
        self.clear_error().await;

        match self.inner.api.login(email, password).await {
            Ok(payload) => {
                let identity = payload.into_identity();
                self.authenticate(identity.clone()).await;
                self.inner.notifier.notify(Notification::success(
                    "Login Successful",
                    format!("Welcome back, {}!", identity.first_name),
                ));
                Ok(identity)
            }
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                self.record_failure("Login Failed", &e).await;
                Err(e)
            }
        }
    }

    /// Register and authenticate from the signup response in one step.
    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity> {
        let _loading = InFlight::enter(&self.inner.in_flight);
        self.clear_error().await;

        let request = SignupRequest {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.inner.api.signup(&request).await {
            Ok(payload) => {
                let identity = payload.into_identity();
                self.authenticate(identity.clone()).await;
                self.inner.notifier.notify(Notification::success(
                    "Registration Successful",
                    format!("Welcome, {}!", identity.first_name),
                ));
                Ok(identity)
            }
            Err(e) => {
                warn!("Signup failed for {}: {}", email, e);
                self.record_failure("Registration Failed", &e).await;
                Err(e)
            }
        }
    }

    /// Drop the identity and the snapshot. Always succeeds, no request.
    pub async fn logout(&self) {
        {
            let mut state = self.inner.state.write().await;
            if let Err(e) = self.inner.snapshots.remove(SESSION_KEY).await {
                warn!("Failed to remove session snapshot: {}", e);
            }
            state.error = None;
            self.install(&mut state, None);
        }

        info!("Logged out");
        self.inner.notifier.notify(Notification::success(
            "Logged Out",
            "You have been successfully logged out.",
        ));
    }

    /// Install `identity` and persist it under one write guard, so the
    /// snapshot always matches the live identity.
    async fn authenticate(&self, identity: Identity) {
        info!("Authenticated as {}", identity.email);
        let mut state = self.inner.state.write().await;

        match serde_json::to_string(&identity) {
            Ok(raw) => {
                if let Err(e) = self.inner.snapshots.set(SESSION_KEY, raw).await {
                    warn!("Failed to persist session snapshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize session snapshot: {}", e),
        }

        self.install(&mut state, Some(identity));
    }

    fn install(&self, state: &mut SessionState, identity: Option<Identity>) {
        state.identity = identity.clone();
        state.epoch += 1;
        self.inner.identity_tx.send_replace(identity);
    }

    async fn clear_error(&self) {
        self.inner.state.write().await.error = None;
    }

    async fn record_failure(&self, title: &str, error: &crate::Error) {
        let message = error.to_string();
        self.inner.state.write().await.error = Some(message.clone());
        self.inner
            .notifier
            .notify(Notification::error(title, message));
    }
}
