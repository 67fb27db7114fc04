//! Async driver that runs a [`SearchSession`] against a gateway.
//!
//! The session itself is synchronous. The driver owns it behind a mutex that
//! is only held for a transition, never across a network call, so a pending
//! search or re-rank does not block view changes, snapshots or a newer
//! submission. Every fetch runs in its own task and applies its completion
//! there, so dropping a caller's future cannot strand the session in a
//! loading phase.
//!
//! After each transition the driver publishes a fresh [`SessionSnapshot`]
//! on a `watch` channel.

use crate::capability::{Capability, CapabilityProbe};
use crate::config::{DisplayConfig, StackrankConfig};
use crate::error::{Result, StackrankError};
use crate::merger::ViewMode;
use crate::session::{SearchSession, SessionSnapshot};
use stackrank_gateway::{AnswerGateway, Query, RecentSearch};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shared handle to one search session. Cheap to clone.
pub struct SessionDriver<G> {
    gateway: Arc<G>,
    session: Arc<Mutex<SearchSession>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
    probe: CapabilityProbe,
    display: DisplayConfig,
}

impl<G> Clone for SessionDriver<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            session: Arc::clone(&self.session),
            updates: Arc::clone(&self.updates),
            probe: self.probe.clone(),
            display: self.display.clone(),
        }
    }
}

impl<G: AnswerGateway + 'static> SessionDriver<G> {
    /// Create a driver with a fresh idle session.
    pub fn new(gateway: G, config: &StackrankConfig) -> Self {
        let session = SearchSession::new();
        let (updates, _) = watch::channel(session.snapshot(&config.display));
        Self {
            gateway: Arc::new(gateway),
            session: Arc::new(Mutex::new(session)),
            updates: Arc::new(updates),
            probe: CapabilityProbe::new(&config.ranking),
            display: config.display.clone(),
        }
    }

    #[cfg(test)]
    fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.updates.borrow().clone()
    }

    /// Run the capability probe and record its verdict.
    ///
    /// Returns the capability in effect afterwards, which is the first
    /// verdict ever recorded for this session. Once a verdict is recorded
    /// the backend is not contacted again.
    pub async fn init_capability(&self) -> Capability {
        let current = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .capability();
        if current.is_resolved() {
            return current;
        }
        let verdict = self.probe.run(self.gateway.as_ref()).await;
        self.with_session(|session| {
            session.resolve_capability(verdict);
            session.capability()
        })
    }

    /// [`SessionDriver::init_capability`] on a background task.
    pub fn spawn_capability_probe(&self) -> JoinHandle<Capability> {
        let driver = self.clone();
        tokio::spawn(async move { driver.init_capability().await })
    }

    /// Start a new query and wait for its base search to settle.
    ///
    /// Search failures are recorded in the session and show up in the
    /// returned snapshot. If a newer query was submitted meanwhile, the
    /// returned snapshot describes that newer query.
    ///
    /// # Errors
    ///
    /// Returns [`StackrankError::Gateway`] without touching the session if
    /// `raw` is blank, or [`StackrankError::Channel`] if the fetch task
    /// panicked.
    pub async fn submit_query(&self, raw: &str) -> Result<SessionSnapshot> {
        let query = Query::new(raw)?;
        let ticket = self.with_session(|session| session.begin_search(query));

        let driver = self.clone();
        tokio::spawn(async move {
            let outcome = driver.gateway.search(ticket.query()).await;
            driver.with_session(|session| session.complete_search(&ticket, outcome))
        })
        .await
        .map_err(|e| StackrankError::Channel(format!("search task failed: {e}")))?;

        Ok(self.snapshot())
    }

    /// Switch the presented ordering.
    ///
    /// The first selection of [`ViewMode::Ranked`] for a query fetches the
    /// ranking and waits for it; any other selection returns at once.
    ///
    /// # Errors
    ///
    /// Returns [`StackrankError::View`] if the session refuses the view, or
    /// [`StackrankError::Channel`] if the fetch task panicked.
    pub async fn select_view(&self, view: ViewMode) -> Result<SessionSnapshot> {
        let ticket = self.with_session(|session| session.select_view(view))?;

        if let Some(ticket) = ticket {
            let driver = self.clone();
            tokio::spawn(async move {
                let outcome = driver
                    .gateway
                    .rerank(ticket.question(), ticket.answers())
                    .await;
                driver.with_session(|session| session.complete_rerank(&ticket, outcome))
            })
            .await
            .map_err(|e| StackrankError::Channel(format!("ranking task failed: {e}")))?;
        }

        Ok(self.snapshot())
    }

    /// Recently submitted queries, straight from the backend.
    ///
    /// # Errors
    ///
    /// Returns [`StackrankError::Gateway`] if the backend call fails.
    pub async fn recent_searches(&self) -> Result<Vec<RecentSearch>> {
        Ok(self.gateway.recent_searches().await?)
    }

    /// Apply `f` under the lock and publish the resulting snapshot if it
    /// differs from the last one.
    fn with_session<R>(&self, f: impl FnOnce(&mut SearchSession) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        let result = f(&mut session);
        let snapshot = session.snapshot(&self.display);
        self.updates.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
        result
    }
}
