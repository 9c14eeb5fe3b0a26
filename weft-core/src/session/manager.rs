//! Session table, message loop and eviction.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{Config, Connection, ConnectionState, Pusher, SessionId};
use crate::component::ComponentRef;
use crate::error::{ConfigError, LiveError};
use crate::router::Event;
use crate::transport::{Inbound, Outbound};

/// Builds the root component for a new session.
pub type RootFactory = Arc<dyn Fn(Pusher) -> ComponentRef + Send + Sync>;

/// Owns every live session.
///
/// Cheap to clone; clones share the session table, so one can be moved into
/// each accept task and another into the sweeper.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    factory: RootFactory,
    connections: DashMap<SessionId, Arc<Connection>>,
}

impl SessionManager {
    /// Create a manager that builds each new session's root with `factory`.
    pub fn new<F>(config: Config, factory: F) -> Result<Self, ConfigError>
    where
        F: Fn(Pusher) -> ComponentRef + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                factory: Arc::new(factory),
                connections: DashMap::new(),
            }),
        })
    }

    /// The validated configuration this manager runs with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Number of retained sessions, connected or not.
    pub fn len(&self) -> usize {
        self.inner.connections.len()
    }

    /// Whether no sessions are retained.
    pub fn is_empty(&self) -> bool {
        self.inner.connections.is_empty()
    }

    /// Look up a retained session.
    pub fn get(&self, session: &SessionId) -> Option<Arc<Connection>> {
        self.inner.connections.get(session).map(|c| Arc::clone(c.value()))
    }

    /// Resume `session` or create it, and bind `outbound` as its transport.
    ///
    /// Returns the connection and the attach epoch.
    pub async fn connect(&self, session: SessionId, outbound: Outbound) -> (Arc<Connection>, u64) {
        let connection = self.resume_or_create(session);
        let epoch = connection.attach(outbound).await;
        (connection, epoch)
    }

    fn resume_or_create(&self, session: SessionId) -> Arc<Connection> {
        // Touch under the map's shard lock so a concurrent sweep rechecking
        // expiry sees the refreshed time.
        let resumed = self.inner.connections.get(&session).map(|c| {
            c.touch();
            Arc::clone(c.value())
        });
        if let Some(connection) = resumed {
            info!(session = %session, "session resumed");
            return connection;
        }

        // Build outside the map so the factory may call back into the manager.
        let connection = Arc::new_cyclic(|weak| {
            let root = (self.inner.factory)(Pusher::new(session.clone(), weak.clone()));
            Connection::new(session.clone(), root)
        });

        let entry = self.inner.connections.entry(session.clone()).or_insert(connection);
        entry.touch();
        info!(session = %session, "session created");
        Arc::clone(entry.value())
    }

    /// Run a session over a transport until the client goes away or the
    /// transport fails.
    ///
    /// The session's state is retained afterwards either way. Returns the
    /// error that ended the loop, if any.
    pub async fn serve(&self, session: SessionId, inbound: Inbound, outbound: Outbound) -> Result<(), LiveError> {
        let (connection, epoch) = self.connect(session, outbound).await;
        let result = self.run(&connection, epoch, inbound).await;

        match &result {
            Ok(()) => info!(session = %connection.session(), "client disconnected"),
            Err(err) => warn!(session = %connection.session(), error = %err, "connection loop ended"),
        }
        connection.detach(epoch).await;
        result
    }

    async fn run(&self, connection: &Connection, epoch: u64, mut inbound: Inbound) -> Result<(), LiveError> {
        while let Some(frame) = inbound.next().await {
            let text = frame?;
            if connection.state() == ConnectionState::Evicted {
                return Err(LiveError::Evicted(connection.session().clone()));
            }
            if connection.epoch() != epoch {
                debug!(session = %connection.session(), "superseded by a newer transport");
                return Ok(());
            }

            connection.touch();
            debug!(session = %connection.session(), message = %text, "recv");
            let event = Event::decode(&text)?;
            if event == Event::Heartbeat {
                continue;
            }

            if let Err(err) = connection.apply(&event) {
                warn!(session = %connection.session(), error = %err, "event rejected");
            }
            connection.push().await?;
        }
        Ok(())
    }

    /// Render and send the root of `session` now.
    pub async fn push(&self, session: &SessionId) -> Result<(), LiveError> {
        match self.get(session) {
            Some(connection) => connection.push().await,
            None => Err(LiveError::Evicted(session.clone())),
        }
    }

    /// Evict every session not heard from within the retention window as of
    /// `now`, then prune dead components from the survivors' registries.
    /// Returns the evicted identifiers.
    pub async fn sweep_at(&self, now: Instant) -> Vec<SessionId> {
        // No session can be older than the process clock allows.
        let cutoff = now.checked_sub(self.inner.config.retention);
        let expired = |connection: &Connection| cutoff.is_some_and(|cutoff| connection.is_expired(cutoff));

        let candidates: Vec<SessionId> = self
            .inner
            .connections
            .iter()
            .filter(|entry| expired(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::with_capacity(candidates.len());
        for session in candidates {
            // Recheck: the client may have come back since the scan.
            let removed = self.inner.connections.remove_if(&session, |_, connection| expired(connection));
            if let Some((session, connection)) = removed {
                connection.evict();
                info!(session = %session, "session evicted");
                evicted.push(session);
            }
        }

        let pruned: usize = self
            .inner
            .connections
            .iter()
            .map(|entry| entry.value().registry().prune())
            .sum();
        debug!(sessions = evicted.len(), components = pruned, "sweep finished");
        evicted
    }

    /// Sweep as of the current instant.
    pub async fn sweep(&self) -> Vec<SessionId> {
        self.sweep_at(Instant::now()).await
    }

    /// Sweep every `sweep_interval` until the returned task is aborted.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config().sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.sweep().await;
            }
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.inner.config)
            .field("sessions", &self.inner.connections.len())
            .finish_non_exhaustive()
    }
}
