//! A single session's server-side state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;
use std::time::Instant;

use futures_util::SinkExt;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::{ConnectionState, SessionId};
use crate::component::ComponentRef;
use crate::error::{LiveError, RouteError, TransportError};
use crate::registry::Registry;
use crate::render::RenderEngine;
use crate::router::{Ack, Event, EventRouter};
use crate::transport::Outbound;

/// The retained state of one browser session.
///
/// Survives transport drops: a client reattaching with the same
/// [`SessionId`] picks up the same root component.
///
/// Each connection has its own [`Registry`]. A client can only address
/// components this session has rendered; identifiers issued to other
/// sessions never resolve here.
pub struct Connection {
    session: SessionId,
    root: ComponentRef,
    engine: RenderEngine,
    router: EventRouter,
    last_seen: Mutex<Instant>,
    state: Mutex<ConnectionState>,
    /// Bumped on every attach so a stale message loop cannot detach its
    /// successor's transport.
    epoch: AtomicU64,
    /// Held for the whole render-and-send of a push, which serializes writes.
    outbound: tokio::sync::Mutex<Option<Outbound>>,
}

impl Connection {
    pub(crate) fn new(session: SessionId, root: ComponentRef) -> Self {
        let registry = Registry::new();
        Self {
            session,
            root,
            engine: RenderEngine::new(registry.clone()),
            router: EventRouter::new(registry),
            last_seen: Mutex::new(Instant::now()),
            state: Mutex::new(ConnectionState::Connecting),
            epoch: AtomicU64::new(0),
            outbound: tokio::sync::Mutex::new(None),
        }
    }

    /// The session this connection belongs to.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// The root component built for the session.
    pub fn root(&self) -> &ComponentRef {
        &self.root
    }

    /// Identifiers of the components this session has rendered.
    pub fn registry(&self) -> &Registry {
        self.engine.registry()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// When the client was last heard from.
    pub fn last_seen(&self) -> Instant {
        *self.last_seen.lock()
    }

    /// Record client activity.
    pub fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    /// Apply a client event to this session's components.
    pub fn apply(&self, event: &Event) -> Result<Ack, RouteError> {
        self.router.apply(event)
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub(crate) fn is_expired(&self, cutoff: Instant) -> bool {
        self.last_seen() < cutoff
    }

    /// Render the root and send the fragment over the current transport.
    ///
    /// Concurrent pushes are delivered one at a time, each carrying the state
    /// as of its own render.
    pub async fn push(&self) -> Result<(), LiveError> {
        let mut outbound = self.outbound.lock().await;
        if self.state() == ConnectionState::Evicted {
            return Err(LiveError::Evicted(self.session.clone()));
        }

        let fragment = self.engine.render(&self.root)?;
        let sink = outbound.as_mut().ok_or(TransportError::Closed)?;
        trace!(session = %self.session, bytes = fragment.len(), "push");

        if let Err(err) = sink.send(fragment).await {
            outbound.take();
            self.set_state_from(ConnectionState::Active, ConnectionState::DisconnectedRetained);
            return Err(err.into());
        }
        Ok(())
    }

    /// Bind a new transport, replacing any previous one. Returns the epoch
    /// the caller must present to [`detach`](Self::detach).
    pub(crate) async fn attach(&self, transport: Outbound) -> u64 {
        let mut outbound = self.outbound.lock().await;
        if let Some(previous) = outbound.replace(transport) {
            debug!(session = %self.session, "replacing stale transport");
            close_in_background(previous);
        }
        self.touch();
        self.set_state(ConnectionState::Active);
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop the transport bound at `epoch` and keep the state for a reconnect.
    ///
    /// A no-op if another transport has been attached since.
    pub(crate) async fn detach(&self, epoch: u64) {
        let mut outbound = self.outbound.lock().await;
        if self.epoch() != epoch {
            return;
        }
        if let Some(transport) = outbound.take() {
            close_in_background(transport);
        }
        self.set_state_from(ConnectionState::Active, ConnectionState::DisconnectedRetained);
    }

    /// Mark the connection evicted and close its transport if nothing is
    /// writing to it.
    pub(crate) fn evict(&self) {
        self.set_state(ConnectionState::Evicted);
        // A push blocked on a dead peer must not stall the sweep; that push
        // fails on its own and the next one sees the state.
        if let Ok(mut outbound) = self.outbound.try_lock() {
            if let Some(transport) = outbound.take() {
                close_in_background(transport);
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    fn set_state_from(&self, from: ConnectionState, to: ConnectionState) {
        let mut state = self.state.lock();
        if *state == from {
            *state = to;
        }
    }
}

/// Close a transport that is being let go of without waiting on the peer.
fn close_in_background(mut transport: Outbound) {
    tokio::spawn(async move {
        if let Err(err) = transport.close().await {
            trace!(error = %err, "closing transport failed");
        }
    });
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session", &self.session)
            .field("root", &self.root)
            .field("state", &self.state())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}

/// Pushes renders to a session from outside its message loop.
///
/// Handed to the root factory so components can schedule their own updates,
/// e.g. a clock ticking every second. Holds the connection weakly; once the
/// session is evicted every push fails with [`LiveError::Evicted`].
#[derive(Clone)]
pub struct Pusher {
    session: SessionId,
    connection: Weak<Connection>,
}

impl Pusher {
    pub(crate) fn new(session: SessionId, connection: Weak<Connection>) -> Self {
        Self { session, connection }
    }

    /// The session this pusher renders to.
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Render the session's root and send it.
    ///
    /// Fails with [`TransportError::Closed`] while the client is away, and
    /// with [`LiveError::Evicted`] once the session is gone for good.
    pub async fn push(&self) -> Result<(), LiveError> {
        match self.connection.upgrade() {
            Some(connection) => connection.push().await,
            None => Err(LiveError::Evicted(self.session.clone())),
        }
    }

    /// Whether the session is gone for good.
    pub fn is_evicted(&self) -> bool {
        self.connection
            .upgrade()
            .map_or(true, |c| c.state() == ConnectionState::Evicted)
    }
}

impl std::fmt::Debug for Pusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pusher").field("session", &self.session).finish()
    }
}
