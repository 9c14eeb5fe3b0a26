//! Connection Lifecycle
//!
//! One [`Connection`] per browser session holds the root component and the
//! transport it currently renders to. The state machine:
//!
//! ```text
//! Connecting -> Active <-> DisconnectedRetained -> Evicted
//! ```
//!
//! - A client attaching with a session identifier either resumes the retained
//!   connection (same root, same state) or gets a fresh one built by the
//!   root factory.
//! - Every inbound message refreshes the connection's last-seen time.
//!   Heartbeats do nothing else; all other messages are routed and followed
//!   by a full render of the root.
//! - A failed read, decode, render or write ends the message loop. State is
//!   kept for the retention window.
//! - The periodic sweep is the only place connections are removed.
//! - Each connection resolves component identifiers through its own
//!   registry, so one session cannot reach into another.
//!
//! Writes to one transport are serialized, so a render pushed from outside
//! the message loop (a timer, a background job) never interleaves with the
//! loop's own renders.

mod config;
mod connection;
mod id;
mod manager;

pub use config::Config;
pub use connection::{Connection, Pusher};
pub use id::SessionId;
pub use manager::{RootFactory, SessionManager};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, no transport attached yet.
    Connecting,
    /// A transport is attached and the message loop is running.
    Active,
    /// The transport is gone; state is kept until the retention window lapses.
    DisconnectedRetained,
    /// Removed by a sweep. Terminal.
    Evicted,
}
