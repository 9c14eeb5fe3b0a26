//! Error Types
//!
//! Each stage of the pipeline has its own error enum so callers can tell a
//! broken template apart from a stale client reference or a dropped socket.
//! [`LiveError`] collects them for the session layer.

use thiserror::Error;

use crate::session::SessionId;

/// Failure of the duplex channel underneath a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer closed the channel or it was never attached.
    #[error("transport closed")]
    Closed,

    /// The WebSocket layer failed while reading, writing or handshaking.
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame arrived that cannot be treated as a text message.
    #[error("non-text frame: {0}")]
    InvalidFrame(String),

    /// The handshake did not carry a usable session identifier.
    #[error("no session identifier in request path {0:?}")]
    MissingSession(String),
}

/// An inbound message that could not be understood at all.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("method {0:?} is not of the form <component>.<name>")]
    Method(String),
}

/// An inbound event that was understood but cannot be applied.
///
/// These never end a connection; the session logs them and re-renders.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown component {0:?}")]
    UnknownComponent(String),

    #[error("component {component} has no field {field:?}")]
    UnknownField { component: String, field: String },

    #[error("component {component} has no handler {method:?}")]
    UnknownMethod { component: String, method: String },

    #[error("handler {method:?} takes {expected} argument(s), message carried {given}")]
    Arity {
        method: String,
        expected: usize,
        given: usize,
    },

    #[error("cannot set field {field:?} from {value:?}: {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// A template could not be turned into a fragment.
///
/// Rendering is all-or-nothing: an error anywhere in the tree aborts it.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template parse error in {component}: {source}")]
    Parse {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("template execution error in {component}: {source}")]
    Execute {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("malformed marker at byte {offset}: {reason}")]
    Marker { offset: usize, reason: &'static str },

    #[error("marker @{event}={name:?} does not name a {expected} of {component}")]
    UnknownBinding {
        component: String,
        event: String,
        name: String,
        expected: &'static str,
    },

    #[error("component {0} is already being rendered (cyclic tree)")]
    Cycle(String),

    #[error("component tree deeper than {0} levels")]
    TooDeep(usize),
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("heartbeat interval ({heartbeat_ms}ms) must be shorter than the retention window ({retention_ms}ms)")]
    HeartbeatTooSlow { heartbeat_ms: u128, retention_ms: u128 },
}

/// Umbrella error for session-level operations.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("session {0} has been evicted")]
    Evicted(SessionId),
}
