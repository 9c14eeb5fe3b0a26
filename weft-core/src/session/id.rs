//! Session identifiers.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Identifies one browser session across reconnects.
///
/// The client carries it in the socket URL, so reconnecting with the same
/// identifier resumes the same server-side state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Arc<str>);

impl SessionId {
    /// Wrap an identifier the client supplied.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Arc::from(id.into()))
    }

    /// Take the last non-empty segment of a request path, ignoring any query.
    ///
    /// `/ws/1234` and `/ws/1234/` both yield `1234`; `/` yields nothing.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .map(Self::new)
    }

    /// Issue a fresh identifier for a new page load.
    ///
    /// A random (v4) UUID in simple form: 122 bits from the OS generator, so
    /// holding one session's id says nothing about any other's.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    /// The identifier as it appears in the socket URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
