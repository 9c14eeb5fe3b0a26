//! Event Router
//!
//! Applies a decoded client event to the component it addresses.
//!
//! # Resolution Order
//!
//! 1. `Refresh` mutates nothing; it exists to trigger a render.
//! 2. `SetAttribute` sets the field named by `key` to `value`, coerced to the
//!    field's declared type.
//! 3. Anything else invokes the handler of that name with `key` (arity 1) or
//!    `key` and `value` (arity 2).
//!
//! Heartbeats never reach a component: the session records them and stops.
//!
//! Handlers run synchronously under the component's write lock. They may
//! reshape the tree (add or drop children); a component dropped this way
//! simply stops resolving, and later events aimed at it are rejected with
//! [`RouteError::UnknownComponent`].

mod message;

use tracing::debug;

use crate::component::{ComponentRef, DispatchError};
use crate::error::RouteError;
use crate::registry::Registry;

pub use message::{Event, Message, HEARTBEAT, REFRESH, SET_ATTRIBUTE};

/// What an applied event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Heartbeat,
    Refreshed,
    FieldSet,
    Invoked,
}

/// Routes events to components found through a [`Registry`].
#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: Registry,
}

impl EventRouter {
    /// Create a router that resolves targets through `registry`.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The registry events are resolved against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Apply an event addressed by its wire parts.
    pub fn apply_parts(
        &self,
        component_id: &str,
        method: &str,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<Ack, RouteError> {
        self.apply(&Event::from_parts(component_id, method, key, value))
    }

    /// Apply a decoded event.
    pub fn apply(&self, event: &Event) -> Result<Ack, RouteError> {
        match event {
            Event::Heartbeat => Ok(Ack::Heartbeat),
            Event::Refresh => Ok(Ack::Refreshed),
            Event::SetAttribute { target, field, value } => {
                let component = self.resolve(target)?;
                let field = field.as_deref().unwrap_or_default();
                let value = value.as_deref().unwrap_or_default();
                debug!(component = %target, field, "set attribute");

                let result = component.write().set_field(field, value);
                result.map_err(|err| dispatch_error(err, target, field, value))?;
                Ok(Ack::FieldSet)
            }
            Event::Invoke {
                target,
                method,
                key,
                value,
            } => {
                let component = self.resolve(target)?;
                debug!(component = %target, method = %method, "invoke");

                let result = component
                    .write()
                    .invoke(method, key.as_deref(), value.as_deref());
                result.map_err(|err| dispatch_error(err, target, method, value.as_deref().unwrap_or_default()))?;
                Ok(Ack::Invoked)
            }
        }
    }

    fn resolve(&self, target: &str) -> Result<ComponentRef, RouteError> {
        self.registry
            .resolve_str(target)
            .ok_or_else(|| RouteError::UnknownComponent(target.to_owned()))
    }
}

fn dispatch_error(err: DispatchError, component: &str, name: &str, value: &str) -> RouteError {
    match err {
        DispatchError::UnknownField => RouteError::UnknownField {
            component: component.to_owned(),
            field: name.to_owned(),
        },
        DispatchError::UnknownMethod => RouteError::UnknownMethod {
            component: component.to_owned(),
            method: name.to_owned(),
        },
        DispatchError::Arity { expected, given } => RouteError::Arity {
            method: name.to_owned(),
            expected,
            given,
        },
        DispatchError::InvalidValue(reason) => RouteError::InvalidValue {
            field: name.to_owned(),
            value: value.to_owned(),
            reason,
        },
    }
}
