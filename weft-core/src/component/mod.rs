//! Components
//!
//! A component is a stateful, renderable node in the server-held UI tree. It
//! produces a template from its own state and exposes, through its
//! [`Schema`], reactive fields and event handlers addressable by name.
//!
//! # Concepts
//!
//! ## Template
//!
//! [`Component::template`] returns the markup source. It may reference fields
//! and props by name (`{{ Number }}`), handlers by name (`{{ AddOne }}`
//! yields the client send-expression), sub-components with
//! `{{ render(Child) }}`, and carries two kinds of markers the render engine
//! rewrites:
//!
//! - `@click="AddOne"` binds a DOM event to a handler
//! - `@value="Name"` binds an input's value to a field, two-way
//!
//! ## Ownership
//!
//! Components live behind [`Live`] handles. The tree owns its nodes: the
//! session owns the root, parents own their children. Nothing else keeps a
//! component alive.

mod handle;
mod scalar;
mod schema;

use std::borrow::Cow;

use minijinja::Value;

pub use handle::{child, children, ComponentRef, Live};
pub(crate) use handle::{ChildValue, Slot};
pub use scalar::Scalar;
pub use schema::{DispatchError, Handler, Schema};

/// A stateful, renderable UI node.
pub trait Component: Send + Sync + 'static {
    /// Produce the template source from the current state.
    ///
    /// Must not have side effects beyond reading `self`.
    fn template(&self) -> Cow<'static, str>;

    /// The dispatch table for this type, built once.
    fn schema() -> &'static Schema<Self>
    where
        Self: Sized;
}

/// Everything the renderer needs from a component, read under one lock.
pub struct Snapshot {
    pub type_name: &'static str,
    pub template: Cow<'static, str>,
    pub values: Vec<(&'static str, Value)>,
    pub fields: Vec<&'static str>,
    pub handlers: Vec<&'static str>,
}

/// Object-safe view of a [`Component`], used by the registry, the router and
/// the renderer. Implemented for every component.
pub trait DynComponent: Send + Sync + 'static {
    /// Capture state, template and dispatch names.
    fn snapshot(&self) -> Snapshot;

    /// Set a reactive field from raw client text.
    fn set_field(&mut self, name: &str, raw: &str) -> Result<(), DispatchError>;

    /// Invoke an event handler.
    fn invoke(&mut self, name: &str, key: Option<&str>, value: Option<&str>) -> Result<(), DispatchError>;
}

impl<C: Component> DynComponent for C {
    fn snapshot(&self) -> Snapshot {
        let schema = C::schema();
        Snapshot {
            type_name: short_type_name::<C>(),
            template: self.template(),
            values: schema.values(self),
            fields: schema.field_names().collect(),
            handlers: schema.handler_names().collect(),
        }
    }

    fn set_field(&mut self, name: &str, raw: &str) -> Result<(), DispatchError> {
        C::schema().set(self, name, raw)
    }

    fn invoke(&mut self, name: &str, key: Option<&str>, value: Option<&str>) -> Result<(), DispatchError> {
        C::schema().invoke(self, name, key, value)
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
