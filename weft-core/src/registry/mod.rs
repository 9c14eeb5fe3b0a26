//! Component Registry
//!
//! The registry gives every live component a stable address the browser can
//! send events to, and resolves those addresses back to instances.
//!
//! # How It Works
//!
//! 1. The first time a component is rendered, [`Registry::identify`] allocates
//!    a [`ComponentId`] and stores it in the component's handle. Later renders
//!    reuse it, so the address survives any number of re-renders and
//!    reconnects.
//!
//! 2. The registry maps identifiers to *weak* references. It never keeps a
//!    component alive: when a parent drops a child (say, a deleted list row),
//!    the entry goes dead and [`Registry::resolve`] reports it as unknown.
//!
//! 3. Dead entries are dropped lazily on lookup, and in bulk by
//!    [`Registry::prune`], which the session sweeper calls on every pass.
//!
//! 4. Every session owns its own registry. An identifier only resolves in
//!    the session that rendered the component, so one client cannot drive
//!    another client's components by guessing ids.
//!
//! # Thread Safety
//!
//! The table is a `DashMap`, so a push from a background task can render
//! while the message loop routes an event. Cloning a `Registry` shares the
//! table.

mod id;

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::component::{ComponentRef, DynComponent, Live, Slot};

pub use id::{ComponentId, InvalidComponentId};

type Entry = Weak<Slot<dyn DynComponent>>;

/// Identifier table for live components.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<DashMap<ComponentId, Entry>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the identifier for a component, allocating one on first sight.
    pub fn identify(&self, component: &ComponentRef) -> ComponentId {
        let id = *component.0.id.get_or_init(ComponentId::next);
        self.entries
            .entry(id)
            .or_insert_with(|| component.downgrade());
        id
    }

    /// Look a component up by identifier.
    ///
    /// Returns `None` for identifiers this registry never issued and for
    /// components that have since been dropped.
    pub fn resolve(&self, id: ComponentId) -> Option<ComponentRef> {
        let slot = self.entries.get(&id)?.upgrade();
        match slot {
            Some(slot) => Some(Live(slot)),
            None => {
                self.entries.remove_if(&id, |_, weak| weak.strong_count() == 0);
                None
            }
        }
    }

    /// Look a component up by its wire form (`c42`).
    pub fn resolve_str(&self, id: &str) -> Option<ComponentRef> {
        self.resolve(id.parse().ok()?)
    }

    /// Drop entries whose component no longer exists.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl<C: ?Sized> Live<C> {
    /// Whether the registry would still resolve this component.
    pub fn is_registered_in(&self, registry: &Registry) -> bool {
        self.id().is_some_and(|id| registry.entries.contains_key(&id))
    }
}
