//! Shared component handles.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use minijinja::value::{Object, ObjectRepr};
use minijinja::Value;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Component, DynComponent};
use crate::registry::ComponentId;

/// Storage behind a [`Live`] handle.
///
/// The identifier sits next to the state so it is assigned once, at first
/// registration, and never derived from where the component lives in memory.
pub(crate) struct Slot<C: ?Sized> {
    pub(crate) id: OnceLock<ComponentId>,
    pub(crate) state: RwLock<C>,
}

/// A shared, lock-protected component instance.
///
/// Cloning a handle shares the same instance, like cloning a signal. Parents
/// keep `Live<Child>` handles to their sub-components; the session keeps the
/// root. The registry only ever holds weak references.
pub struct Live<C: ?Sized>(pub(crate) Arc<Slot<C>>);

/// A type-erased component handle.
pub type ComponentRef = Live<dyn DynComponent>;

impl<C: Component> Live<C> {
    /// Wrap a component in a new handle.
    pub fn new(component: C) -> Self {
        Self(Arc::new(Slot {
            id: OnceLock::new(),
            state: RwLock::new(component),
        }))
    }

    /// Erase the concrete type.
    pub fn to_dyn(&self) -> ComponentRef {
        let erased: Arc<Slot<dyn DynComponent>> = self.0.clone();
        Live(erased)
    }
}

impl<C: ?Sized> Live<C> {
    /// Lock the component for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.0.state.read()
    }

    /// Lock the component for mutation.
    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.0.state.write()
    }

    /// The registry identifier, if the component has been rendered yet.
    pub fn id(&self) -> Option<ComponentId> {
        self.0.id.get().copied()
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl ComponentRef {
    pub(crate) fn downgrade(&self) -> Weak<Slot<dyn DynComponent>> {
        Arc::downgrade(&self.0)
    }
}

impl<C: ?Sized> Clone for Live<C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C: ?Sized> fmt::Debug for Live<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Live")
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

impl<C: Component> From<C> for Live<C> {
    fn from(component: C) -> Self {
        Self::new(component)
    }
}

/// A sub-component placed in a template context.
///
/// Templates hand it to `render(...)`, which looks it up by downcasting.
#[derive(Debug)]
pub(crate) struct ChildValue(pub(crate) ComponentRef);

impl Object for ChildValue {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }
}

/// Expose a sub-component to a template.
pub fn child<C: Component>(component: &Live<C>) -> Value {
    Value::from_object(ChildValue(component.to_dyn()))
}

/// Expose a list of sub-components to a template.
pub fn children<'a, C, I>(components: I) -> Value
where
    C: Component,
    I: IntoIterator<Item = &'a Live<C>>,
{
    Value::from(components.into_iter().map(child).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Handler, Schema};
    use std::borrow::Cow;

    struct Probe {
        hits: u32,
    }

    impl Component for Probe {
        fn template(&self) -> Cow<'static, str> {
            Cow::Borrowed("{{ Hits }}")
        }

        fn schema() -> &'static Schema<Self> {
            static SCHEMA: OnceLock<Schema<Probe>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                Schema::new()
                    .field("Hits", |p: &Probe| p.hits, |p, v| p.hits = v)
                    .handler("Hit", Handler::Nullary(|p| p.hits += 1))
            })
        }
    }

    #[test]
    fn clone_shares_state() {
        let probe1 = Live::new(Probe { hits: 0 });
        let probe2 = probe1.clone();

        probe1.write().hits = 42;
        assert_eq!(probe2.read().hits, 42);
        assert!(probe1.ptr_eq(&probe2));
    }

    #[test]
    fn erased_handle_sees_typed_mutations() {
        let probe = Live::new(Probe { hits: 1 });
        let erased = probe.to_dyn();

        erased.write().invoke("Hit", None, None).unwrap();
        assert_eq!(probe.read().hits, 2);
    }

    #[test]
    fn fresh_handles_have_no_id() {
        let probe = Live::new(Probe { hits: 0 });
        assert!(probe.id().is_none());
    }
}
