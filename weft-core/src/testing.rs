//! Helpers for testing components without a browser.
//!
//! ```rust,ignore
//! let counter = Live::new(Counter::default());
//! let harness = Harness::new();
//!
//! assert!(harness.render(&counter)?.contains("Counter: 0"));
//! harness.send(&counter, "AddOne", None, None)?;
//! assert!(harness.render(&counter)?.contains("Counter: 1"));
//! ```

use crate::component::{Component, Live};
use crate::error::{RenderError, RouteError};
use crate::registry::Registry;
use crate::render::RenderEngine;
use crate::router::{Ack, EventRouter};

/// Render a component tree once, with a throwaway registry.
pub fn render_fragment<C: Component>(component: &Live<C>) -> Result<String, RenderError> {
    RenderEngine::new(Registry::new()).render_live(component)
}

/// A render engine and router sharing one registry, so events can be sent
/// to anything that has been rendered.
#[derive(Debug, Clone)]
pub struct Harness {
    engine: RenderEngine,
    router: EventRouter,
}

impl Harness {
    /// Create a harness with an empty registry of its own.
    pub fn new() -> Self {
        let registry = Registry::new();
        Self {
            engine: RenderEngine::new(registry.clone()),
            router: EventRouter::new(registry),
        }
    }

    /// The registry renders and sends go through.
    pub fn registry(&self) -> &Registry {
        self.engine.registry()
    }

    /// Render `component`, registering it and its children.
    pub fn render<C: Component>(&self, component: &Live<C>) -> Result<String, RenderError> {
        self.engine.render_live(component)
    }

    /// Send `method` to `component` as the browser would.
    ///
    /// The component is registered first if it has never been rendered.
    pub fn send<C: Component>(
        &self,
        component: &Live<C>,
        method: &str,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<Ack, RouteError> {
        let id = self.registry().identify(&component.to_dyn());
        self.router.apply_parts(&id.to_string(), method, key, value)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
