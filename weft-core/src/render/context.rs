//! Render Context
//!
//! Tracks which components are currently being rendered on this thread.
//! Rendering a sub-component happens from inside the parent's template
//! execution, so the stack mirrors the path from the root to the component
//! being rendered right now.
//!
//! # Implementation
//!
//! A thread-local stack of component identifiers. Entering a component pushes
//! its id and returns a guard that pops it when dropped, even if the template
//! fails part way through. Component trees must be acyclic; the stack turns a
//! violation into a [`RenderError::Cycle`] instead of unbounded recursion.

use std::cell::RefCell;

use crate::error::RenderError;
use crate::registry::ComponentId;

/// How deep a component tree may nest.
pub const MAX_DEPTH: usize = 64;

thread_local! {
    static RENDER_STACK: RefCell<Vec<ComponentId>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the render stack when dropped.
pub struct RenderScope {
    id: ComponentId,
}

impl RenderScope {
    /// Enter the render of `id`.
    pub fn enter(id: ComponentId) -> Result<Self, RenderError> {
        RENDER_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&id) {
                return Err(RenderError::Cycle(id.to_string()));
            }
            if stack.len() >= MAX_DEPTH {
                return Err(RenderError::TooDeep(MAX_DEPTH));
            }
            stack.push(id);
            Ok(Self { id })
        })
    }

    /// Current nesting depth, zero outside any render.
    pub fn depth() -> usize {
        RENDER_STACK.with(|stack| stack.borrow().len())
    }

    /// The component currently being rendered, if any.
    pub fn current() -> Option<ComponentId> {
        RENDER_STACK.with(|stack| stack.borrow().last().copied())
    }
}

impl Drop for RenderScope {
    fn drop(&mut self) {
        RENDER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(
                popped,
                Some(self.id),
                "RenderScope mismatch: expected {:?}, got {:?}",
                self.id,
                popped
            );
        });
    }
}
