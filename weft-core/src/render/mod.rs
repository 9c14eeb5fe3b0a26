//! Render Pipeline
//!
//! Turns a component tree into the HTML fragment pushed to the browser.
//!
//! # Steps
//!
//! 1. Identify the component through the registry and enter its render scope.
//! 2. Snapshot its state, template and dispatch names under a read lock.
//! 3. Rewrite `@event` / `@value` markers into protocol-aware attributes that
//!    address the component by identifier.
//! 4. Execute the template with fields, props, handler send-expressions and a
//!    `render(child)` function for sub-components, which recurses.
//! 5. Wrap the result in a container tagged with the identifier.
//!
//! The browser replaces the whole subtree on every push; there is no diffing.

mod context;
mod engine;
pub mod markers;

pub use context::{RenderScope, MAX_DEPTH};
pub use engine::{send_expression, RenderEngine, BIND_ATTRIBUTE, ID_ATTRIBUTE};
