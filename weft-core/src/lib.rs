//! Weft Core
//!
//! Server-held live UI components. Component state lives on the server; the
//! browser is a thin client that forwards events over a persistent connection
//! and swaps in the HTML the server pushes back after every change.
//!
//! It implements:
//!
//! - Components with typed reactive fields and named event handlers
//! - A registry giving every live component a stable wire address
//! - A render pipeline that rewrites `@click` / `@value` markers into
//!   client protocol calls
//! - An event router applying client messages to components
//! - Per-session connections that survive reconnects, with retention,
//!   eviction and out-of-band pushes
//!
//! # Architecture
//!
//! - `component`: the component model and shared handles
//! - `registry`: identifier allocation and weak lookup
//! - `render`: marker rewriting and template execution
//! - `router`: wire messages and event application
//! - `session`: connection lifecycle and configuration
//! - `transport`: the duplex channel abstraction and its WebSocket carrier
//! - `client`: the browser shell page
//!
//! # Example
//!
//! ```rust,ignore
//! use std::borrow::Cow;
//! use std::sync::OnceLock;
//! use weft_core::component::{Component, Handler, Live, Schema};
//! use weft_core::session::{Config, SessionManager};
//!
//! #[derive(Default)]
//! struct Counter {
//!     number: i64,
//! }
//!
//! impl Component for Counter {
//!     fn template(&self) -> Cow<'static, str> {
//!         Cow::Borrowed(r#"Counter: {{ Number }} <button @click="AddOne">+</button>"#)
//!     }
//!
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<Counter>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::new()
//!                 .field("Number", |c: &Counter| c.number, |c, v| c.number = v)
//!                 .handler("AddOne", Handler::Nullary(|c| c.number += 1))
//!         })
//!     }
//! }
//!
//! let manager = SessionManager::new(Config::default(), |_| Live::new(Counter::default()).to_dyn())?;
//! manager.spawn_sweeper();
//! weft_core::transport::websocket::listen(manager, listener).await?;
//! ```

pub mod client;
pub mod component;
pub mod error;
pub mod registry;
pub mod render;
pub mod router;
pub mod session;
pub mod testing;
pub mod transport;

pub use component::{Component, ComponentRef, Handler, Live, Schema};
pub use error::{LiveError, RenderError, RouteError};
pub use registry::{ComponentId, Registry};
pub use render::RenderEngine;
pub use router::EventRouter;
pub use session::{Config, SessionId, SessionManager};
