//! Navbridge is the controller core of a bridge between a host application and a native map and
//! turn-by-turn navigation engine.
//!
//! The crate does not render maps or compute routes. It keeps a fleet of native views, their
//! overlays, a single shared navigation session and a registry of icons consistent while the
//! platform creates, readies, pauses and destroys them in any order, and turns native callbacks
//! into one ordered event stream per view.
//!
//! # Main components
//!
//! * [`NavigationPlugin`](plugin::NavigationPlugin) is created when the host attaches the
//!   plugin. It owns everything below and hands out the message handlers.
//! * [`MapViewController`](view::MapViewController) wraps one native
//!   [`MapSurface`](native::MapSurface). Calls that need the native map are rejected until the
//!   surface reports readiness; settings given at creation are applied at that moment.
//! * [`ViewRegistry`](view::ViewRegistry) finds views by id for the handlers and for native
//!   callbacks arriving on other threads.
//! * [`NavigationSessionManager`](session::NavigationSessionManager) owns the native
//!   navigator, its listeners and the attachment of the session to navigation views.
//! * [`ImageRegistry`](image_registry::ImageRegistry) turns host bitmaps into native icons
//!   once a surface is able to create them.
//! * [`handler`] resolves host calls to their targets.
//!
//! The native engine is abstracted by the traits in [`native`]. A platform layer implements
//! them on top of the real SDK, tests implement them in memory.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod cluster;
pub mod decoded_image;
pub mod error;
pub mod events;
pub mod frame_delay;
pub mod handler;
pub mod image_registry;
pub mod native;
mod overlay;
pub mod plugin;
pub mod session;
pub mod view;

pub use error::BridgeError;
pub use events::{SessionEvent, SessionEventSink, ViewEvent, ViewEventSink};
pub use plugin::{NavigationPlugin, PluginConfig};
pub use session::{NavigationSessionManager, SessionOptions};
pub use view::{MapOptions, MapViewController, ViewKind};

// Reexport navbridge_types
pub use navbridge_types;

#[cfg(test)]
pub(crate) mod tests;
