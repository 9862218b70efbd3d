//! Adapters between the host message channel and the controller core.
//!
//! A host call names its target by view id, or not at all for the session, the image registry
//! and the auxiliary display. Handlers only resolve the target and delegate to it. Events flow
//! the other way through the sinks given to [`NavigationPlugin::attach`](crate::plugin::NavigationPlugin::attach).

mod auto_view;
mod image;
mod session;
mod view;

pub use auto_view::AutoViewMessageHandler;
pub use image::ImageMessageHandler;
pub use session::{SessionCall, SessionMessageHandler, SessionReply};
pub use view::{ViewCall, ViewMessageHandler, ViewReply};
