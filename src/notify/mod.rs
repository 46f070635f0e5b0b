//! Outbound notification path - rendering and gateway dispatch.

pub mod dispatcher;
pub mod format;
pub mod templates;

pub use dispatcher::{Dispatcher, WhatsAppDispatcher};
pub use format::format_notification;
