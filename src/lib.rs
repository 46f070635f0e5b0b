//! Lead agent - polls for new property leads, scores them with an LLM, and
//! dispatches WhatsApp notifications to the operator.

pub mod assess;
pub mod config;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};
