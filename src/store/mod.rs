//! Lead persistence - the `LeadStore` trait and its libSQL backend.

pub mod libsql_backend;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use traits::{Lead, LeadStore, ProcessingStatus, SiteSettings};
