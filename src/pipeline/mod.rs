//! The processing pipeline.
//!
//! `LeadProcessor` runs one cycle over the unprocessed lead set;
//! `Supervisor` repeats cycles on a fixed interval until a cooperative stop
//! is requested. Single worker, leads strictly sequential.

pub mod cycle;
pub mod supervisor;

pub use cycle::{CycleReport, LeadProcessor};
pub use supervisor::{LoopState, RunState, Supervisor};
