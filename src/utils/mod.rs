//! Small runtime utilities shared by the authority adapters

pub mod batch;
pub mod cache;

pub use batch::{Batch, BatchProcessor, BatchSummary};
pub use cache::TtlCache;
