pub mod config;
pub mod duplicate_cache;
pub mod report;

pub use config::{GossipConfig, RetryPolicy};
pub use duplicate_cache::DuplicateCache;
pub use report::ForwardReport;
