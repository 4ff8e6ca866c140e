pub mod backoff;
pub mod cache;
pub mod counters;
pub mod interaction;
pub mod resolver;
pub mod result;

pub use cache::{CacheEntry, ElementCache};
pub use counters::{CounterSnapshot, PerformanceCounters};
pub use resolver::Resolver;
pub use result::{AttemptError, ResolutionError};
