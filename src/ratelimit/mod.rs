//! Rate limiting logic and counter state management.

mod counter;
mod limiter;
mod store;

pub use counter::{counter_key, CounterMap, CounterRecord, WINDOW_SECS};
pub use limiter::RateLimiter;
pub use store::{CounterStore, FileCounterStore, MemoryCounterStore, StoreHealth};
