//! Bounded memoization
//!
//! A fixed-capacity key/value cache with least-recently-used eviction under
//! two independent pressures (entry count and total declared bytes), plus
//! optional time-based expiry.

mod bounded;

pub use bounded::{BoundedCache, EvictFn};
