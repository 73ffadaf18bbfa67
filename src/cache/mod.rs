//! In-memory TTL cache for API responses
//!
//! This module provides a response cache that memoizes successful API
//! responses for a bounded time window. Entries expire after a configurable
//! TTL and can be invalidated early by key prefix, which is used after a
//! mutation to force the next read of related data to refetch.

mod store;

pub use store::ResponseCache;
