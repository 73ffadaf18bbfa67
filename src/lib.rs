//! opview library
//!
//! Client library for an ERP open-items REST API: typed data models, an
//! in-memory TTL response cache, and an API client that serves fallback data
//! when the backend is unreachable.

pub mod cache;
pub mod cli;
pub mod data;
