//! # idp-storage-memory
//!
//! In-memory implementation of every `idp-storage` provider trait.
//!
//! Suitable for single-instance deployments and tests. Unique indexes are
//! enforced through `DashMap` entry locks, and the atomic operations
//! (session add/clear, code redemption) mutate records while holding the
//! shard lock for that record.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod store;

pub use store::MemoryStore;
