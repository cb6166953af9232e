//! Shared utilities.

mod hash;

pub use hash::unordered_hash;
