//! Analysis and result aggregation modules
//!
//! Combines feature extraction into the final, cacheable analysis:
//! - Result types and the persisted record
//! - Metadata and confidence flags
//! - Bounded result cache
//! - The cache-aware engine

pub mod cache;
pub mod confidence;
pub mod engine;
pub mod metadata;
pub mod result;
