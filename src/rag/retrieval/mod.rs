//! Multi-store retrieval: fan out, merge, dedup

pub mod engine;
pub mod ranking;

pub use engine::{Hit, MultiStoreRetriever, SearchParams};
pub use ranking::rank_hits;
