//! Candidate Ranking Module
//!
//! Fuses factor scores with the keyword and structured news signals, applies the
//! inclusion filters and returns the top-N candidates for allocation.

pub mod fusion;
pub mod ranker;

pub use fusion::{fuse_catalyst, CatalystFusion};
pub use ranker::{CandidateRanker, Exclusion, RankingOutcome};
