//! Core data models for layer intersection checks.

pub mod coordinate;
pub mod verdict;

pub use coordinate::{build_ring, Coordinate, RingError};
pub use verdict::{Verdict, VerdictMap};
