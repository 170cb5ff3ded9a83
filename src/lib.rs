//! Couche - checks a surveyed polygon against a directory of reference layers
//!
//! This library provides the layer catalog and spatial relation evaluator
//! shared by the server and check binaries.

pub mod catalog;
pub mod config;
pub mod evaluator;
pub mod geometry;
pub mod models;

pub use catalog::LayerCatalog;
pub use evaluator::{EvaluateError, Evaluation, Evaluator};
pub use models::{Coordinate, Verdict, VerdictMap};
