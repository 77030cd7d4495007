//! Link prediction over graph backends.
//!
//! The crate scores every non-adjacent pair of high-degree vertices with a
//! neighborhood similarity (Adamic-Adar by default), spreads the scoring over worker
//! threads and merges the per-worker rankings into a global top-k. Backends plug in
//! through the two traits in [`source`].

#![warn(missing_docs)]

pub mod cli;
pub mod data_generator;
pub mod error;
pub mod logging;
pub mod predict;
pub mod source;
pub mod types;

pub use error::{LinkPredError, Result};
pub use predict::{run, LinkPredictor, PredictOptions, Prediction};
pub use types::{CandidatePair, ScoredPair, Vertex};
