#![forbid(unsafe_code)]

//! File-format helpers used by the command-line interface.
//!
//! This module reads and cleans SNAP-style edge lists and maps renumbered vertex
//! ids back to their originals.

/// Edge-list parsing, preprocessing and renumbering.
pub mod edge_list;
