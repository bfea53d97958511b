//! A minimal Git-compatible storage engine
//!
//! Content-addressed objects, the binary staging index, tree synthesis and
//! branch-advancing commits, laid out exactly as Git lays them out under
//! `.git`.

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
