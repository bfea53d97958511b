//! Working tree status inspection
//!
//! Compares the files in the working tree against the staged entries.
//!
//! ## Components
//!
//! - `file_change`: How a path differs from its staged entry
//! - `inspector`: Detection of those differences

pub mod file_change;
pub mod inspector;
