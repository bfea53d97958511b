//! Git data structures and algorithms
//!
//! - `index`: Index file format pieces (header, entries, checksum, modes)
//! - `objects`: Git object types and the tree synthesizer
//! - `status`: Working tree status inspection

pub mod index;
pub mod objects;
pub mod status;
