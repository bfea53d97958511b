//! Plumbing commands (low-level Git operations)
//!
//! Plumbing commands provide direct access to the object store, the index
//! and the commit chain. Porcelain commands are built on top of them.
//!
//! ## Commands
//!
//! - `hash-object`: Compute a blob id and optionally store the blob
//! - `cat-file`: Print an object, its type or its size
//! - `ls-files`: List the staged paths
//! - `write-tree` / commit chaining: Snapshot the index into trees and commits

pub mod cat_file;
pub mod hash_object;
pub mod ls_files;
pub mod write_commit;
