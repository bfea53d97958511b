//! Command implementations
//!
//! Commands are organized into two categories following Git's architecture:
//!
//! - `plumbing`: Low-level commands for direct object manipulation
//! - `porcelain`: User-facing commands for the everyday workflow
//!
//! Commands write their output through the repository writer and report
//! failures as `anyhow` errors, keeping the typed core error as the source.

pub mod plumbing;
pub mod porcelain;
