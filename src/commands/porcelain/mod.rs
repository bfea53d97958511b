//! Porcelain commands (user-facing Git operations)
//!
//! Porcelain commands compose the plumbing into the everyday workflow.
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files for commit
//! - `commit`: Create a new commit
//! - `status`: Show working tree status

pub mod add;
pub mod commit;
pub mod init;
pub mod status;
