#![allow(dead_code)]

pub mod command;
pub mod file;

/// Blob id of the five bytes `hello`
pub const HELLO_BLOB_ID: &str = "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0";

/// Number of object files stored under `.git/objects`
pub fn count_objects(dir: &std::path::Path) -> usize {
    walkdir::WalkDir::new(dir.join(".git").join("objects"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}
