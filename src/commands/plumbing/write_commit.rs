//! Snapshotting the index and chaining commits onto the current branch

use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object::Object;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree_synthesizer::TreeSynthesizer;
use crate::errors::Result;
use tracing::{info, instrument};

impl Repository {
    /// Store the trees describing the current index and return the root id
    pub fn write_tree(&self) -> Result<ObjectId> {
        let index = self.load_index()?;
        let entries = index.into_entries().collect::<Vec<_>>();

        TreeSynthesizer::new(self.database()).synthesize(&entries)
    }

    /// Record `tree_oid` as a new commit on the current branch
    ///
    /// The tip of the current branch, if any, becomes the parent. The commit
    /// object is stored before the branch moves, so a failed ref update
    /// leaves an unreferenced commit behind and the branch untouched.
    #[instrument(skip(self, author, message), fields(%tree_oid))]
    pub fn commit_tree(
        &self,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Result<(ObjectId, Commit)> {
        let branch = self.refs().current_branch()?;
        let parent = self.refs().read_branch(&branch)?;

        let commit = Commit::new(parent, tree_oid, author, message);
        let commit_id = self.database().store(&Object::Commit(commit.clone()))?;

        self.refs().update_branch(&branch, &commit_id)?;
        info!(%branch, %commit_id, root = parent.is_none(), "commit recorded");

        Ok((commit_id, commit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use std::path::Path;

    #[fixture]
    fn repository() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repository = Repository::new(dir.path(), Box::new(std::io::sink())).unwrap();
        (dir, repository)
    }

    fn author() -> Author {
        let timestamp = chrono::DateTime::parse_from_rfc2822("Fri, 01 Mar 2024 12:00:00 +0200")
            .unwrap();
        Author::new_with_timestamp("Ada".to_string(), "ada@example.com".to_string(), timestamp)
    }

    fn stage(repository: &Repository, path: &str, content: &str) {
        let dir = repository.path().to_path_buf();
        std::fs::create_dir_all(dir.join(path).parent().unwrap()).unwrap();
        std::fs::write(dir.join(path), content).unwrap();

        let blob = repository.workspace().parse_blob(Path::new(path)).unwrap();
        let oid = repository.database().store(&Object::Blob(blob)).unwrap();

        let mut index = repository.load_index().unwrap();
        index
            .stage(Path::new(path), oid, repository.workspace())
            .unwrap();
        index.store().unwrap();
    }

    #[rstest]
    fn empty_index_has_no_tree(repository: (TempDir, Repository)) {
        let (_dir, repository) = repository;

        assert!(matches!(
            repository.write_tree(),
            Err(Error::EmptyTree(_))
        ));
    }

    #[rstest]
    fn first_commit_is_a_root_and_advances_master(repository: (TempDir, Repository)) {
        let (dir, repository) = repository;
        stage(&repository, "hello.txt", "hello");

        let tree = repository.write_tree().unwrap();
        let (commit_id, commit) = repository
            .commit_tree(tree, author(), "first".to_string())
            .unwrap();

        assert_eq!(commit.parent(), None);
        assert_eq!(commit.tree_oid(), &tree);
        dir.child(".git/refs/heads/master")
            .assert(format!("{commit_id}\n"));
    }

    #[rstest]
    fn later_commits_chain_onto_the_branch_tip(repository: (TempDir, Repository)) {
        let (_dir, repository) = repository;
        stage(&repository, "hello.txt", "hello");
        let tree = repository.write_tree().unwrap();
        let (first_id, _) = repository
            .commit_tree(tree, author(), "first".to_string())
            .unwrap();

        stage(&repository, "hello.txt", "changed");
        let tree = repository.write_tree().unwrap();
        let (second_id, second) = repository
            .commit_tree(tree, author(), "second".to_string())
            .unwrap();

        assert_eq!(second.parent(), Some(&first_id));
        assert_eq!(repository.refs().read_head().unwrap(), Some(second_id));

        match repository.database().parse_object(&second_id).unwrap() {
            Object::Commit(stored) => assert_eq!(stored, second),
            other => panic!("expected a commit, got {other:?}"),
        }
    }

    #[rstest]
    fn commit_follows_the_branch_named_by_head(repository: (TempDir, Repository)) {
        let (dir, repository) = repository;
        repository.refs().set_head("topic").unwrap();
        stage(&repository, "a.txt", "a");

        let tree = repository.write_tree().unwrap();
        let (commit_id, _) = repository
            .commit_tree(tree, author(), "on topic".to_string())
            .unwrap();

        dir.child(".git/refs/heads/topic")
            .assert(format!("{commit_id}\n"));
        dir.child(".git/refs/heads/master")
            .assert(predicates::path::missing());
    }

    #[rstest]
    fn end_to_end_snapshot_stores_five_objects(repository: (TempDir, Repository)) {
        let (dir, repository) = repository;
        stage(&repository, "README", "read me");
        stage(&repository, "src/main.txt", "main");

        let tree = repository.write_tree().unwrap();
        repository
            .commit_tree(tree, author(), "snapshot".to_string())
            .unwrap();

        let object_files = walkdir::WalkDir::new(dir.path().join(".git/objects"))
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count();
        assert_eq!(object_files, 5);
    }
}
