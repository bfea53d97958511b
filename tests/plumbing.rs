mod common;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use common::HELLO_BLOB_ID;
use common::command::{empty_repository_dir, init_repository_dir, run_sprig_command, stdout_of};
use fake::Fake;
use fake::faker::lorem::en::Words;
use pretty_assertions::assert_eq;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn hash_object_without_write_only_prints_the_id(
    empty_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = empty_repository_dir;
    dir.child("hello.txt").write_str("hello")?;

    run_sprig_command(dir.path(), &["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout(format!("{HELLO_BLOB_ID}\n"));

    assert_eq!(common::count_objects(dir.path()), 0);

    Ok(())
}

#[rstest]
#[case("", "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391")]
#[case("x", "c1b0730e0133447badcfd47fd144e254807b06e1")]
#[case("hello", HELLO_BLOB_ID)]
fn hash_object_matches_git_blob_ids(
    empty_repository_dir: TempDir,
    #[case] content: &str,
    #[case] expected: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = empty_repository_dir;
    dir.child("blob").write_str(content)?;

    let printed = stdout_of(&mut run_sprig_command(
        dir.path(),
        &["hash-object", "-w", "blob"],
    ))?;

    assert_eq!(printed.trim(), expected);
    dir.child(".git/objects")
        .child(&expected[..2])
        .child(&expected[2..])
        .assert(predicate::path::is_file());

    Ok(())
}

#[rstest]
fn cat_file_prints_stored_blob_content(
    empty_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = empty_repository_dir;
    let content = Words(5..10).fake::<Vec<String>>().join(" ");
    dir.child("words.txt").write_str(&content)?;

    let oid = stdout_of(&mut run_sprig_command(
        dir.path(),
        &["hash-object", "-w", "words.txt"],
    ))?;
    let oid = oid.trim();

    run_sprig_command(dir.path(), &["cat-file", "-p", oid])
        .assert()
        .success()
        .stdout(content.clone());

    run_sprig_command(dir.path(), &["cat-file", "-p", &oid[..7]])
        .assert()
        .success()
        .stdout(content.clone());

    run_sprig_command(dir.path(), &["cat-file", "-t", oid])
        .assert()
        .success()
        .stdout("blob\n");

    run_sprig_command(dir.path(), &["cat-file", "-s", oid])
        .assert()
        .success()
        .stdout(format!("{}\n", content.len()));

    Ok(())
}

#[rstest]
fn cat_file_of_unknown_object_fails(empty_repository_dir: TempDir) {
    run_sprig_command(
        empty_repository_dir.path(),
        &["cat-file", "-p", "0123456789abcdef0123456789abcdef01234567"],
    )
    .assert()
    .failure()
    .stderr(predicate::str::contains("object not found"));
}

#[rstest]
fn cat_file_of_head_without_commits_fails(empty_repository_dir: TempDir) {
    run_sprig_command(empty_repository_dir.path(), &["cat-file", "-p", "HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference not found: HEAD"));
}

#[rstest]
fn cat_file_rejects_revisions_outside_refs_heads(init_repository_dir: TempDir) {
    run_sprig_command(init_repository_dir.path(), &["cat-file", "-p", "../HEAD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference not found: ../HEAD"));
}

#[rstest]
fn write_tree_prints_the_committed_root_tree(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir;

    let tree_id = stdout_of(&mut run_sprig_command(dir.path(), &["write-tree"]))?;

    run_sprig_command(dir.path(), &["cat-file", "-p", "master"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!("tree {}", tree_id.trim())));

    Ok(())
}

#[rstest]
fn write_tree_on_an_empty_index_fails(empty_repository_dir: TempDir) {
    run_sprig_command(empty_repository_dir.path(), &["write-tree"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to build a tree from"));
}

#[rstest]
fn ls_files_stage_shows_mode_id_and_path(
    empty_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = empty_repository_dir;
    dir.child("hello.txt").write_str("hello")?;
    run_sprig_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    run_sprig_command(dir.path(), &["ls-files", "--stage"])
        .assert()
        .success()
        .stdout(format!("100644 {HELLO_BLOB_ID} 0\thello.txt\n"));

    Ok(())
}

#[rstest]
fn corrupted_index_is_reported(
    empty_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = empty_repository_dir;
    dir.child("hello.txt").write_str("hello")?;
    run_sprig_command(dir.path(), &["add", "hello.txt"])
        .assert()
        .success();

    let index_path = dir.child(".git/index");
    let mut bytes = std::fs::read(index_path.path())?;
    bytes[20] ^= 0xff;
    std::fs::write(index_path.path(), bytes)?;

    run_sprig_command(dir.path(), &["ls-files"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("index checksum mismatch"));

    Ok(())
}
