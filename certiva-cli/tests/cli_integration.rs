//! CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn certiva() -> Command {
    Command::cargo_bin("certiva").expect("binary built")
}

#[test]
fn test_hash_prints_ledger_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("certificate.bin");
    std::fs::write(&file, b"certificate bytes").unwrap();

    certiva()
        .arg("hash")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap());
}

#[test]
fn test_hash_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("certificate.bin");
    std::fs::write(&file, b"certificate bytes").unwrap();

    let first = certiva().arg("hash").arg(&file).output().unwrap();
    let second = certiva().arg("hash").arg(&file).output().unwrap();
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_hash_missing_file_fails() {
    certiva()
        .arg("hash")
        .arg("/nonexistent/file.png")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_extract_finds_fields() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("transcript.txt");
    std::fs::write(
        &file,
        "RIVERSIDE STATE UNIVERSITY\nThis certifies that\nJANE MARY SMITH\nBachelor of Science\nAwarded on 12/09/2022\n",
    )
    .unwrap();

    certiva()
        .arg("extract")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Mary Smith"))
        .stdout(predicate::str::contains("12 September 2022"));
}

#[test]
fn test_compare_identical_embeddings_match() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    std::fs::write(&a, "[0.5, 0.25, -0.3]").unwrap();
    std::fs::write(&b, "[0.5, 0.25, -0.3]").unwrap();

    certiva()
        .args(["compare"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("MATCH"));
}

#[test]
fn test_compare_orthogonal_embeddings_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    std::fs::write(&a, "[1.0, 0.0]").unwrap();
    std::fs::write(&b, "[0.0, 1.0]").unwrap();

    certiva()
        .args(["compare", "--threshold", "0.9"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(65)
        .stdout(predicate::str::contains("NO MATCH"));
}

#[test]
fn test_compare_rejects_unknown_metric() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    std::fs::write(&a, "[1.0]").unwrap();

    certiva()
        .args(["compare", "--metric", "manhattan"])
        .arg(&a)
        .arg(&a)
        .assert()
        .failure()
        .code(1);
}
