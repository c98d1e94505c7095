use assert_cmd::Command;
use interview_board::candidate::{Candidate, Stage};
use std::path::Path;
use tempfile::tempdir;

fn board(dir: &Path, backend: &str) -> Command {
    let mut cmd = Command::cargo_bin("interview-board").unwrap();
    cmd.arg("--data-dir")
        .arg(dir)
        .arg("--config")
        .arg(dir.join("config.json"))
        .arg("--backend")
        .arg(backend);
    cmd
}

fn list_json(dir: &Path, backend: &str) -> Vec<Candidate> {
    let out = board(dir, backend)
        .args(["list", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn fresh_board_lists_seed_candidates() {
    let dir = tempdir().unwrap();
    let candidates = list_json(dir.path(), "file");
    let ids: Vec<_> = candidates.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(dir.path().join("interview_candidates_v1.json").exists());
}

#[test]
fn text_listing_groups_by_stage() {
    let dir = tempdir().unwrap();
    let out = board(dir.path(), "file")
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("WAITING (1)\n"));
    assert!(text.contains("COMPLETED (0)"));
}

#[test]
fn add_move_remove_roundtrip_through_the_binary() {
    for backend in ["file", "sqlite"] {
        let dir = tempdir().unwrap();
        let out = board(dir.path(), backend)
            .args(["add", "王小明", "--role", "QA Engineer"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let id = String::from_utf8(out).unwrap().trim().to_string();

        board(dir.path(), backend)
            .args(["move", &id, "in-english"])
            .assert()
            .success();
        board(dir.path(), backend)
            .args(["move", &id, "WAITING"])
            .assert()
            .success();

        let list = list_json(dir.path(), backend);
        let added = list.iter().find(|c| c.id == id).unwrap();
        assert_eq!(added.role, "QA Engineer");
        assert_eq!(added.current_stage, Stage::Waiting);
        assert!(added.has_completed_english);
        assert!(!added.has_completed_chinese);

        board(dir.path(), backend)
            .args(["remove", &id])
            .assert()
            .success();
        assert_eq!(list_json(dir.path(), backend).len(), 3);
    }
}

#[test]
fn add_without_role_uses_default() {
    let dir = tempdir().unwrap();
    board(dir.path(), "file").args(["add", "Ann"]).assert().success();
    let list = list_json(dir.path(), "file");
    let ann = list.iter().find(|c| c.name == "Ann").unwrap();
    assert_eq!(ann.role, "Frontend Engineer");
}

#[test]
fn move_rejects_break_stage() {
    let dir = tempdir().unwrap();
    board(dir.path(), "file")
        .args(["move", "1", "BREAK"])
        .assert()
        .failure();
    let list = list_json(dir.path(), "file");
    assert_eq!(list[0].current_stage, Stage::Waiting);
}

#[test]
fn reset_restores_seed() {
    let dir = tempdir().unwrap();
    board(dir.path(), "file").args(["remove", "1"]).assert().success();
    board(dir.path(), "file").args(["remove", "2"]).assert().success();
    assert_eq!(list_json(dir.path(), "file").len(), 1);

    board(dir.path(), "file").arg("reset").assert().success();
    let ids: Vec<_> = list_json(dir.path(), "file")
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[test]
fn corrupt_storage_fails_unless_reseeding() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("interview_candidates_v1.json"), "not json").unwrap();

    board(dir.path(), "file").arg("list").assert().failure();

    board(dir.path(), "file")
        .args(["list", "--reseed-on-corrupt"])
        .assert()
        .success();
    assert_eq!(list_json(dir.path(), "file").len(), 3);
}
