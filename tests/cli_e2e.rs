//! End-to-end CLI tests for the pagewalk binary.

use std::io::{Read, Write};
use std::net::TcpListener;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DESCRIPTOR: &str = r#"{
    "urls": [
        {
            "name": "posts",
            "url": "https://x.example/list/$p",
            "type": "templated",
            "template_vars": {"p": {"type": "increment", "start": 1, "end": 3}}
        }
    ]
}"#;

/// Builds a command rooted in a temp workspace with a descriptor in place.
fn command_in(dir: &TempDir) -> Command {
    std::fs::write(dir.path().join("urls.json"), DESCRIPTOR).unwrap();
    let mut cmd = Command::cargo_bin("pagewalk").unwrap();
    cmd.current_dir(dir.path()).arg("-q");
    cmd
}

#[test]
fn test_help_describes_the_tool() {
    Command::cargo_bin("pagewalk")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pagewalk"))
        .stdout(predicate::str::contains("--delay"))
        .stdout(predicate::str::contains("--no-stop"));
}

#[test]
fn test_version_flag() {
    Command::cargo_bin("pagewalk")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pagewalk"));
}

#[test]
fn test_status_materializes_snapshot_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    command_in(&dir)
        .arg("--status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total URLs:     3"))
        .stdout(predicate::str::contains("Pending [ ]:    3"));

    let snapshot = std::fs::read_to_string(dir.path().join("url_status.txt")).unwrap();
    assert_eq!(snapshot.lines().count(), 3);
    assert!(snapshot.contains("[ ] https://x.example/list/1"));
}

#[test]
fn test_reset_rewrites_all_pending() {
    let dir = TempDir::new().unwrap();
    // Seed a snapshot with prior progress.
    std::fs::write(
        dir.path().join("url_status.txt"),
        "[X] https://x.example/list/1\n[-2] https://x.example/list/2\n[ ] https://x.example/list/3\n",
    )
    .unwrap();

    command_in(&dir)
        .arg("--reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("reset"));

    let snapshot = std::fs::read_to_string(dir.path().join("url_status.txt")).unwrap();
    assert!(snapshot.lines().all(|l| l.starts_with("[ ] ")));
}

#[test]
fn test_todo_lists_remaining_urls() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("url_status.txt"),
        "[X] https://x.example/list/1\n[ ] https://x.example/list/2\n[ ] https://x.example/list/3\n",
    )
    .unwrap();

    command_in(&dir)
        .arg("--todo")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 remaining"))
        .stdout(predicate::str::contains("https://x.example/list/2"))
        .stdout(predicate::str::contains("https://x.example/list/3"));

    command_in(&dir)
        .args(["--todo", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://x.example/list/2"))
        .stdout(predicate::str::contains("https://x.example/list/3").not());
}

#[test]
fn test_extract_mode_builds_identity_store() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("saved");
    std::fs::create_dir_all(&pages).unwrap();
    std::fs::write(
        pages.join("page.html"),
        r#"<html><body><a href="https://x.example/post/7">Post</a></body></html>"#,
    )
    .unwrap();

    command_in(&dir)
        .args(["--extract", "saved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 new"));

    let seen = std::fs::read_to_string(dir.path().join("seen_items.txt")).unwrap();
    assert!(seen.contains("https://x.example/post/7"));
}

#[test]
fn test_rm_unknown_template_fails() {
    let dir = TempDir::new().unwrap();
    command_in(&dir)
        .args(["--rm", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no template named"));
}

#[test]
fn test_rm_reverts_template_to_pending() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("url_status.txt"),
        "[X] https://x.example/list/1\n[X3] https://x.example/list/2\n[ ] https://x.example/list/3\n",
    )
    .unwrap();

    command_in(&dir)
        .args(["--rm", "posts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed site"));

    let snapshot = std::fs::read_to_string(dir.path().join("url_status.txt")).unwrap();
    assert!(snapshot.lines().all(|l| l.starts_with("[ ] ")));
}

/// Spawns a minimal blocking HTTP server: `/list/2` returns 404, everything
/// else returns a small listing page. The binary under test is a separate
/// process, so a plain thread is enough.
fn spawn_stub_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut buf = [0u8; 2048];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]);
            let path = request
                .split_whitespace()
                .nth(1)
                .unwrap_or("/")
                .to_string();

            let (status, body) = if path == "/list/2" {
                ("404 Not Found", String::new())
            } else {
                (
                    "200 OK",
                    format!(r#"<html><body><a href="/post{path}">Item</a></body></html>"#),
                )
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

#[test]
fn test_crawl_records_mixed_outcomes_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let base = spawn_stub_server();
    std::fs::write(
        dir.path().join("urls.json"),
        format!(
            r#"{{
                "urls": [{{
                    "name": "posts",
                    "url": "{base}/list/$p",
                    "type": "templated",
                    "template_vars": {{"p": {{"type": "increment", "start": 1, "end": 3}}}}
                }}]
            }}"#
        ),
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("pagewalk").unwrap();
    cmd.current_dir(dir.path())
        .args(["-q", "--no-stop", "-d", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"));

    let snapshot = std::fs::read_to_string(dir.path().join("url_status.txt")).unwrap();
    assert!(snapshot.contains(&format!("[X] {base}/list/1")));
    assert!(snapshot.contains(&format!("[-1] {base}/list/2")));
    assert!(snapshot.contains(&format!("[X] {base}/list/3")));
}

#[test]
fn test_status_json_output() {
    let dir = TempDir::new().unwrap();
    command_in(&dir)
        .args(["--status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 3"))
        .stdout(predicate::str::contains("\"pending\": 3"));
}

#[test]
fn test_missing_descriptor_fails() {
    let dir = TempDir::new().unwrap();
    let mut cmd = Command::cargo_bin("pagewalk").unwrap();
    cmd.current_dir(dir.path())
        .arg("-q")
        .arg("--status")
        .assert()
        .failure();
}

#[test]
fn test_invalid_descriptor_fails_with_validation_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("urls.json"),
        r#"{"urls": [{"name": "t", "url": "https://x/$missing", "type": "templated"}]}"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("pagewalk").unwrap();
    cmd.current_dir(dir.path())
        .arg("-q")
        .arg("--status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("undeclared placeholder"));
}
