//! Integration tests for the swiftly CLI
//!
//! These run the built binary against the local filesystem backend, so no
//! storage service is needed.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Get the path to the swiftly binary
fn swiftly_binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_swiftly"))
}

/// Isolated environment: no user configuration, no inherited SWIFTLY_*
fn base_command(home: &Path) -> Command {
    let mut cmd = Command::new(swiftly_binary());
    cmd.env_clear()
        .env("HOME", home)
        .env("USER", "tester")
        .env("PATH", std::env::var_os("PATH").unwrap_or_default());
    cmd
}

/// Run swiftly with the given arguments and stdin
fn run_swiftly(args: &[&str], home: &Path, env: &[(&str, &str)], stdin: &[u8]) -> Output {
    let mut cmd = base_command(home);
    cmd.args(args)
        .envs(env.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().expect("Failed to execute swiftly");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin)
        .expect("Failed to write stdin");
    child.wait_with_output().expect("Failed to wait for swiftly")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

struct Fixture {
    home: TempDir,
    account: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create home dir"),
            account: TempDir::new().expect("Failed to create account dir"),
        }
    }

    fn local(&self) -> &str {
        self.account.path().to_str().expect("utf-8 temp path")
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_stdin(args, b"")
    }

    fn run_with_stdin(&self, args: &[&str], stdin: &[u8]) -> Output {
        let mut full = vec!["-L", self.local()];
        full.extend_from_slice(args);
        run_swiftly(&full, self.home.path(), &[], stdin)
    }
}

#[test]
fn test_unknown_command() {
    let fixture = Fixture::new();
    let output = fixture.run(&["bogus"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("ERROR unknown command 'bogus'"));
}

#[test]
fn test_no_command_prints_help() {
    let fixture = Fixture::new();
    let output = run_swiftly(&[], fixture.home.path(), &[], b"");
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Commands:"));
}

#[test]
fn test_help_ignores_broken_config() {
    let fixture = Fixture::new();
    std::fs::write(fixture.home.path().join(".swiftly.conf"), "[swiftly\nauth_url\n")
        .expect("Failed to write config");
    let output = run_swiftly(&["help"], fixture.home.path(), &[], b"");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("  tempurl"));
}

#[test]
fn test_missing_auth_url() {
    let fixture = Fixture::new();
    let output = run_swiftly(&["auth"], fixture.home.path(), &[], b"");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output), "No Auth URL has been given.\n");
}

#[test]
fn test_config_file_supplies_auth_url() {
    let fixture = Fixture::new();
    std::fs::write(
        fixture.home.path().join(".swiftly.conf"),
        "[swiftly]\nauth_url = https://conf.example.com/auth/v1.0\nretries = 2\n",
    )
    .expect("Failed to write config");

    let output = run_swiftly(&["auth"], fixture.home.path(), &[], b"");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("https://conf.example.com/auth/v1.0"));
    assert!(out.lines().any(|line| line.starts_with("Attempts:") && line.ends_with(" 3")));

    // Environment beats the file
    let output = run_swiftly(
        &["auth"],
        fixture.home.path(),
        &[("SWIFTLY_AUTH_URL", "https://env.example.com/auth/v1.0")],
        b"",
    );
    assert!(stdout(&output).contains("https://env.example.com/auth/v1.0"));
}

#[test]
fn test_put_get_delete_object() {
    let fixture = Fixture::new();

    let output = fixture.run(&["put", "photos"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = fixture.run_with_stdin(
        &["put", "-h", "X-Object-Meta-Color: blue", "photos/cat.txt"],
        b"meow\n",
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = fixture.run(&["get", "photos/cat.txt"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "meow\n");

    let output = fixture.run(&["head", "photos/cat.txt"]);
    assert!(stdout(&output).contains("X-Object-Meta-Color: blue"));

    let output = fixture.run(&["get", "photos"]);
    assert_eq!(stdout(&output), "cat.txt\n");

    let output = fixture.run(&["delete", "photos/cat.txt"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = fixture.run(&["get", "photos/cat.txt"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("ERROR 404"));
}

#[test]
fn test_get_to_file() {
    let fixture = Fixture::new();
    fixture.run(&["put", "c"]);
    fixture.run_with_stdin(&["put", "c/o"], b"contents");

    let target = fixture.home.path().join("o.out");
    let output = fixture.run(&["get", "-o", target.to_str().expect("utf-8"), "c/o"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(std::fs::read(&target).expect("output file"), b"contents");
}

#[test]
fn test_fordo_runs_for_each_item() {
    let fixture = Fixture::new();
    fixture.run(&["put", "c"]);
    for name in ["a", "b"] {
        fixture.run_with_stdin(&["put", &format!("c/{name}")], name.as_bytes());
    }

    let output = fixture.run(&["for", "c", "do", "get", "c/<item>"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "ab");
}

#[test]
fn test_fordo_with_concurrency() {
    let fixture = Fixture::new();
    fixture.run(&["put", "c"]);
    for name in ["a", "b", "c", "d", "e"] {
        fixture.run_with_stdin(&["put", &format!("c/{name}")], name.as_bytes());
    }

    let output = fixture.run(&["--concurrency", "3", "for", "c", "do", "get", "c/<item>"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let mut got: Vec<char> = stdout(&output).chars().collect();
    got.sort_unstable();
    assert_eq!(got, ['a', 'b', 'c', 'd', 'e']);
}

#[test]
fn test_fordo_unknown_sub_command() {
    let fixture = Fixture::new();
    fixture.run(&["put", "c"]);
    fixture.run_with_stdin(&["put", "c/a"], b"x");

    let output = fixture.run(&["fordo", "c", "do", "nope"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stderr(&output), "ERROR unknown command 'nope'\n");
}

#[test]
fn test_encrypt_decrypt() {
    let fixture = Fixture::new();
    let encrypted = fixture.run_with_stdin(&["encrypt", "passphrase"], b"secret data");
    assert!(encrypted.status.success(), "stderr: {}", stderr(&encrypted));
    assert_ne!(encrypted.stdout, b"secret data");

    let decrypted = fixture.run_with_stdin(&["decrypt", "passphrase"], &encrypted.stdout);
    assert!(decrypted.status.success(), "stderr: {}", stderr(&decrypted));
    assert_eq!(decrypted.stdout, b"secret data");

    let wrong = fixture.run_with_stdin(&["decrypt", "other"], &encrypted.stdout);
    assert_eq!(wrong.status.code(), Some(1));
    assert!(stderr(&wrong).starts_with("ERROR Decryption failed"));
}

#[test]
fn test_trans() {
    let fixture = Fixture::new();
    let output = fixture.run(&["trans", "tx1234567890abcdef01234-0051a88a80"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("2013-05-31T11:33:20Z"));
}

#[test]
fn test_tempurl_with_account_key() {
    let fixture = Fixture::new();
    fixture.run(&["post", "-h", "X-Account-Meta-Temp-Url-Key: mykey"]);

    let output = fixture.run(&["tempurl", "GET", "c/o", "60"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let url = stdout(&output);
    assert!(url.starts_with("file://"));
    assert!(url.contains("/c/o?temp_url_sig="));
    assert!(url.contains("&temp_url_expires="));
}

#[test]
fn test_tempurl_expiration_out_of_range() {
    let fixture = Fixture::new();
    let output = fixture.run(&["tempurl", "--key", "k", "GET", "c/o", "9223372036854775807"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("ERROR Expiration of"));
}

#[test]
fn test_version() {
    let fixture = Fixture::new();
    let output = run_swiftly(&["--version"], fixture.home.path(), &[], b"");
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}
