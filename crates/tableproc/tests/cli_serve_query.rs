#![cfg(all(unix, feature = "cli"))]

use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tableproc::api::{Outcome, TableClient};

const TABLE: &str = "# test table\nrelay 10.0.0.1\npostmaster root\nuser@example.com\n";

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/tpcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_table(dir: &Path) -> PathBuf {
    let path = dir.join("table.txt");
    std::fs::write(&path, TABLE).expect("table should be writable");
    path
}

fn spawn_socket_server(table: &Path, sock: &Path, once: bool) -> Child {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tableproc"));
    cmd.arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg(table)
        .arg("--socket")
        .arg(sock);
    if once {
        cmd.arg("--once");
    }
    let child = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve should start");

    let start = Instant::now();
    while !sock.exists() {
        if start.elapsed() >= Duration::from_secs(3) {
            panic!("socket never appeared");
        }
        thread::sleep(Duration::from_millis(25));
    }
    child
}

fn query(sock: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tableproc"))
        .arg("--log-level")
        .arg("off")
        .arg("--format")
        .arg("json")
        .arg("query")
        .args(args)
        .env("TABLEPROC_SOCKET", sock)
        .output()
        .expect("query should run")
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("query should emit json")
}

#[test]
fn queries_against_socket_server() {
    let dir = unique_temp_dir("serve");
    let table = write_table(&dir);
    let sock = dir.join("table.sock");
    let mut child = spawn_socket_server(&table, &sock, false);

    let output = query(&sock, &["lookup", "relay", "--kind", "netaddr"]);
    assert!(output.status.success());
    let reply = json(&output);
    assert_eq!(reply["result"], "found");
    assert_eq!(reply["value"], "10.0.0.1");
    assert_eq!(reply["kind"], 8);

    let output = query(&sock, &["check", "user@example.com", "--kind", "mailaddr"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["code"], 1);

    let output = query(&sock, &["check", "nobody@example.com"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["result"], "not_found");

    let output = query(&sock, &["lookup", "user@example.com"]);
    assert_eq!(json(&output)["result"], "not_found", "set members carry no value");

    std::fs::write(&table, "relay 10.0.0.2\n").expect("table should be rewritable");
    let output = query(&sock, &["update"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["result"], "found");
    let output = query(&sock, &["lookup", "relay"]);
    assert_eq!(json(&output)["value"], "10.0.0.2");

    let _ = child.kill();
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn once_exits_cleanly_after_close() {
    let dir = unique_temp_dir("once");
    let table = write_table(&dir);
    let sock = dir.join("table.sock");
    let mut child = spawn_socket_server(&table, &sock, true);

    let output = query(&sock, &["fetch", "--kind", "source"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["value"], "10.0.0.1");

    let status = child.wait().expect("serve should exit");
    assert!(status.success());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn serves_inherited_descriptor() {
    let dir = unique_temp_dir("fd");
    let table = write_table(&dir);
    let (parent, backend) = UnixStream::pair().expect("socket pair");

    let mut child = Command::new(env!("CARGO_BIN_EXE_tableproc"))
        .arg("--log-level")
        .arg("error")
        .arg("serve")
        .arg(&table)
        .stdin(Stdio::from(OwnedFd::from(backend)))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve should start");

    let reader = parent.try_clone().expect("clone parent end");
    let mut client = TableClient::new(reader, parent);
    client.open().expect("open should be acknowledged");
    assert_eq!(client.check(0, "postmaster").expect("check"), Outcome::Found);
    let answer = client.lookup(0, "postmaster").expect("lookup");
    assert_eq!(answer.value.as_deref(), Some("root"));
    client.close().expect("close");

    assert!(child.wait().expect("serve should exit").success());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_mismatch_exits_with_protocol_fault() {
    let dir = unique_temp_dir("skew");
    let table = write_table(&dir);
    let (parent, backend) = UnixStream::pair().expect("socket pair");

    let mut child = Command::new(env!("CARGO_BIN_EXE_tableproc"))
        .arg("--log-level")
        .arg("off")
        .arg("serve")
        .arg(&table)
        .stdin(Stdio::from(OwnedFd::from(backend)))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("serve should start");

    let reader = parent.try_clone().expect("clone parent end");
    let mut client = TableClient::new(reader, parent);
    assert!(client.open_version(99).is_err());

    assert_eq!(child.wait().expect("serve should exit").code(), Some(60));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn query_without_key_is_usage_error() {
    let output = query(Path::new("/tmp/tpcli-unused.sock"), &["lookup"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_table_file_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_tableproc"))
        .arg("serve")
        .arg("/nonexistent/tableproc/table.txt")
        .stdin(Stdio::null())
        .output()
        .expect("serve should run");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn connect_to_missing_socket_is_transport_error() {
    let output = query(
        Path::new("/tmp/tpcli-definitely-missing.sock"),
        &["fetch"],
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tableproc"))
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("version: {}", env!("CARGO_PKG_VERSION"))));
    assert!(stdout.contains("api_version: 1"));
}
