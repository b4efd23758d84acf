//! Unit tests for the server lifecycle state machine.
//!
//! Lifecycle paths that need a live process are covered by the
//! integration tests, which drive a fake `mongod`; these tests pin down
//! the state transitions that must fail without one.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ServerOptions;
use crate::error::Error;
use crate::launch::resolve_binary;
use crate::server::Server;

fn missing_binary_options() -> ServerOptions {
    ServerOptions::new()
        .binary("/definitely/missing/mongod")
        .startup_timeout(Duration::from_millis(200))
}

#[test]
fn new_database_before_start_reports_connection_unavailable() {
    let server = Server::default();
    match server.new_database() {
        Err(Error::ConnectionUnavailable { state }) => assert_eq!(state, "created"),
        other => panic!("expected connection-unavailable error, got {other:?}"),
    }
}

#[test]
fn stop_before_start_is_an_invalid_state() {
    let mut server = Server::default();
    match server.stop() {
        Err(Error::InvalidState { operation, state }) => {
            assert_eq!(operation, "stop");
            assert_eq!(state, "created");
        }
        other => panic!("expected invalid-state error, got {other:?}"),
    }
}

#[test]
fn port_and_pid_are_undefined_before_start() {
    let server = Server::default();
    assert_eq!(server.port(), None);
    assert_eq!(server.pid(), None);
    assert_eq!(server.connection_uri(), None);
    assert_eq!(server.data_path(), None);
}

#[test]
fn start_with_missing_binary_fails_and_poisons_the_server() {
    let mut server = Server::new(missing_binary_options());
    match server.start() {
        Err(Error::ExecutableNotFound { path }) => {
            assert_eq!(path, PathBuf::from("/definitely/missing/mongod"));
        }
        other => panic!("expected executable-not-found error, got {other:?}"),
    }
    assert_eq!(server.port(), None);

    // A failed server never becomes usable again.
    match server.start() {
        Err(Error::InvalidState { operation, state }) => {
            assert_eq!(operation, "start");
            assert_eq!(state, "failed");
        }
        other => panic!("expected invalid-state error, got {other:?}"),
    }
    match server.new_database() {
        Err(Error::ConnectionUnavailable { state }) => assert_eq!(state, "failed"),
        other => panic!("expected connection-unavailable error, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn new_database_calls_share_one_client_connection() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::ptr;

    let dir = tempfile::TempDir::new().expect("temp dir");
    let binary = dir.path().join("mongod");
    fs::write(
        &binary,
        "#!/bin/sh\necho \"waiting for connections, port 27917\"\nexec sleep 30\n",
    )
    .expect("write fake mongod");
    let mut permissions = fs::metadata(&binary).expect("stat fake mongod").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&binary, permissions).expect("chmod fake mongod");

    let mut server = Server::new(ServerOptions::new().binary(binary));
    server.start().expect("start against fake mongod");

    let first = server.new_database().expect("first database");
    let second = server.new_database().expect("second database");
    assert_ne!(first.name(), second.name());

    // Both handles came out of the one lazily initialised client cell.
    let port = server.port().expect("port while started");
    let client_a = server.client(port).expect("shared client");
    let client_b = server.client(port).expect("shared client");
    assert!(
        ptr::eq(client_a, client_b),
        "new_database must reuse a single shared client"
    );

    server.stop().expect("stop fake mongod");
}

#[test]
fn explicit_binary_override_wins_resolution() {
    let options = missing_binary_options();
    match resolve_binary(&options) {
        Err(Error::ExecutableNotFound { path }) => {
            assert_eq!(path, PathBuf::from("/definitely/missing/mongod"));
        }
        other => panic!("expected executable-not-found error, got {other:?}"),
    }
}
