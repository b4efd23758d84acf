//! Unit tests for startup log classification.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use rstest::rstest;

use crate::error::Error;
use crate::readiness::{Verdict, await_readiness, classify_line};

#[rstest]
#[case::bare("waiting for connections, port 27017", 27017)]
#[case::timestamped(
    "2019-05-02T17:00:04.112+0200 I NETWORK  [initandlisten] waiting for connections on port 40561",
    40561
)]
#[case::mixed_case("Waiting For Connections, Port 27017", 27017)]
fn readiness_line_reports_bound_port(#[case] line: &str, #[case] expected: u16) {
    match classify_line(line) {
        Some(Verdict::Ready { port }) => assert_eq!(port, expected),
        other => panic!("expected ready verdict, got {other:?}"),
    }
}

#[rstest]
#[case::not_a_number("waiting for connections, port notanumber")]
#[case::out_of_range("waiting for connections, port 99999999")]
fn unparseable_port_is_a_distinct_failure(#[case] line: &str) {
    match classify_line(line) {
        Some(Verdict::Failed(Error::PortParse { .. })) => {}
        other => panic!("expected port parse failure, got {other:?}"),
    }
}

#[rstest]
#[case::errno_spelling("address already in use")]
#[case::mongod_spelling("addr already in use")]
fn address_conflicts_are_classified(#[case] line: &str) {
    match classify_line(line) {
        Some(Verdict::Failed(Error::AddressInUse { .. })) => {}
        other => panic!("expected address-in-use failure, got {other:?}"),
    }
}

#[test]
fn known_failure_vocabulary_is_classified() {
    let cases: [(&str, fn(&Error) -> bool); 4] = [
        ("mongod already running", |e| {
            matches!(e, Error::AlreadyRunning { .. })
        }),
        ("mongod permission denied", |e| {
            matches!(e, Error::PermissionDenied { .. })
        }),
        ("data directory /tmp/scratch not found", |e| {
            matches!(e, Error::DataDirectoryMissing { .. })
        }),
        ("shutting down with code:100", |e| {
            matches!(e, Error::UnexpectedShutdown { .. })
        }),
    ];
    for (line, expected) in cases {
        match classify_line(line) {
            Some(Verdict::Failed(error)) => {
                assert!(expected(&error), "line {line:?} classified as {error:?}");
            }
            other => panic!("line {line:?} yielded {other:?}"),
        }
    }
}

#[rstest]
#[case::connection_accepted("connection accepted from 127.0.0.1:53974")]
#[case::build_info("db version v4.0.9")]
#[case::empty("")]
fn noise_lines_are_discarded(#[case] line: &str) {
    assert!(classify_line(line).is_none(), "line {line:?} was terminal");
}

fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

#[test]
fn stream_end_without_match_is_exited_before_ready() {
    let (sender, receiver) = mpsc::channel();
    sender.send(String::from("log noise")).expect("send");
    drop(sender);
    match await_readiness(&receiver, far_deadline(), Duration::from_secs(5)) {
        Verdict::Failed(Error::ExitedBeforeReady) => {}
        other => panic!("expected exited-before-ready, got {other:?}"),
    }
}

#[test]
fn first_terminal_line_wins_over_later_readiness() {
    let (sender, receiver) = mpsc::channel();
    sender.send(String::from("addr already in use")).expect("send");
    sender
        .send(String::from("waiting for connections, port 27017"))
        .expect("send");
    drop(sender);
    match await_readiness(&receiver, far_deadline(), Duration::from_secs(5)) {
        Verdict::Failed(Error::AddressInUse { .. }) => {}
        other => panic!("expected address-in-use failure, got {other:?}"),
    }
}

#[test]
fn silent_stream_times_out_at_the_deadline() {
    let (sender, receiver) = mpsc::channel::<String>();
    let timeout = Duration::from_millis(50);
    let verdict = await_readiness(&receiver, Instant::now() + timeout, timeout);
    drop(sender);
    match verdict {
        Verdict::Failed(Error::StartupTimeout { .. }) => {}
        other => panic!("expected startup timeout, got {other:?}"),
    }
}

#[test]
fn readiness_arriving_mid_stream_is_reported() {
    let (sender, receiver) = mpsc::channel();
    let producer = thread::spawn(move || {
        sender.send(String::from("initandlisten starting")).expect("send");
        sender
            .send(String::from("waiting for connections on port 23456"))
            .expect("send");
    });
    match await_readiness(&receiver, far_deadline(), Duration::from_secs(5)) {
        Verdict::Ready { port } => assert_eq!(port, 23456),
        other => panic!("expected ready verdict, got {other:?}"),
    }
    producer.join().expect("producer thread");
}
