//! Classification of `mongod` startup output.
//!
//! The server's log vocabulary is mapped to structured outcomes through
//! an ordered table of `(pattern, outcome)` pairs, so new server
//! versions' phrasing can be added without restructuring control flow.
//! Lines are consumed one at a time, in order, until the first terminal
//! verdict; everything else is ordinary log noise.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::Error;

const READINESS_TARGET: &str = "mongoscratch::readiness";

/// Terminal outcome of one startup attempt.
#[derive(Debug)]
pub(crate) enum Verdict {
    /// The server is accepting connections on the port it reported.
    Ready {
        /// The port parsed from the server's own readiness line.
        port: u16,
    },
    /// The server cannot become ready; the error names the cause.
    Failed(Error),
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Ready,
    AddressInUse,
    AlreadyRunning,
    PermissionDenied,
    DataDirectoryMissing,
    UnexpectedShutdown,
}

/// Ordered log vocabulary; the first matching row wins.
#[expect(
    clippy::expect_used,
    reason = "the pattern table is fixed at compile time and covered by the classifier tests"
)]
static PATTERNS: Lazy<Vec<(Regex, Outcome)>> = Lazy::new(|| {
    [
        (r"waiting for connections.*port\W*(\S+)", Outcome::Ready),
        (r"addr(?:ess)? already in use", Outcome::AddressInUse),
        (r"mongod already running", Outcome::AlreadyRunning),
        (r"mongod permission denied", Outcome::PermissionDenied),
        (r"data directory .*? not found", Outcome::DataDirectoryMissing),
        (r"shutting down", Outcome::UnexpectedShutdown),
    ]
    .into_iter()
    .map(|(pattern, outcome)| {
        let regex = Regex::new(pattern).expect("startup log pattern compiles");
        (regex, outcome)
    })
    .collect()
});

/// Classifies one log line, returning a verdict if it is terminal.
///
/// Matching is case-insensitive (the line is lower-cased first) and
/// unmatched lines yield `None` so the caller keeps scanning.
pub(crate) fn classify_line(raw: &str) -> Option<Verdict> {
    let line = raw.to_lowercase();
    for (pattern, outcome) in PATTERNS.iter() {
        let Some(captures) = pattern.captures(&line) else {
            continue;
        };
        let token = captures.get(1).map(|m| m.as_str().to_owned());
        let verdict = match outcome {
            Outcome::Ready => parse_reported_port(token.as_deref(), &line),
            Outcome::AddressInUse => Verdict::Failed(Error::AddressInUse { line }),
            Outcome::AlreadyRunning => Verdict::Failed(Error::AlreadyRunning { line }),
            Outcome::PermissionDenied => Verdict::Failed(Error::PermissionDenied { line }),
            Outcome::DataDirectoryMissing => Verdict::Failed(Error::DataDirectoryMissing { line }),
            Outcome::UnexpectedShutdown => Verdict::Failed(Error::UnexpectedShutdown { line }),
        };
        return Some(verdict);
    }
    None
}

/// The readiness line is trusted over the port requested at launch: an
/// ephemeral test-mode server may legitimately bind somewhere else.
fn parse_reported_port(token: Option<&str>, line: &str) -> Verdict {
    token
        .and_then(|t| t.parse::<u16>().ok())
        .map_or_else(
            || {
                Verdict::Failed(Error::PortParse {
                    line: line.to_owned(),
                })
            },
            |port| Verdict::Ready { port },
        )
}

/// Drives classification over the line stream until a terminal verdict.
///
/// The stream ending (the process closed its stdout) is
/// [`Error::ExitedBeforeReady`]; the deadline expiring without a verdict
/// is [`Error::StartupTimeout`], so a hung server cannot stall the
/// caller indefinitely.
pub(crate) fn await_readiness(
    lines: &Receiver<String>,
    deadline: Instant,
    timeout: Duration,
) -> Verdict {
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Verdict::Failed(Error::StartupTimeout { timeout });
        }
        match lines.recv_timeout(remaining) {
            Ok(line) => {
                debug!(target: READINESS_TARGET, line = %line, "mongod output");
                if let Some(verdict) = classify_line(&line) {
                    return verdict;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                return Verdict::Failed(Error::StartupTimeout { timeout });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Verdict::Failed(Error::ExitedBeforeReady);
            }
        }
    }
}
