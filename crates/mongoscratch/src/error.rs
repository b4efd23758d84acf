//! Domain errors raised while provisioning scratch servers.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while launching, watching, or using a scratch `mongod`.
///
/// Every failure is returned synchronously to the immediate caller; the
/// crate never retries or recovers silently. Startup failures carry the
/// offending log line (already lower-cased) so callers can distinguish
/// the cause without re-parsing server output.
#[derive(Debug, Error)]
pub enum Error {
    /// No usable `mongod` executable was found at the resolved location.
    #[error("mongod executable not found at {path}")]
    ExecutableNotFound {
        /// The path or command name that failed to resolve.
        path: PathBuf,
    },

    /// The scratch data directory could not be created.
    #[error("failed to create scratch data directory: {source}")]
    WorkingDirectory {
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// No unused port could be reserved for the server to bind.
    #[error("failed to reserve a free port: {source}")]
    NoPortAvailable {
        /// The underlying bind error.
        #[source]
        source: io::Error,
    },

    /// The operating system refused to start the server process.
    #[error("failed to launch {binary}: {source}")]
    ProcessStart {
        /// The executable that was being launched.
        binary: PathBuf,
        /// The underlying spawn error.
        #[source]
        source: io::Error,
    },

    /// The readiness line matched but its port could not be parsed.
    #[error("cannot parse port from mongod log line: {line}")]
    PortParse {
        /// The readiness line with the unparseable port token.
        line: String,
    },

    /// The server reported that its address is already in use.
    #[error("mongod address already in use: {line}")]
    AddressInUse {
        /// The log line announcing the conflict.
        line: String,
    },

    /// Another `mongod` instance is already running against the data
    /// directory.
    #[error("mongod already running: {line}")]
    AlreadyRunning {
        /// The log line announcing the conflict.
        line: String,
    },

    /// The server lacked permission to use its data directory or port.
    #[error("mongod permission denied: {line}")]
    PermissionDenied {
        /// The log line announcing the refusal.
        line: String,
    },

    /// The server could not find its data directory.
    #[error("mongod data directory not found: {line}")]
    DataDirectoryMissing {
        /// The log line announcing the missing directory.
        line: String,
    },

    /// The server began shutting down before it reported readiness.
    #[error("mongod shut down during startup: {line}")]
    UnexpectedShutdown {
        /// The log line announcing the shutdown.
        line: String,
    },

    /// The server's output stream ended before any readiness or failure
    /// line was seen.
    #[error("mongod exited before startup completed")]
    ExitedBeforeReady,

    /// The server produced no terminal verdict within the startup
    /// deadline.
    #[error("mongod did not report readiness within {timeout:?}")]
    StartupTimeout {
        /// The configured startup deadline.
        timeout: Duration,
    },

    /// No client connection is available because the server never
    /// started successfully.
    #[error("no client connection available: server is {state}")]
    ConnectionUnavailable {
        /// The lifecycle state the server was in.
        state: &'static str,
    },

    /// The MongoDB driver rejected the connection.
    #[error("failed to connect to {uri}: {source}")]
    Connection {
        /// The connection string that was used.
        uri: String,
        /// The underlying driver error.
        #[source]
        source: mongodb::error::Error,
    },

    /// The system entropy source failed while generating a database name.
    #[error("failed to draw random bytes for database name: {source}")]
    RandomSource {
        /// The underlying entropy error.
        #[source]
        source: getrandom::Error,
    },

    /// The operation is not valid for the server's current lifecycle
    /// state.
    #[error("cannot {operation} a {state} server")]
    InvalidState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The lifecycle state the server was in.
        state: &'static str,
    },

    /// The termination signal could not be delivered to the process.
    #[error("failed to kill mongod (pid {pid}): {source}")]
    Signal {
        /// The process that was being signalled.
        pid: u32,
        /// The underlying signalling error.
        #[source]
        source: io::Error,
    },
}
