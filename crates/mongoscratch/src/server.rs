//! The scratch server facade.
//!
//! [`Server`] composes binary resolution, port allocation, process
//! launch, and readiness classification into an explicit lifecycle:
//! `Created → Started → Stopped`, with `Failed` absorbing any start
//! error. Operations that are invalid for the current state are rejected
//! with a typed error rather than relying on fields happening to be
//! unset.

use std::fmt;
use std::path::Path;
use std::process::Child;
use std::time::Instant;

use mongodb::sync::{Client, Database};
use once_cell::sync::OnceCell;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::config::ServerOptions;
use crate::error::Error;
use crate::launch;
use crate::name;
use crate::port;
use crate::readiness::{self, Verdict};

const SERVER_TARGET: &str = "mongoscratch::server";

/// A throwaway `mongod` instance owned by the current process.
///
/// The server exclusively owns its child process handle and its scratch
/// data directory; both are reclaimed by [`Server::stop`], or on drop if
/// the server is still running. The shared client connection is created at
/// most once, lazily, on the first [`Server::new_database`] call and is
/// safe to request from multiple threads.
pub struct Server {
    options: ServerOptions,
    state: State,
    client: OnceCell<Client>,
}

impl fmt::Debug for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Server")
            .field("options", &self.options)
            .field("state", &self.state.name())
            .field("port", &self.port())
            .finish_non_exhaustive()
    }
}

enum State {
    Created,
    Started(Running),
    Stopped,
    Failed,
}

impl State {
    const fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started(_) => "started",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Resources held while the server process is running.
struct Running {
    child: Child,
    pid: u32,
    port: u16,
    data_dir: TempDir,
}

/// A named logical database on a running scratch server.
///
/// Names are generated with overwhelming collision resistance; every
/// handle produced by one server shares that server's single client
/// connection.
#[derive(Clone)]
pub struct DatabaseHandle {
    name: String,
    database: Database,
}

impl fmt::Debug for DatabaseHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DatabaseHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl DatabaseHandle {
    /// The generated database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The driver-level database bound to this name.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(ServerOptions::default())
    }
}

impl Server {
    /// Creates a server in the `Created` state; nothing runs until
    /// [`Server::start`].
    #[must_use]
    pub const fn new(options: ServerOptions) -> Self {
        Self {
            options,
            state: State::Created,
            client: OnceCell::new(),
        }
    }

    /// Launches `mongod` and waits until it reports readiness.
    ///
    /// Resolves the executable, creates the scratch data directory,
    /// reserves a port, spawns the process, and classifies its startup
    /// log stream until a terminal verdict or the configured deadline.
    /// The port recorded on success is the one the server itself
    /// reported, which may differ from the reserved port.
    ///
    /// # Errors
    ///
    /// Returns the specific startup failure (see [`Error`]); the server
    /// then transitions to `Failed` and a fresh instance is required to
    /// retry. A spawned process is killed before the error is returned
    /// so no orphan outlives the failed attempt.
    pub fn start(&mut self) -> Result<(), Error> {
        if !matches!(self.state, State::Created) {
            return Err(Error::InvalidState {
                operation: "start",
                state: self.state.name(),
            });
        }
        match launch_until_ready(&self.options) {
            Ok(running) => {
                self.state = State::Started(running);
                Ok(())
            }
            Err(error) => {
                self.state = State::Failed;
                Err(error)
            }
        }
    }

    /// Returns a handle to a freshly named database on this server.
    ///
    /// The first call opens the single shared client connection for
    /// `mongodb://localhost:<port>`; subsequent calls reuse it. Every
    /// call generates a new name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionUnavailable`] unless the server is
    /// started, [`Error::Connection`] if the driver rejects the
    /// connection string, or [`Error::RandomSource`] if name generation
    /// fails.
    pub fn new_database(&self) -> Result<DatabaseHandle, Error> {
        let State::Started(running) = &self.state else {
            return Err(Error::ConnectionUnavailable {
                state: self.state.name(),
            });
        };
        let client = self.client(running.port)?;
        let database_name = name::random_name(self.options.name_length())?;
        Ok(DatabaseHandle {
            database: client.database(&database_name),
            name: database_name,
        })
    }

    /// Terminates the server process immediately.
    ///
    /// Delivers an unconditional kill signal and reaps the exited
    /// process so its disappearance is observable; there is no graceful
    /// shutdown negotiation. The scratch directory is removed as part
    /// of stopping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the server is started, or
    /// [`Error::Signal`] if the kill signal cannot be delivered.
    pub fn stop(&mut self) -> Result<(), Error> {
        let State::Started(running) = &mut self.state else {
            return Err(Error::InvalidState {
                operation: "stop",
                state: self.state.name(),
            });
        };
        running.child.kill().map_err(|source| Error::Signal {
            pid: running.pid,
            source,
        })?;
        // Reap the zombie; after SIGKILL this returns promptly.
        drop(running.child.wait());
        debug!(target: SERVER_TARGET, pid = running.pid, "mongod stopped");
        self.state = State::Stopped;
        Ok(())
    }

    /// The port the server reported at startup; `Some` only while
    /// started.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        match &self.state {
            State::Started(running) => Some(running.port),
            _ => None,
        }
    }

    /// The process id of the running server; `Some` only while started.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        match &self.state {
            State::Started(running) => Some(running.pid),
            _ => None,
        }
    }

    /// The connection string for the running server; `Some` only while
    /// started.
    #[must_use]
    pub fn connection_uri(&self) -> Option<String> {
        self.port().map(|port| format!("mongodb://localhost:{port}"))
    }

    /// The scratch data directory; `Some` only while started.
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        match &self.state {
            State::Started(running) => Some(running.data_dir.path()),
            _ => None,
        }
    }

    pub(crate) fn client(&self, port: u16) -> Result<&Client, Error> {
        self.client.get_or_try_init(|| {
            let uri = format!("mongodb://localhost:{port}");
            debug!(target: SERVER_TARGET, uri = %uri, "opening shared client connection");
            Client::with_uri_str(&uri).map_err(|source| Error::Connection { uri, source })
        })
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let State::Started(running) = &mut self.state {
            warn!(
                target: SERVER_TARGET,
                pid = running.pid,
                "server dropped while running; killing mongod"
            );
            drop(running.child.kill());
            drop(running.child.wait());
        }
    }
}

fn launch_until_ready(options: &ServerOptions) -> Result<Running, Error> {
    let binary = launch::resolve_binary(options)?;
    let data_dir = tempfile::Builder::new()
        .prefix("mongoscratch-")
        .tempdir()
        .map_err(|source| Error::WorkingDirectory { source })?;
    let requested_port = port::free_port()?;
    let (mut child, lines) = launch::spawn_mongod(&binary, data_dir.path(), requested_port)?;
    let pid = child.id();

    let timeout = options.startup_deadline();
    let deadline = Instant::now() + timeout;
    match readiness::await_readiness(&lines, deadline, timeout) {
        Verdict::Ready { port } => {
            debug!(
                target: SERVER_TARGET,
                pid,
                requested_port,
                reported_port = port,
                "mongod ready"
            );
            Ok(Running {
                child,
                pid,
                port,
                data_dir,
            })
        }
        Verdict::Failed(error) => {
            warn!(target: SERVER_TARGET, pid, %error, "mongod failed to start");
            drop(child.kill());
            drop(child.wait());
            Err(error)
        }
    }
}
