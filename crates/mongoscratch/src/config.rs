//! Configuration for scratch server instances.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the `mongod` executable to launch.
///
/// Consulted when [`ServerOptions::binary`] is unset; the `PATH` is
/// searched only when this variable is also unset.
pub const MONGOD_ENV: &str = "MONGOSCRATCH_MONGOD";

const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NAME_LENGTH: usize = 15;

/// Tunables for a [`Server`](crate::Server) instance.
///
/// The defaults launch whichever `mongod` resolution finds, wait up to
/// ten seconds for readiness, and hand out fifteen-character database
/// names.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    binary: Option<PathBuf>,
    startup_timeout: Duration,
    database_name_length: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            binary: None,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            database_name_length: DEFAULT_NAME_LENGTH,
        }
    }
}

impl ServerOptions {
    /// Creates options with the default tunables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Launches the given executable instead of resolving one from the
    /// [`MONGOD_ENV`] variable or the `PATH`.
    #[must_use]
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Bounds how long a start waits for the server to report readiness.
    #[must_use]
    pub const fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    /// Sets the length of generated database names.
    #[must_use]
    pub const fn database_name_length(mut self, length: usize) -> Self {
        self.database_name_length = length;
        self
    }

    pub(crate) fn binary_override(&self) -> Option<&PathBuf> {
        self.binary.as_ref()
    }

    pub(crate) const fn startup_deadline(&self) -> Duration {
        self.startup_timeout
    }

    pub(crate) const fn name_length(&self) -> usize {
        self.database_name_length
    }
}
