//! Resolution and launch of the `mongod` executable.

use std::env;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;

use tracing::debug;

use crate::config::{MONGOD_ENV, ServerOptions};
use crate::error::Error;

const LAUNCH_TARGET: &str = "mongoscratch::launch";

const DEFAULT_BINARY: &str = "mongod";

/// Resolves the `mongod` executable to launch.
///
/// Resolution order: the explicit [`ServerOptions::binary`] override, the
/// [`MONGOD_ENV`] environment variable, then `PATH` discovery. Only an
/// existence check is performed; provisioning the binary is the caller's
/// concern.
pub(crate) fn resolve_binary(options: &ServerOptions) -> Result<PathBuf, Error> {
    if let Some(path) = options.binary_override() {
        return existing(path.clone());
    }
    if let Some(value) = env::var_os(MONGOD_ENV) {
        return existing(PathBuf::from(value));
    }
    which::which(DEFAULT_BINARY).map_err(|_| Error::ExecutableNotFound {
        path: PathBuf::from(DEFAULT_BINARY),
    })
}

fn existing(path: PathBuf) -> Result<PathBuf, Error> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::ExecutableNotFound { path })
    }
}

/// Starts `mongod` against the given data directory and port, configured
/// for ephemeral (non-durable) storage, and exposes its stdout as a line
/// stream.
///
/// A detached reader thread pumps lines into the returned channel; the
/// channel disconnecting signals that the process closed its output. The
/// caller takes exclusive ownership of the [`Child`] and is the only
/// party allowed to signal or wait on it.
pub(crate) fn spawn_mongod(
    binary: &Path,
    data_dir: &Path,
    port: u16,
) -> Result<(Child, Receiver<String>), Error> {
    let mut command = Command::new(binary);
    command
        .arg("--dbpath")
        .arg(data_dir)
        .arg("--port")
        .arg(port.to_string())
        .arg("--storageEngine")
        .arg("ephemeralForTest")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    debug!(
        target: LAUNCH_TARGET,
        binary = %binary.display(),
        data_dir = %data_dir.display(),
        port,
        "spawning mongod"
    );

    let mut child = command.spawn().map_err(|source| Error::ProcessStart {
        binary: binary.to_path_buf(),
        source,
    })?;

    let stdout = child.stdout.take().ok_or_else(|| Error::ProcessStart {
        binary: binary.to_path_buf(),
        source: std::io::Error::other("failed to capture mongod stdout"),
    })?;

    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });

    Ok((child, receiver))
}
