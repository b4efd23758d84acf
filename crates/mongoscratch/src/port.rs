//! Advisory allocation of unused TCP ports.

use std::net::{Ipv4Addr, TcpListener};

use crate::error::Error;

/// Reserves a currently-unused loopback port.
///
/// Binds an ephemeral listener, records the port the kernel assigned,
/// and releases it again. The reservation is advisory: another process
/// may grab the port before `mongod` binds it, which is why the port the
/// server reports in its own log output is authoritative rather than
/// this suggestion.
pub(crate) fn free_port() -> Result<u16, Error> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|source| Error::NoPortAvailable { source })?;
    let port = listener
        .local_addr()
        .map_err(|source| Error::NoPortAvailable { source })?
        .port();
    Ok(port)
}
