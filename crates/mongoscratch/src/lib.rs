//! Throwaway MongoDB servers for automated tests.
//!
//! `mongoscratch` launches a `mongod` process configured for ephemeral,
//! in-memory storage, watches its startup log stream until the server
//! reports that it is accepting connections, and hands callers freshly
//! named, collision-resistant databases on that instance. Each [`Server`]
//! owns its process and its scratch data directory; both are reclaimed
//! when the server is stopped or dropped.
//!
//! The crate assumes a usable `mongod` executable already exists. It is
//! located, in order, from [`ServerOptions::binary`], the [`MONGOD_ENV`]
//! environment variable, or the `PATH`. Downloading or installing server
//! binaries is out of scope.
//!
//! ```rust,no_run
//! use mongoscratch::Server;
//!
//! # fn main() -> Result<(), mongoscratch::Error> {
//! let mut server = Server::default();
//! server.start()?;
//!
//! let db = server.new_database()?;
//! let _people = db.database().collection::<mongodb::bson::Document>("people");
//!
//! server.stop()?;
//! # Ok(()) }
//! ```
//!
//! Readiness is decided solely from the port the server itself reports in
//! its log output, which for ephemeral test instances may legitimately
//! differ from the port requested at launch. A configurable deadline
//! bounds the wait, so a wedged server fails the start instead of
//! blocking the caller forever.

mod config;
mod error;
mod launch;
mod name;
mod port;
mod readiness;
mod server;

pub use config::{MONGOD_ENV, ServerOptions};
pub use error::Error;
pub use name::random_name;
pub use server::{DatabaseHandle, Server};
