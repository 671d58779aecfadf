//! SQLite backend for [`lectio_core::store::ClubStore`].
//!
//! Every query runs on the dedicated [`tokio_rusqlite`] connection thread, so
//! the async runtime never blocks on disk I/O.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
