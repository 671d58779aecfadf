//! Domain model of the Lectio reading club: accounts and PIN rules, the
//! catalog, reading progress, pricing, messaging and the admin rollups.
//!
//! No HTTP or database code lives here. Storage is reached through
//! [`store::ClubStore`].

pub mod billing;
pub mod book;
pub mod error;
pub mod finance;
pub mod message;
pub mod pin;
pub mod progress;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Error, Result};
