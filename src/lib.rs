//! Instagram media mirror library.
//!
//! Mirrors an Instagram account's media into SQLite, relays comments written
//! locally back to Instagram, and serves both over a small JSON API.

pub mod config;
pub mod constants;
pub mod db;
pub mod instagram;
pub mod relay;
pub mod sync;
pub mod timestamp;
pub mod web;
