//! Read-only JSON API over the games, players and tournaments tables of a
//! SQLite store. Every route is one parameterized `SELECT`.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use config::Config;
pub use routes::{app, router};
