//! Pure Rust async client for the [Source RCON protocol](https://developer.valvesoftware.com/wiki/Source_RCON_Protocol).
pub mod client;
pub mod config;
pub mod error;
pub mod packet;

pub use client::{Client, Response};
pub use config::Config;
pub use error::RconError;
