//! Portal CLI
//!
//! Loads configuration, establishes a wallet session and drives the store
//! client. All protocol logic lives in `meme-portal-sdk`.

pub mod commands;
pub mod config;

pub use commands::{run, Command};
pub use config::Config;
