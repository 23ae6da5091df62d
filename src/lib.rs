//! Client for the HAProxy stats socket.

pub mod app;
mod client;
mod common;
pub mod config;
mod error;
pub mod logger;
mod protocol;

pub use client::{Address, Connection, Transport};
pub use common::{Params, Result};
pub use error::HaproxyError;
pub use protocol::{catalog, Command, CommandKind, Param, Weight};
