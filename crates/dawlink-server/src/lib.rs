//! In-host call server for dawlink.
//!
//! Receives bridged requests, resolves their locators against the live
//! host graph through the shared dispatch table, and ships results back.
//! Inside a real host this crate is embedded with the host's `HostApi`
//! implementation; the `dawlink-server` binary serves an in-memory host
//! for developing clients without a DAW.

mod server;
pub use server::CallServer;

pub use dawlink::{BridgeConfig, Result};
