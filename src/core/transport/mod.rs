//! Transport layer for the gateway.
//!
//! - **HTTP**: one listener per logical server, session-aware JSON-RPC over `POST` - feature: `http`
//! - **STDIO**: one logical server over standard input/output - feature: `stdio`
//!
//! Both transports hand tool calls to the [`HostedServer`](crate::core::server::HostedServer)
//! they were given; neither knows about tools or adapters.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod protocol;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;

#[cfg(feature = "stdio")]
pub use config::StdioConfig;
