//! Core module containing shared infrastructure components.
//!
//! Configuration, the gateway error type, the logical servers, session
//! bookkeeping and the transports that expose them.

pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod transport;

pub use config::{Config, ServerVariant};
pub use error::{Error, Result};
pub use server::{HostedServer, McpServer, ServerBinding, build_hosted_servers};
pub use session::{SessionContext, SessionManager};
pub use transport::{TransportConfig, TransportService};
