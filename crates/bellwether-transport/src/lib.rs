//! # JSON-RPC Client Transport
//!
//! Connects to a tool server over one of two transports and exposes a
//! uniform [`Session`] for the rest of the workspace:
//!
//! - [`StdioSession`]: spawns the target as a subprocess and frames
//!   newline-delimited JSON-RPC over its stdin/stdout.
//! - [`HttpSession`]: streaming HTTP POST with optional server-assigned
//!   session id.
//!
//! [`discovery`] layers the protocol handshake on top: `initialize` plus
//! the capability-gated list calls, normalized into baseline descriptors.

pub mod discovery;
mod error;
mod frame;
mod http;
mod session;
mod stdio;

pub use discovery::{discover, DiscoveryResult, PROTOCOL_VERSION};
pub use error::{Result, TransportError};
pub use frame::{JsonRpcErrorBody, JsonRpcRequest, JsonRpcResponse};
pub use http::{HttpConfig, HttpSession};
pub use session::Session;
pub use stdio::{StdioConfig, StdioSession};
