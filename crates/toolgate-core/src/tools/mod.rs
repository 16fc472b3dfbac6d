//! Tool hosting
//!
//! The static tool host: a registry of shared built-in capabilities plus
//! per-identity capability sets, implementing the `ToolHost` collaborator
//! port. How a production deployment loads user code is its own concern;
//! the gateway only ever sees the port.

mod builtin;
mod expr;
mod host;

pub use builtin::{CalculatorTool, EchoTool, TimestampTool, UuidTool};
pub use host::StaticToolHost;
