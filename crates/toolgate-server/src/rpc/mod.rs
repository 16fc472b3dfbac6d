//! Protocol layer
//!
//! Envelope types, error codes, credential resolution, and the staged
//! dispatcher shared by every transport.

pub mod credentials;
pub mod dispatcher;
pub mod envelope;

pub use credentials::{extract_credential, CredentialResolver};
pub use dispatcher::{DispatchContext, Dispatcher};
pub use envelope::{RpcError, RpcRequest, RpcResponse};
