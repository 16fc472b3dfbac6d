//! Toolgate domain layer
//!
//! Core business types for the multi-tenant tool gateway: identities,
//! credential records, capability contracts, the error taxonomy, and the
//! ports behind which the durable store and the tool-loading collaborator
//! live. This crate is pure - no I/O, no transport, no crypto.

pub mod capability;
pub mod error;
pub mod identity;
pub mod store;
pub mod token;

pub use capability::{Capability, CapabilityOutput, CapabilitySpec, ToolHost};
pub use error::{Error, Result};
pub use identity::Identity;
pub use store::{CredentialStore, StoreStats};
pub use token::{ApiTokenRecord, RateLimitSpec, RefreshTokenRecord, WILDCARD_SCOPE};
