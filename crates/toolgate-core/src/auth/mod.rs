//! Authentication and authorization
//!
//! The identity & access core: password hashing, the three credential
//! types (short-lived session tokens, rotating refresh tokens, persistent
//! scoped API tokens), the permission evaluator, and the sliding-window
//! rate limiter.
//!
//! # Module Structure
//!
//! - `password` - Argon2id hashing with bcrypt verify fallback
//! - `claims` - session-token claim set
//! - `session` - session-token issuing and verification (HS256)
//! - `api_tokens` - persistent scoped API tokens
//! - `refresh` - refresh-token lifecycle (create/verify/rotate/sweep)
//! - `permissions` - the wildcard-or-exact permission rule
//! - `rate_limit` - sliding-window request counter
//! - `service` - the facade tying the pieces together

pub mod api_tokens;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod rate_limit;
pub mod refresh;
pub mod service;
pub mod session;
