//! Capability execution support

mod offload;

pub use offload::OffloadPool;
