//! A streaming multi-provider text generation gateway.
//!
//! Sessions issue generation requests built from a system/user prompt pair;
//! the gateway selects a provider wire dialect from stored configuration,
//! streams the upstream response, and relays chunk/done/error events until
//! completion or cancellation.

pub mod adapter;
pub mod error;
pub mod frames;
pub mod gateway;
mod session;
pub mod types;

// Re-export core types for easy usage
pub use adapter::{ProviderAdapter, ProviderRegistry, RegisteredProvider, UpstreamRequest};
pub use error::Error;
pub use frames::{FrameStream, FrameStreamExt};
pub use gateway::{ConfigSource, Gateway};
pub use types::*;
