//! Folio Remote Asset Gateway
//!
//! Abstraction over the object store that holds media bytes:
//! - [`AssetGateway`]: `upload(bytes, kind)` and `delete(id, kind)`
//! - [`MemoryGateway`]: in-process store with a call log
//! - [`FsGateway`]: one file per blob under a root directory
//! - [`TimedGateway`]: per-call deadline wrapper
//!
//! A gateway is constructed once at process start and shared by reference
//! (`Arc<dyn AssetGateway>`) across concurrent reconciliations.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod fs;
mod gateway;
mod memory;
mod timed;

pub use error::GatewayError;
pub use fs::{FsGateway, FsGatewayConfig};
pub use gateway::{AssetGateway, SharedGateway};
pub use memory::{GatewayCall, MemoryGateway};
pub use timed::TimedGateway;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
