//! Collaborators the sync engine and the scanner call through.
//!
//! ## Traits
//!
//! - [`ShapeFetcher`] - Fetches the current on-chain state of one account
//! - [`Transport`] / [`DeviceConnection`] - Hardware device address derivation
//!
//! Implementations live outside this crate (RPC clients, device transports).

mod device;
mod shape;

pub use device::{AddressRequest, AddressResult, DeviceConnection, Transport};
pub use shape::{AccountShape, AccountShapeInfo, ShapeFetcher};
