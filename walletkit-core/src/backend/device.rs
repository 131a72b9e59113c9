use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeviceError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRequest {
    pub currency: String,
    pub path: String,
    pub derivation_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressResult {
    pub address: String,
    pub public_key: String,
}

/// Opens exclusive connections to a hardware device.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, device_id: &str) -> Result<Box<dyn DeviceConnection>, DeviceError>;
}

/// An open device session. Must be closed by whoever opened it.
#[async_trait]
pub trait DeviceConnection: Send {
    /// Derive the address at `request.path`.
    ///
    /// Fails with [`DeviceError::UnsupportedDerivation`] or
    /// [`DeviceError::Denied`] when the device app refuses this derivation.
    async fn get_address(&mut self, request: &AddressRequest) -> Result<AddressResult, DeviceError>;

    async fn close(self: Box<Self>) -> Result<(), DeviceError>;
}
