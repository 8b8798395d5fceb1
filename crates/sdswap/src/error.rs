//! Swap operation errors
//!
//! One variant per failure the operator can hit. Variants that come from the
//! USB stack carry the underlying `rusb::Error` so the report names both the
//! step that failed and why.

use crate::blockdev::BlockDeviceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error(transparent)]
    InvalidFormat(#[from] protocol::ProtocolError),

    #[error("Failed to enumerate USB devices: {0}")]
    Enumeration(rusb::Error),

    #[error("No device found")]
    NotFound,

    #[error("Multiple devices found, narrow the selection with a location, address or serial")]
    MultipleMatches,

    #[error("Failed to read device descriptor: {0}")]
    DescriptorReadFailed(rusb::Error),

    #[error("Failed to open USB device: {0}")]
    DeviceOpenFailed(rusb::Error),

    #[error("Failed to read serial number: {0}")]
    SerialReadFailed(rusb::Error),

    #[error("Failed to read port numbers: {0}")]
    PortNumbersFailed(rusb::Error),

    #[error("No parent hub found")]
    NoParent,

    #[error("Device reports no upstream port number")]
    NoPortNumber,

    #[error("Failed to open parent hub: {0}")]
    HubOpenFailed(rusb::Error),

    #[error("Failed to check kernel driver: {0}")]
    DriverQueryFailed(rusb::Error),

    #[error("Failed to attach kernel driver: {0}")]
    DriverBindFailed(rusb::Error),

    #[error("Failed to detach kernel driver: {0}")]
    DriverUnbindFailed(rusb::Error),

    #[error("Failed to set port status: {0}")]
    TransferFailed(rusb::Error),

    #[error("Failed to get block device path: {0}")]
    BlockDevice(#[from] BlockDeviceError),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl SwapError {
    /// Extra guidance for failures with a known platform cause
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            SwapError::NoParent | SwapError::HubOpenFailed(_) => {
                if cfg!(target_os = "macos") {
                    Some(
                        "On macOS, opening a root hub is not permitted. \
                         Plug the device into a non-root hub.",
                    )
                } else {
                    Some(
                        "The device may be attached directly to a root hub port, \
                         which cannot be suspended from user space. \
                         Plug it into an external hub.",
                    )
                }
            }
            SwapError::DeviceOpenFailed(rusb::Error::Access) => {
                Some("Permission denied. Run as root or add a udev rule for the device.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;
