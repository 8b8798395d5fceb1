//! USB subsystem
//!
//! Finds the SD swap device and hands its port over between host and target.
//!
//! This module handles:
//! - Device selection against the operator's filter
//! - Parent hub and port lookup
//! - Link speed classification
//! - Kernel driver attach/detach and the hub port suspend request
//! - Attachment state queries
//!
//! Everything runs synchronously on the calling thread. Handles are opened
//! per operation and closed on drop.

pub mod controller;
pub mod device;
pub mod hub;
pub mod matcher;
#[cfg(test)]
pub(crate) mod mock;
pub mod speed;
pub mod status;

// Re-export public types
pub use controller::{ControllerSettings, Mode, PortController};
pub use device::{DeviceSummary, HandleOf, UsbBus, UsbDevice, UsbHandle};
pub use matcher::find_device;
pub use status::AttachmentState;
