//! Attachment state reporting
//!
//! Which side owns the card is never stored anywhere. It is read back from
//! the live device every time: a kernel driver bound to the storage
//! interface means the host has it.

use super::device::UsbHandle;
use crate::error::{Result, SwapError};
use std::fmt;

/// Interface carrying the mass storage function
pub const STORAGE_INTERFACE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentState {
    /// The host's storage driver is bound
    Host,
    /// No host driver; the downstream target owns the card
    Target,
}

impl fmt::Display for AttachmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentState::Host => write!(f, "attached to host"),
            AttachmentState::Target => write!(f, "attached to target"),
        }
    }
}

/// Read the current attachment state without changing anything
pub fn query<H: UsbHandle>(handle: &H) -> Result<AttachmentState> {
    let bound = handle
        .kernel_driver_active(STORAGE_INTERFACE)
        .map_err(SwapError::DriverQueryFailed)?;

    Ok(if bound {
        AttachmentState::Host
    } else {
        AttachmentState::Target
    })
}
