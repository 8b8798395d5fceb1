//! Link speed classification

use super::device::UsbDevice;
use crate::error::{Result, SwapError};
use protocol::LinkSpeed;
use tracing::debug;

/// Classify `device` as SuperSpeed (bcdUSB >= 3.00) or slower
pub fn link_speed<D: UsbDevice>(device: &D) -> Result<LinkSpeed> {
    let summary = device.summary().map_err(SwapError::DescriptorReadFailed)?;
    let speed = summary.usb_version.link_speed();
    debug!("USB {} device, {:?}", summary.usb_version, speed);
    Ok(speed)
}
