//! Parent hub lookup
//!
//! Port features belong to the hub, so suspending a device means talking to
//! the hub one tier above it on the port the device occupies.

use super::device::{HandleOf, UsbBus, UsbDevice};
use crate::error::{Result, SwapError};
use tracing::debug;

/// Where a port request must be sent: an open hub and one of its ports
///
/// The hub handle is independent of the device's own handle and closes when
/// this value is dropped.
pub struct PortLocation<H> {
    pub hub: H,
    pub port: u8,
}

/// Resolve the upstream hub and port of `device`
pub fn locate_port<B: UsbBus>(bus: &B, device: &B::Device) -> Result<PortLocation<HandleOf<B>>> {
    let port = device.port_number();
    if port == 0 {
        return Err(SwapError::NoPortNumber);
    }

    let hub = open_parent(bus, device)?;
    debug!(
        "Device bus={}, addr={} sits on hub port {}",
        device.bus_number(),
        device.address(),
        port
    );

    Ok(PortLocation { hub, port })
}

/// Open the immediate upstream hub of `device`
pub fn open_parent<B: UsbBus>(bus: &B, device: &B::Device) -> Result<HandleOf<B>> {
    let parent = bus
        .parent_of(device)
        .map_err(SwapError::Enumeration)?
        .ok_or(SwapError::NoParent)?;

    debug!(
        "Opening parent hub bus={}, addr={}",
        parent.bus_number(),
        parent.address()
    );
    parent.open().map_err(SwapError::HubOpenFailed)
}
