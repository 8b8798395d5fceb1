//! Device selection
//!
//! Scans every attached device and applies the [`DeviceFilter`] in a fixed
//! order, cheapest checks first:
//!
//! 1. vendor/product identity (descriptor)
//! 2. bus + address (enumeration metadata)
//! 3. topological path (enumeration metadata)
//! 4. serial number (requires opening the device)
//!
//! Exactly one device must survive. Zero is `NotFound`; a second candidate
//! aborts the scan with `MultipleMatches`.

use super::device::{UsbBus, UsbDevice, UsbHandle};
use crate::error::{Result, SwapError};
use protocol::DeviceFilter;
use tracing::{debug, trace};

/// Find the single device satisfying `filter`
///
/// Descriptor, port chain and serial read failures abort the whole scan
/// rather than skipping the device, since a partial view of the bus could
/// hide a second match.
pub fn find_device<B: UsbBus>(bus: &B, filter: &DeviceFilter) -> Result<B::Device> {
    let devices = bus.list_devices().map_err(SwapError::Enumeration)?;
    debug!("Scanning {} USB devices for {}", devices.len(), filter.id);

    let mut found: Option<B::Device> = None;

    for device in devices {
        if !matches_filter(&device, filter)? {
            continue;
        }

        if found.is_some() {
            debug!(
                "Second candidate at bus={}, addr={}",
                device.bus_number(),
                device.address()
            );
            return Err(SwapError::MultipleMatches);
        }

        debug!(
            "Candidate at bus={}, addr={}",
            device.bus_number(),
            device.address()
        );
        found = Some(device);
    }

    found.ok_or(SwapError::NotFound)
}

fn matches_filter<D: UsbDevice>(device: &D, filter: &DeviceFilter) -> Result<bool> {
    let summary = device.summary().map_err(SwapError::DescriptorReadFailed)?;
    let (bus, address) = (device.bus_number(), device.address());

    if !filter.id.matches(summary.vendor_id, summary.product_id) {
        return Ok(false);
    }

    if !filter.matches_bus_address(bus, address) {
        trace!("bus={}, addr={}: address mismatch", bus, address);
        return Ok(false);
    }

    if let Some(path) = filter.path() {
        if path.bus != bus {
            trace!("bus={}, addr={}: bus mismatch for {}", bus, address, path);
            return Ok(false);
        }
        let ports = device
            .port_numbers()
            .map_err(SwapError::PortNumbersFailed)?;
        if !path.matches(bus, &ports) {
            trace!("bus={}, addr={}: path mismatch for {}", bus, address, path);
            return Ok(false);
        }
    }

    if filter.serial.is_some() {
        // Without a serial descriptor the device cannot match
        let Some(index) = summary.serial_index else {
            trace!("bus={}, addr={}: no serial number", bus, address);
            return Ok(false);
        };
        let serial = read_serial(device, index)?;
        if !filter.matches_serial(&serial) {
            trace!("bus={}, addr={}: serial {:?} mismatch", bus, address, serial);
            return Ok(false);
        }
    }

    Ok(true)
}

fn read_serial<D: UsbDevice>(device: &D, index: u8) -> Result<String> {
    let handle = device.open().map_err(SwapError::DeviceOpenFailed)?;
    handle.read_string(index).map_err(SwapError::SerialReadFailed)
}
