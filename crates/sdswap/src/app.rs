//! One sdswap invocation: select, transition, report

use crate::blockdev::{self, BlockDeviceResolver};
use crate::error::{Result, SwapError};
use crate::options::SwapOptions;
use crate::usb::{PortController, UsbBus, UsbDevice, find_device};
use protocol::PortPath;
use std::io::Write;
use tracing::debug;

/// Run the operation described by `options` against `bus`
///
/// Writes the status line and, when requested, the block device path to
/// `out`. Every handle opened along the way is closed before returning.
pub fn run<B: UsbBus>(
    bus: &B,
    options: &SwapOptions,
    resolver: &dyn BlockDeviceResolver,
    out: &mut dyn Write,
) -> Result<()> {
    let device = find_device(bus, &options.filter)?;

    // The address may change once the host re-enumerates the device, the
    // port path does not.
    let location = if options.print_block_device {
        Some(port_path(&device)?)
    } else {
        None
    };

    if options.reports_status() {
        let state = PortController::open(bus, &device, options.controller)?
            .transition(options.mode, options.exact)?;
        writeln!(out, "Device is {}.", state)?;
    }

    if let Some(location) = location {
        debug!("Looking up block device for {}", location);
        let node =
            blockdev::wait_for_block_device(resolver, &location, &options.block_device_policy())?;
        writeln!(out, "{}", node.display())?;
    }

    Ok(())
}

fn port_path<D: UsbDevice>(device: &D) -> Result<PortPath> {
    let ports = device
        .port_numbers()
        .map_err(SwapError::PortNumbersFailed)?;
    Ok(PortPath::new(device.bus_number(), ports))
}
