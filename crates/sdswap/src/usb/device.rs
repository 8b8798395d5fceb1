//! USB device abstraction
//!
//! The swap logic only needs a handful of operations from the USB stack:
//! enumerate, read descriptors and topology, open, toggle the kernel driver
//! and send a control request. They are expressed as traits here so the
//! matcher and port controller run unchanged against `rusb` in production
//! and against an in-memory bus in tests.
//!
//! Handles close when dropped, so every early return releases them.

use protocol::{HubRequest, UsbVersion};
use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::trace;

/// Identity fields read from a device descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSummary {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usb_version: UsbVersion,
    pub serial_index: Option<u8>,
}

/// Process-wide view of the attached devices
pub trait UsbBus {
    type Device: UsbDevice;

    /// Snapshot of every device currently attached
    fn list_devices(&self) -> rusb::Result<Vec<Self::Device>>;

    /// Upstream hub of `device`, if the platform exposes one
    fn parent_of(&self, device: &Self::Device) -> rusb::Result<Option<Self::Device>>;
}

/// An enumerated device; cheap to clone (reference counted)
pub trait UsbDevice: Clone {
    type Handle: UsbHandle;

    fn summary(&self) -> rusb::Result<DeviceSummary>;
    fn bus_number(&self) -> u8;
    fn address(&self) -> u8;
    /// Port on the parent hub, 0 when unknown
    fn port_number(&self) -> u8;
    /// Port chain from the root hub
    fn port_numbers(&self) -> rusb::Result<Vec<u8>>;
    fn open(&self) -> rusb::Result<Self::Handle>;
}

/// An open device; closed on drop
pub trait UsbHandle {
    fn read_string(&self, index: u8) -> rusb::Result<String>;
    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool>;
    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()>;
    fn send_hub_request(&self, request: &HubRequest, timeout: Duration) -> rusb::Result<()>;
}

/// Handle type produced by a bus's devices
pub type HandleOf<B> = <<B as UsbBus>::Device as UsbDevice>::Handle;

impl UsbBus for Context {
    type Device = Device<Context>;

    fn list_devices(&self) -> rusb::Result<Vec<Self::Device>> {
        let devices = UsbContext::devices(self)?;
        Ok(devices.iter().collect())
    }

    fn parent_of(&self, device: &Self::Device) -> rusb::Result<Option<Self::Device>> {
        // libusb only resolves parents while a device list is alive
        let _devices = UsbContext::devices(self)?;
        Ok(device.get_parent())
    }
}

impl<T: UsbContext> UsbDevice for Device<T> {
    type Handle = DeviceHandle<T>;

    fn summary(&self) -> rusb::Result<DeviceSummary> {
        let descriptor = self.device_descriptor()?;
        let version = descriptor.usb_version();

        Ok(DeviceSummary {
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            usb_version: UsbVersion::from_parts(
                version.major(),
                version.minor(),
                version.sub_minor(),
            ),
            serial_index: descriptor.serial_number_string_index(),
        })
    }

    fn bus_number(&self) -> u8 {
        Device::bus_number(self)
    }

    fn address(&self) -> u8 {
        Device::address(self)
    }

    fn port_number(&self) -> u8 {
        Device::port_number(self)
    }

    fn port_numbers(&self) -> rusb::Result<Vec<u8>> {
        Device::port_numbers(self)
    }

    fn open(&self) -> rusb::Result<Self::Handle> {
        let handle = Device::open(self)?;
        trace!(
            "Opened device bus={}, addr={}",
            Device::bus_number(self),
            Device::address(self)
        );
        Ok(handle)
    }
}

impl<T: UsbContext> UsbHandle for DeviceHandle<T> {
    fn read_string(&self, index: u8) -> rusb::Result<String> {
        self.read_string_descriptor_ascii(index)
    }

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn attach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::attach_kernel_driver(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> rusb::Result<()> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn send_hub_request(&self, request: &HubRequest, timeout: Duration) -> rusb::Result<()> {
        self.write_control(
            request.request_type,
            request.request,
            request.value,
            request.index,
            &[],
            timeout,
        )
        .map(|_| ())
    }
}
