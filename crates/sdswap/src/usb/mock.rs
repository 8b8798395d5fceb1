//! In-memory USB bus for tests
//!
//! Devices are shared through `Rc`, so a test keeps a clone of each device it
//! builds and inspects the recorded driver state, hub requests and open/close
//! counters after the code under test has run.

use super::device::{DeviceSummary, UsbBus, UsbDevice, UsbHandle};
use protocol::{HubRequest, UsbVersion};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug)]
struct MockState {
    bus: u8,
    address: u8,
    ports: Vec<u8>,
    vendor_id: u16,
    product_id: u16,
    usb_version: u16,
    serial: Option<String>,
    parent: Option<MockDevice>,
    descriptor_error: Option<rusb::Error>,
    open_error: Option<rusb::Error>,
    serial_error: Option<rusb::Error>,
    port_numbers_error: Option<rusb::Error>,
    driver_query_error: Option<rusb::Error>,
    detach_error: Option<rusb::Error>,
    transfer_error: Option<rusb::Error>,
    driver_bound: Cell<bool>,
    attach_script: RefCell<VecDeque<rusb::Result<()>>>,
    attach_attempts: Cell<u32>,
    hub_requests: RefCell<Vec<(HubRequest, Duration)>>,
    opened: Cell<u32>,
    closed: Cell<u32>,
}

/// Builder for [`MockDevice`]
#[derive(Debug)]
pub struct MockDeviceBuilder {
    state: MockState,
}

impl MockDeviceBuilder {
    pub fn address(mut self, address: u8) -> Self {
        self.state.address = address;
        self
    }

    pub fn id(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.state.vendor_id = vendor_id;
        self.state.product_id = product_id;
        self
    }

    pub fn usb_version(mut self, bcd: u16) -> Self {
        self.state.usb_version = bcd;
        self
    }

    pub fn serial(mut self, serial: &str) -> Self {
        self.state.serial = Some(serial.to_string());
        self
    }

    pub fn parent(mut self, parent: &MockDevice) -> Self {
        self.state.parent = Some(parent.clone());
        self
    }

    pub fn driver_bound(self, bound: bool) -> Self {
        self.state.driver_bound.set(bound);
        self
    }

    /// Results returned by successive attach calls; `Ok` once exhausted
    pub fn attach_results(self, results: Vec<rusb::Result<()>>) -> Self {
        *self.state.attach_script.borrow_mut() = results.into();
        self
    }

    pub fn descriptor_error(mut self, e: rusb::Error) -> Self {
        self.state.descriptor_error = Some(e);
        self
    }

    pub fn open_error(mut self, e: rusb::Error) -> Self {
        self.state.open_error = Some(e);
        self
    }

    pub fn serial_error(mut self, e: rusb::Error) -> Self {
        self.state.serial_error = Some(e);
        self
    }

    pub fn port_numbers_error(mut self, e: rusb::Error) -> Self {
        self.state.port_numbers_error = Some(e);
        self
    }

    pub fn driver_query_error(mut self, e: rusb::Error) -> Self {
        self.state.driver_query_error = Some(e);
        self
    }

    pub fn detach_error(mut self, e: rusb::Error) -> Self {
        self.state.detach_error = Some(e);
        self
    }

    pub fn transfer_error(mut self, e: rusb::Error) -> Self {
        self.state.transfer_error = Some(e);
        self
    }

    pub fn build(self) -> MockDevice {
        MockDevice(Rc::new(self.state))
    }
}

#[derive(Debug, Clone)]
pub struct MockDevice(Rc<MockState>);

impl MockDevice {
    /// Start a device at `bus` / `ports`, with the default SD swap identity,
    /// USB 2.1 and the kernel driver bound
    pub fn builder(bus: u8, ports: &[u8]) -> MockDeviceBuilder {
        MockDeviceBuilder {
            state: MockState {
                bus,
                address: ports.last().copied().unwrap_or(1),
                ports: ports.to_vec(),
                vendor_id: protocol::DEFAULT_VENDOR_ID,
                product_id: protocol::DEFAULT_PRODUCT_ID,
                usb_version: 0x0210,
                serial: None,
                parent: None,
                descriptor_error: None,
                open_error: None,
                serial_error: None,
                port_numbers_error: None,
                driver_query_error: None,
                detach_error: None,
                transfer_error: None,
                driver_bound: Cell::new(true),
                attach_script: RefCell::new(VecDeque::new()),
                attach_attempts: Cell::new(0),
                hub_requests: RefCell::new(Vec::new()),
                opened: Cell::new(0),
                closed: Cell::new(0),
            },
        }
    }

    /// A hub at `bus` / `ports`
    pub fn hub(bus: u8, ports: &[u8]) -> MockDevice {
        Self::builder(bus, ports).id(0x05e3, 0x0610).build()
    }

    pub fn is_driver_bound(&self) -> bool {
        self.0.driver_bound.get()
    }

    pub fn attach_attempts(&self) -> u32 {
        self.0.attach_attempts.get()
    }

    pub fn hub_requests(&self) -> Vec<HubRequest> {
        self.0.hub_requests.borrow().iter().map(|(r, _)| *r).collect()
    }

    pub fn hub_request_timeouts(&self) -> Vec<Duration> {
        self.0.hub_requests.borrow().iter().map(|(_, t)| *t).collect()
    }

    pub fn times_opened(&self) -> u32 {
        self.0.opened.get()
    }

    /// No handle is left open
    pub fn all_handles_closed(&self) -> bool {
        self.0.opened.get() == self.0.closed.get()
    }

    pub fn same_device(&self, other: &MockDevice) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl UsbDevice for MockDevice {
    type Handle = MockHandle;

    fn summary(&self) -> rusb::Result<DeviceSummary> {
        if let Some(e) = self.0.descriptor_error {
            return Err(e);
        }
        Ok(DeviceSummary {
            vendor_id: self.0.vendor_id,
            product_id: self.0.product_id,
            usb_version: UsbVersion(self.0.usb_version),
            serial_index: self.0.serial.as_ref().map(|_| 3),
        })
    }

    fn bus_number(&self) -> u8 {
        self.0.bus
    }

    fn address(&self) -> u8 {
        self.0.address
    }

    fn port_number(&self) -> u8 {
        self.0.ports.last().copied().unwrap_or(0)
    }

    fn port_numbers(&self) -> rusb::Result<Vec<u8>> {
        match self.0.port_numbers_error {
            Some(e) => Err(e),
            None => Ok(self.0.ports.clone()),
        }
    }

    fn open(&self) -> rusb::Result<MockHandle> {
        if let Some(e) = self.0.open_error {
            return Err(e);
        }
        self.0.opened.set(self.0.opened.get() + 1);
        Ok(MockHandle {
            device: self.clone(),
        })
    }
}

#[derive(Debug)]
pub struct MockHandle {
    device: MockDevice,
}

impl MockHandle {
    fn state(&self) -> &MockState {
        &self.device.0
    }
}

impl UsbHandle for MockHandle {
    fn read_string(&self, index: u8) -> rusb::Result<String> {
        if let Some(e) = self.state().serial_error {
            return Err(e);
        }
        match (&self.state().serial, index) {
            (Some(serial), 3) => Ok(serial.clone()),
            _ => Err(rusb::Error::InvalidParam),
        }
    }

    fn kernel_driver_active(&self, interface: u8) -> rusb::Result<bool> {
        assert_eq!(interface, 0, "only the storage interface is inspected");
        match self.state().driver_query_error {
            Some(e) => Err(e),
            None => Ok(self.state().driver_bound.get()),
        }
    }

    fn attach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        let state = self.state();
        state.attach_attempts.set(state.attach_attempts.get() + 1);
        let result = state.attach_script.borrow_mut().pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.driver_bound.set(true);
        }
        result
    }

    fn detach_kernel_driver(&mut self, _interface: u8) -> rusb::Result<()> {
        if let Some(e) = self.state().detach_error {
            return Err(e);
        }
        self.state().driver_bound.set(false);
        Ok(())
    }

    fn send_hub_request(&self, request: &HubRequest, timeout: Duration) -> rusb::Result<()> {
        self.state()
            .hub_requests
            .borrow_mut()
            .push((*request, timeout));
        match self.state().transfer_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        let closed = &self.state().closed;
        closed.set(closed.get() + 1);
    }
}

/// A bus holding a fixed set of devices
#[derive(Debug, Default)]
pub struct MockBus {
    devices: Vec<MockDevice>,
    enumeration_error: Option<rusb::Error>,
}

impl MockBus {
    pub fn new(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            enumeration_error: None,
        }
    }

    pub fn failing(e: rusb::Error) -> Self {
        Self {
            devices: Vec::new(),
            enumeration_error: Some(e),
        }
    }
}

impl UsbBus for MockBus {
    type Device = MockDevice;

    fn list_devices(&self) -> rusb::Result<Vec<MockDevice>> {
        match self.enumeration_error {
            Some(e) => Err(e),
            None => Ok(self.devices.clone()),
        }
    }

    fn parent_of(&self, device: &MockDevice) -> rusb::Result<Option<MockDevice>> {
        if let Some(e) = self.enumeration_error {
            return Err(e);
        }
        Ok(device.0.parent.clone())
    }
}
