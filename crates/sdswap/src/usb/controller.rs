//! Port state transitions
//!
//! Moves the card between the host and the target:
//!
//! - **Host**: re-bind the kernel storage driver. Attach can time out while
//!   the link wakes up, so timeouts are retried within the attach budget.
//!   `NoDevice` during attach is success: the device re-enumerated under a
//!   new address once the port resumed, which invalidates our handle.
//! - **Target**: unbind the kernel driver, then suspend the device's port on
//!   its parent hub. SuperSpeed links go to U3 via PORT_LINK_STATE unless
//!   `exact` asks for the classic PORT_SUSPEND feature.
//!
//! Both directions are no-ops when the device is already on the requested
//! side. A failed suspend request leaves the driver unbound.

use super::device::{HandleOf, UsbBus, UsbDevice, UsbHandle};
use super::status::{self, AttachmentState, STORAGE_INTERFACE};
use super::{hub, speed};
use crate::error::{Result, SwapError};
use common::RetryPolicy;
use protocol::{CONTROL_TIMEOUT, SuspendMethod};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of kernel driver attach retries after the first attempt
pub const ATTACH_RETRIES: u32 = 5;

/// Requested side, or just a status read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Query,
    Host,
    Target,
}

/// Timing knobs for a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Attempt budget for kernel driver attach (timeouts only are retried)
    pub attach_retry: RetryPolicy,
    /// Timeout for the hub control request
    pub control_timeout: Duration,
}

impl ControllerSettings {
    /// Settings allowing `retries` attach retries after the first attempt
    pub fn new(retries: u32, retry_delay: Duration, control_timeout: Duration) -> Self {
        Self {
            attach_retry: RetryPolicy::new(retries.saturating_add(1), retry_delay),
            control_timeout,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::new(ATTACH_RETRIES, Duration::ZERO, CONTROL_TIMEOUT)
    }
}

/// Owns the open device handle for a single transition
pub struct PortController<'a, B: UsbBus> {
    bus: &'a B,
    device: &'a B::Device,
    handle: HandleOf<B>,
    settings: ControllerSettings,
}

impl<'a, B: UsbBus> PortController<'a, B> {
    /// Open `device` for a transition
    pub fn open(bus: &'a B, device: &'a B::Device, settings: ControllerSettings) -> Result<Self> {
        let handle = device.open().map_err(SwapError::DeviceOpenFailed)?;
        Ok(Self {
            bus,
            device,
            handle,
            settings,
        })
    }

    /// Perform `mode` and return the resulting attachment state
    ///
    /// Consumes the controller; the device handle and any hub handle are
    /// closed before this returns, on success and on error.
    pub fn transition(mut self, mode: Mode, exact: bool) -> Result<AttachmentState> {
        match mode {
            Mode::Query => status::query(&self.handle),
            Mode::Host => self.attach_to_host(),
            Mode::Target => self.attach_to_target(exact),
        }
    }

    fn attach_to_host(&mut self) -> Result<AttachmentState> {
        if status::query(&self.handle)? == AttachmentState::Host {
            info!("Already attached to host");
            return Ok(AttachmentState::Host);
        }

        let handle = &mut self.handle;
        let result = self.settings.attach_retry.run(
            |attempt| {
                debug!("Attaching kernel driver, attempt {}", attempt);
                handle.attach_kernel_driver(STORAGE_INTERFACE)
            },
            |e| matches!(e, rusb::Error::Timeout),
        );

        match result {
            Ok(()) => {
                info!("Kernel driver attached");
                Ok(AttachmentState::Host)
            }
            Err(rusb::Error::NoDevice) => {
                info!("Device re-enumerated while attaching, treating as attached");
                Ok(AttachmentState::Host)
            }
            Err(e) => Err(SwapError::DriverBindFailed(e)),
        }
    }

    fn attach_to_target(&mut self, exact: bool) -> Result<AttachmentState> {
        if status::query(&self.handle)? == AttachmentState::Target {
            info!("Already attached to target");
            return Ok(AttachmentState::Target);
        }

        self.handle
            .detach_kernel_driver(STORAGE_INTERFACE)
            .map_err(SwapError::DriverUnbindFailed)?;
        debug!("Kernel driver detached");

        let location = hub::locate_port(self.bus, self.device)?;
        let speed = speed::link_speed(self.device)?;
        let method = SuspendMethod::select(speed.is_superspeed(), exact);
        let request = method.request(location.port);

        debug!(
            "Suspending port {} with {:?}: request_type={:#x}, request={:#x}, value={:#x}, index={:#x}",
            location.port,
            method,
            request.request_type,
            request.request,
            request.value,
            request.index
        );

        location
            .hub
            .send_hub_request(&request, self.settings.control_timeout)
            .map_err(|e| {
                warn!("Port suspend failed, kernel driver remains detached");
                SwapError::TransferFailed(e)
            })?;

        info!("Port {} suspended", location.port);
        Ok(AttachmentState::Target)
    }
}
