//! Resolved run options
//!
//! Built once from the configuration file and the command line, then passed
//! by reference into every operation. Nothing mutates it afterwards.

use crate::config::SwapConfig;
use crate::usb::{ControllerSettings, Mode};
use common::RetryPolicy;
use protocol::DeviceFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOptions {
    pub filter: DeviceFilter,
    pub mode: Mode,
    /// Use PORT_SUSPEND even on SuperSpeed links
    pub exact: bool,
    /// Print the block device node after the transition
    pub print_block_device: bool,
    pub controller: ControllerSettings,
    /// Polling budget for the block device after switching to host
    pub block_device_wait: RetryPolicy,
}

impl SwapOptions {
    /// Options for a status query using the configured defaults
    pub fn from_config(config: &SwapConfig) -> Self {
        let device = &config.device;
        let mut filter = DeviceFilter::new(device.id);
        filter.bus_address = device.address;
        filter.path = device.location.clone();
        filter.serial = device.serial.clone();

        Self {
            filter,
            mode: Mode::Query,
            exact: device.exact,
            print_block_device: false,
            controller: ControllerSettings::new(
                config.transfer.attach_retries,
                config.transfer.attach_retry_delay(),
                config.transfer.control_timeout(),
            ),
            block_device_wait: RetryPolicy::polling(
                config.block_device.wait_timeout(),
                config.block_device.poll_interval(),
            ),
        }
    }

    /// Retry budget for the block device lookup
    ///
    /// Only a switch to host waits for the disk to show up.
    pub fn block_device_policy(&self) -> RetryPolicy {
        if self.mode == Mode::Host {
            self.block_device_wait
        } else {
            RetryPolicy::single()
        }
    }

    /// Whether the attachment state is reported
    ///
    /// A plain `--print` only prints the block device.
    pub fn reports_status(&self) -> bool {
        !(self.print_block_device && self.mode == Mode::Query)
    }
}

impl Default for SwapOptions {
    fn default() -> Self {
        Self::from_config(&SwapConfig::default())
    }
}
