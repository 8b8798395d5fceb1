//! Block device lookup
//!
//! Once the host owns the card, the kernel exposes it as a disk node. The
//! lookup goes through the device's topological path rather than its address,
//! because the device may come back under a new address after a port resume.
//!
//! On Linux the udev database is queried for `block` disks whose nearest
//! `usb_device` ancestor is named after the path (`<bus>-<ports>`).

use common::RetryPolicy;
use protocol::PortPath;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockDeviceError {
    #[error("block device for {0} is not available yet")]
    NotAvailable(PortPath),

    #[error("block device lookup is not supported on this platform")]
    Unsupported,

    #[error("udev query failed: {0}")]
    Udev(#[source] io::Error),
}

/// Maps a device location to its block device node
pub trait BlockDeviceResolver {
    /// `Ok(None)` when the device has no block device (yet)
    fn resolve(&self, location: &PortPath) -> Result<Option<PathBuf>, BlockDeviceError>;
}

/// Resolver backed by the udev device database
#[cfg(target_os = "linux")]
#[derive(Debug, Clone, Copy, Default)]
pub struct UdevResolver;

#[cfg(target_os = "linux")]
impl BlockDeviceResolver for UdevResolver {
    fn resolve(&self, location: &PortPath) -> Result<Option<PathBuf>, BlockDeviceError> {
        let mut enumerator = udev::Enumerator::new().map_err(BlockDeviceError::Udev)?;
        enumerator
            .match_subsystem("block")
            .map_err(BlockDeviceError::Udev)?;
        enumerator
            .match_property("DEVTYPE", "disk")
            .map_err(BlockDeviceError::Udev)?;

        for disk in enumerator.scan_devices().map_err(BlockDeviceError::Udev)? {
            let Some(usb_device) = disk
                .parent_with_subsystem_devtype("usb", "usb_device")
                .map_err(BlockDeviceError::Udev)?
            else {
                continue;
            };

            if !is_location(location, usb_device.sysname()) {
                continue;
            }

            if let Some(node) = disk.devnode() {
                tracing::debug!("{} has block device {}", location, node.display());
                return Ok(Some(node.to_path_buf()));
            }
        }

        Ok(None)
    }
}

/// Whether a udev `usb_device` sysname names `location`
#[cfg(target_os = "linux")]
fn is_location(location: &PortPath, sysname: &std::ffi::OsStr) -> bool {
    sysname
        .to_str()
        .and_then(|name| protocol::parse_path(name).ok())
        .is_some_and(|path| path == *location)
}

/// Resolver for platforms without a supported lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedResolver;

impl BlockDeviceResolver for UnsupportedResolver {
    fn resolve(&self, _location: &PortPath) -> Result<Option<PathBuf>, BlockDeviceError> {
        Err(BlockDeviceError::Unsupported)
    }
}

/// The resolver for the running platform
pub fn platform_resolver() -> Box<dyn BlockDeviceResolver> {
    #[cfg(target_os = "linux")]
    {
        Box::new(UdevResolver)
    }
    #[cfg(not(target_os = "linux"))]
    {
        Box::new(UnsupportedResolver)
    }
}

/// Resolve `location`, polling within `policy` while the node is missing
pub fn wait_for_block_device(
    resolver: &dyn BlockDeviceResolver,
    location: &PortPath,
    policy: &RetryPolicy,
) -> Result<PathBuf, BlockDeviceError> {
    policy.run(
        |_| {
            resolver
                .resolve(location)?
                .ok_or_else(|| BlockDeviceError::NotAvailable(location.clone()))
        },
        |e| matches!(e, BlockDeviceError::NotAvailable(_)),
    )
}
