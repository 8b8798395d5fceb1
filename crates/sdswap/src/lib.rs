//! sdswap
//!
//! Hands a USB SD card reader over between the host and a target board. The
//! card is visible to the host while the kernel storage driver is bound; it
//! belongs to the target once the driver is unbound and the reader's port on
//! its parent hub is suspended.

pub mod app;
pub mod blockdev;
pub mod config;
pub mod error;
pub mod options;
pub mod usb;

pub use app::run;
pub use blockdev::{BlockDeviceError, BlockDeviceResolver, platform_resolver};
pub use config::SwapConfig;
pub use error::{Result, SwapError};
pub use options::SwapOptions;
pub use usb::{AttachmentState, Mode};
