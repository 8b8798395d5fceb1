//! Protocol library for sdswap
//!
//! Pure, I/O-free building blocks shared by the swap tool: the identifier
//! formats used to select a device, the device filter, the bcdUSB link speed
//! rule, and the hub class requests used to suspend a downstream port.
//!
//! # Example
//!
//! ```
//! use protocol::{DeviceFilter, SuspendMethod, parse_id, parse_path};
//!
//! let filter = DeviceFilter::new(parse_id("0bda:0316").unwrap())
//!     .with_path(parse_path("2-1.3").unwrap());
//! assert!(filter.path.as_ref().unwrap().matches(2, &[1, 3]));
//!
//! let request = SuspendMethod::select(true, false).request(3);
//! assert_eq!(request.port(), 3);
//! ```

pub mod error;
pub mod hub;
pub mod types;
pub mod version;

pub use error::{ProtocolError, Result};
pub use hub::{CONTROL_TIMEOUT, HubRequest, LinkState, PortFeature, SuspendMethod};
pub use types::{
    BusAddress, DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID, DeviceFilter, MAX_PORT_DEPTH, PortPath,
    UsbId, parse_bus_address, parse_id, parse_path,
};
pub use version::{LinkSpeed, SUPERSPEED_BCD, UsbVersion};
