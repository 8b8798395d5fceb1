//! Device location and selection types
//!
//! This module defines the three identifier formats an operator can use to
//! point at a device (vendor:product identity, bus-address pair and
//! topological port path), their parsers, and the [`DeviceFilter`] that
//! combines them into one selection.
//!
//! All parsers are pure: they never touch the USB bus.

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum hub depth of a USB topology (root port plus six tiers of hubs)
pub const MAX_PORT_DEPTH: usize = 7;

/// Vendor ID of the SD swap device family
pub const DEFAULT_VENDOR_ID: u16 = 0x0bda;

/// Product ID of the SD swap device family
pub const DEFAULT_PRODUCT_ID: u16 = 0x0316;

const ID_FORMAT: &str = "1234:5678";
const BUS_ADDRESS_FORMAT: &str = "1-2";
const PATH_FORMAT: &str = "1-2.1";

/// USB vendor/product identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsbId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl UsbId {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Check a descriptor's identity against this one
    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }
}

impl Default for UsbId {
    fn default() -> Self {
        Self::new(DEFAULT_VENDOR_ID, DEFAULT_PRODUCT_ID)
    }
}

/// Current bus number and device address of a device
///
/// Addresses are reassigned on every enumeration, so this only identifies a
/// device until it is replugged or re-enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BusAddress {
    pub bus: u8,
    pub address: u8,
}

impl BusAddress {
    pub const fn new(bus: u8, address: u8) -> Self {
        Self { bus, address }
    }

    pub fn matches(&self, bus: u8, address: u8) -> bool {
        self.bus == bus && self.address == address
    }
}

/// Physical location of a device: bus number plus the hub port chain from
/// the root hub (for example "3-1.4")
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PortPath {
    pub bus: u8,
    pub ports: Vec<u8>,
}

impl PortPath {
    pub fn new(bus: u8, ports: Vec<u8>) -> Self {
        Self { bus, ports }
    }

    /// Check a device's bus number and port chain against this path
    ///
    /// Both chains must have the same length; a hub upstream of the device is
    /// not a match.
    pub fn matches(&self, bus: u8, ports: &[u8]) -> bool {
        self.bus == bus && self.ports == ports
    }

    /// Depth of the device in the topology (number of ports)
    pub fn depth(&self) -> usize {
        self.ports.len()
    }
}

impl fmt::Display for UsbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.bus, self.address)
    }
}

impl fmt::Display for PortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bus)?;
        for (index, port) in self.ports.iter().enumerate() {
            if index == 0 {
                write!(f, "-")?;
            } else {
                write!(f, ".")?;
            }
            write!(f, "{}", port)?;
        }
        Ok(())
    }
}

impl fmt::Debug for PortPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

/// Parse a `VVVV:PPPP` vendor/product pair (four hex digits each, non-zero)
pub fn parse_id(text: &str) -> Result<UsbId> {
    let invalid = || ProtocolError::invalid(text, ID_FORMAT);

    let (vendor, product) = text.split_once(':').ok_or_else(invalid)?;
    if vendor.len() != 4 || product.len() != 4 {
        return Err(invalid());
    }

    let vendor_id = parse_hex_id(vendor).ok_or_else(invalid)?;
    let product_id = parse_hex_id(product).ok_or_else(invalid)?;

    Ok(UsbId::new(vendor_id, product_id))
}

/// Parse a `BUS-ADDRESS` pair, both decimal in 1..=255
pub fn parse_bus_address(text: &str) -> Result<BusAddress> {
    let invalid = || ProtocolError::invalid(text, BUS_ADDRESS_FORMAT);

    let (bus, address) = text.split_once('-').ok_or_else(invalid)?;
    let bus = parse_decimal_id(bus).ok_or_else(invalid)?;
    let address = parse_decimal_id(address).ok_or_else(invalid)?;

    Ok(BusAddress::new(bus, address))
}

/// Parse a `BUS-P1.P2...` topological path
///
/// The bus and every port are decimal in 1..=255, with at most
/// [`MAX_PORT_DEPTH`] ports.
pub fn parse_path(text: &str) -> Result<PortPath> {
    let invalid = || ProtocolError::invalid(text, PATH_FORMAT);

    let (bus, chain) = text.split_once('-').ok_or_else(invalid)?;
    let bus = parse_decimal_id(bus).ok_or_else(invalid)?;

    let mut ports = Vec::with_capacity(MAX_PORT_DEPTH);
    for item in chain.split('.') {
        if ports.len() == MAX_PORT_DEPTH {
            return Err(invalid());
        }
        ports.push(parse_decimal_id(item).ok_or_else(invalid)?);
    }

    Ok(PortPath::new(bus, ports))
}

/// Four-digit hex value, zero rejected
fn parse_hex_id(text: &str) -> Option<u16> {
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u16::from_str_radix(text, 16).ok().filter(|v| *v != 0)
}

/// Decimal value in 1..=255; zero means "unset" elsewhere so it is rejected
fn parse_decimal_id(text: &str) -> Option<u8> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u8>().ok().filter(|v| *v != 0)
}

macro_rules! impl_text_conversions {
    ($ty:ty, $parse:path) => {
        impl FromStr for $ty {
            type Err = ProtocolError;

            fn from_str(s: &str) -> Result<Self> {
                $parse(s)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ProtocolError;

            fn try_from(value: String) -> Result<Self> {
                $parse(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.to_string()
            }
        }
    };
}

impl_text_conversions!(UsbId, parse_id);
impl_text_conversions!(BusAddress, parse_bus_address);
impl_text_conversions!(PortPath, parse_path);

/// Operator's device selection criteria
///
/// The identity is always checked. Bus/address, path and serial are only
/// checked when set. At most one attached device may satisfy the whole
/// filter; resolving zero or several is the caller's error to report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    pub id: UsbId,
    pub bus_address: Option<BusAddress>,
    pub path: Option<PortPath>,
    pub serial: Option<String>,
}

impl DeviceFilter {
    pub fn new(id: UsbId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn with_bus_address(mut self, bus_address: BusAddress) -> Self {
        self.bus_address = Some(bus_address);
        self
    }

    pub fn with_path(mut self, path: PortPath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    /// Requested bus/address; a zero bus or address means none
    pub fn bus_address(&self) -> Option<BusAddress> {
        self.bus_address
            .filter(|wanted| wanted.bus != 0 && wanted.address != 0)
    }

    /// Requested topological path; an empty port chain means none
    pub fn path(&self) -> Option<&PortPath> {
        self.path.as_ref().filter(|wanted| !wanted.ports.is_empty())
    }

    /// Bus/address check; passes when no bus/address was requested
    pub fn matches_bus_address(&self, bus: u8, address: u8) -> bool {
        self.bus_address()
            .is_none_or(|wanted| wanted.matches(bus, address))
    }

    /// Serial check; passes when no serial was requested
    pub fn matches_serial(&self, serial: &str) -> bool {
        self.serial.as_deref().is_none_or(|wanted| wanted == serial)
    }
}
