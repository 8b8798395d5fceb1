//! USB specification release (bcdUSB) handling

/// bcdUSB of the first SuperSpeed release (USB 3.00)
pub const SUPERSPEED_BCD: u16 = 0x0300;

/// USB specification release number as reported in the device descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UsbVersion(pub u16);

impl UsbVersion {
    /// Build from binary-coded decimal parts (major may be two digits)
    pub fn from_parts(major: u8, minor: u8, sub_minor: u8) -> Self {
        let major = major as u16;
        let bcd = ((major / 10) << 12)
            | ((major % 10) << 8)
            | (((minor & 0x0f) as u16) << 4)
            | (sub_minor & 0x0f) as u16;
        Self(bcd)
    }

    pub fn link_speed(&self) -> LinkSpeed {
        LinkSpeed::from_bcd(self.0)
    }
}

impl std::fmt::Display for UsbVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}.{:02x}", self.0 >> 8, self.0 & 0xff)
    }
}

/// Signalling family negotiated by a device, as far as port suspend cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSpeed {
    /// USB 3.x and later: suspended through the U3 link state
    SuperSpeed,
    /// USB 2.x and earlier: suspended through PORT_SUSPEND
    HighSpeedOrBelow,
}

impl LinkSpeed {
    pub fn from_bcd(bcd_usb: u16) -> Self {
        if bcd_usb >= SUPERSPEED_BCD {
            LinkSpeed::SuperSpeed
        } else {
            LinkSpeed::HighSpeedOrBelow
        }
    }

    pub fn is_superspeed(&self) -> bool {
        matches!(self, LinkSpeed::SuperSpeed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_speed_classification() {
        assert_eq!(LinkSpeed::from_bcd(0x0110), LinkSpeed::HighSpeedOrBelow);
        assert_eq!(LinkSpeed::from_bcd(0x0200), LinkSpeed::HighSpeedOrBelow);
        assert_eq!(LinkSpeed::from_bcd(0x0210), LinkSpeed::HighSpeedOrBelow);
        assert_eq!(LinkSpeed::from_bcd(0x0300), LinkSpeed::SuperSpeed);
        assert_eq!(LinkSpeed::from_bcd(0x0320), LinkSpeed::SuperSpeed);
        assert!(UsbVersion(0x0310).link_speed().is_superspeed());
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(UsbVersion::from_parts(2, 1, 0), UsbVersion(0x0210));
        assert_eq!(UsbVersion::from_parts(3, 2, 0), UsbVersion(0x0320));
        assert_eq!(UsbVersion::from_parts(10, 0, 0), UsbVersion(0x1000));
    }

    #[test]
    fn test_display() {
        assert_eq!(UsbVersion(0x0210).to_string(), "2.10");
        assert_eq!(UsbVersion(0x0300).to_string(), "3.00");
    }
}
