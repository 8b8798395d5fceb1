//! Hub class port requests
//!
//! Port-level operations are addressed to the hub a device is plugged into,
//! never to the device itself. This module encodes the class-specific
//! `SET_FEATURE` requests used to suspend a downstream port, following the
//! USB 2.0 hub chapter (port feature selectors) and the USB 3.0 hub chapter
//! (PORT_LINK_STATE).

use std::time::Duration;

/// Timeout for hub control requests (5 seconds)
pub const CONTROL_TIMEOUT: Duration = Duration::from_millis(5000);

/// bmRequestType: host-to-device, class, recipient "other" (a hub port)
pub const PORT_REQUEST_TYPE: u8 = 0x23;

/// bRequest for SET_FEATURE
pub const REQUEST_SET_FEATURE: u8 = 0x03;

/// Port feature selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PortFeature {
    Connection = 0,
    Enable = 1,
    /// L2 suspend (USB 2.0)
    Suspend = 2,
    OverCurrent = 3,
    Reset = 4,
    /// L1 suspend (USB 2.0) and PORT_LINK_STATE (USB 3.0) share selector 5
    LinkState = 5,
    Power = 8,
    LowSpeed = 9,
    CConnection = 16,
    CEnable = 17,
    CSuspend = 18,
    COverCurrent = 19,
    CReset = 20,
    Test = 21,
    Indicator = 22,
    /// C_PORT_L1 (USB 2.0) and PORT_U1_TIMEOUT (USB 3.0) share selector 23
    U1Timeout = 23,
    U2Timeout = 24,
    CPortLinkState = 25,
    CPortConfigError = 26,
    RemoteWakeMask = 27,
    BhPortReset = 28,
    CBhPortReset = 29,
    ForceLinkPmAccept = 30,
}

impl PortFeature {
    pub fn selector(self) -> u16 {
        self as u16
    }
}

/// SuperSpeed port link states, encoded as in bits 5..8 of wPortStatus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum LinkState {
    U0 = 0x0000,
    U1 = 0x0020,
    U2 = 0x0040,
    /// Suspended
    U3 = 0x0060,
    SsDisabled = 0x0080,
    RxDetect = 0x00a0,
    SsInactive = 0x00c0,
    Polling = 0x00e0,
    Recovery = 0x0100,
    HotReset = 0x0120,
    ComplianceMode = 0x0140,
    Loopback = 0x0160,
}

impl LinkState {
    /// Status-field encoding of this state
    pub fn status_bits(self) -> u16 {
        self as u16
    }

    /// Link state number as carried in the upper byte of wIndex
    pub fn number(self) -> u8 {
        (self.status_bits() >> 5) as u8
    }
}

/// How a downstream port is put to sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendMethod {
    /// SET_FEATURE(PORT_LINK_STATE) with U3 (SuperSpeed hubs)
    LinkStateU3,
    /// SET_FEATURE(PORT_SUSPEND) (USB 2.0 hubs, or forced)
    PortSuspend,
}

impl SuspendMethod {
    /// Pick the suspend request for a device
    ///
    /// `exact` forces the classic suspend feature even on SuperSpeed links.
    pub fn select(superspeed: bool, exact: bool) -> Self {
        if superspeed && !exact {
            SuspendMethod::LinkStateU3
        } else {
            SuspendMethod::PortSuspend
        }
    }

    pub fn request(self, port: u8) -> HubRequest {
        match self {
            SuspendMethod::LinkStateU3 => HubRequest::set_port_link_state(port, LinkState::U3),
            SuspendMethod::PortSuspend => HubRequest::set_port_feature(port, PortFeature::Suspend),
        }
    }
}

/// A no-data control request addressed to a hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubRequest {
    pub request_type: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
}

impl HubRequest {
    /// SET_FEATURE(feature) on a downstream port
    pub fn set_port_feature(port: u8, feature: PortFeature) -> Self {
        Self::set_feature_raw(port as u16, feature)
    }

    /// SET_FEATURE(PORT_LINK_STATE) on a downstream port
    ///
    /// The port number sits in the low byte of wIndex and the requested link
    /// state number in the high byte.
    pub fn set_port_link_state(port: u8, state: LinkState) -> Self {
        Self::set_feature_raw(
            port as u16 | (state.status_bits() << 3),
            PortFeature::LinkState,
        )
    }

    fn set_feature_raw(index: u16, feature: PortFeature) -> Self {
        Self {
            request_type: PORT_REQUEST_TYPE,
            request: REQUEST_SET_FEATURE,
            value: feature.selector(),
            index,
        }
    }

    /// Port number targeted by this request
    pub fn port(&self) -> u8 {
        (self.index & 0xff) as u8
    }
}
