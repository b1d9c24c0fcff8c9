//! Commands and the fixed-layout records carried in FujiNet responses.

use core::fmt;

use snafu::{ensure, Snafu};

use crate::nom_parser::records;
use crate::wire;

/// Number of host slots in a get-hosts response.
pub const HOST_SLOT_COUNT: usize = 8;
/// Width of one host slot record.
pub const HOST_SLOT_LEN: usize = 32;
/// Number of device slots in a get-device-slots response.
pub const DEVICE_SLOT_COUNT: usize = 8;
/// Width of one device slot record: host slot, mode, filename.
pub const DEVICE_SLOT_LEN: usize = 38;
/// Width of the filename field in a device slot record.
pub const FILENAME_LEN: usize = 36;

/// Length of a get-SSID payload.
pub const SSID_PAYLOAD_LEN: usize = wire::GET_SSID_RESPONSE_LEN - wire::RESPONSE_OVERHEAD;
/// Length of a get-hosts payload.
pub const HOSTS_PAYLOAD_LEN: usize = wire::GET_HOSTS_RESPONSE_LEN - wire::RESPONSE_OVERHEAD;
/// Length of a get-device-slots payload.
pub const DEVICE_SLOTS_PAYLOAD_LEN: usize =
    wire::GET_DEVICE_SLOTS_RESPONSE_LEN - wire::RESPONSE_OVERHEAD;

/// Error type for this module
#[derive(Debug, Snafu, PartialEq)]
#[non_exhaustive]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The slice doesn't match the fixed record layout of the decoder.
    #[snafu(display("Payload is {} bytes, the record layout needs {}", len, expected))]
    PayloadLength { len: usize, expected: usize },
    /// The response answers a different command than the decoder expects.
    #[snafu(display("Response belongs to a different command"))]
    CommandMismatch,
    /// The response failed protocol or checksum validation.
    #[snafu(display("Invalid response"))]
    InvalidResponse,
}

/// The FujiNet commands understood by this crate.
///
/// Each command is a complete half-duplex transaction: a 7-byte request
/// frame out, then a fixed-length response back, except [`Reset`], which
/// is fire-and-forget.
///
/// [`Reset`]: Command::Reset
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum Command {
    /// Reboot the peripheral. No response is sent.
    Reset,
    /// Read the current wifi SSID block.
    GetSsid,
    /// Read the eight TNFS host slots.
    GetHosts,
    /// Read the eight mounted device slots.
    GetDeviceSlots,
}

impl Command {
    /// The command byte as it appears in the request frame.
    pub const fn code(self) -> u8 {
        match self {
            Command::Reset => wire::CMD_RESET,
            Command::GetSsid => wire::CMD_GET_SSID,
            Command::GetHosts => wire::CMD_GET_HOSTS,
            Command::GetDeviceSlots => wire::CMD_GET_DEVICE_SLOTS,
        }
    }

    /// Total response length on the wire, or `None` for fire-and-forget
    /// commands.
    pub const fn response_len(self) -> Option<usize> {
        match self {
            Command::Reset => None,
            Command::GetSsid => Some(wire::GET_SSID_RESPONSE_LEN),
            Command::GetHosts => Some(wire::GET_HOSTS_RESPONSE_LEN),
            Command::GetDeviceSlots => Some(wire::GET_DEVICE_SLOTS_RESPONSE_LEN),
        }
    }

    /// Payload length inside the response: the total minus the status
    /// prefix and the trailing checksum.
    pub const fn payload_len(self) -> Option<usize> {
        match self.response_len() {
            Some(len) => Some(len - wire::RESPONSE_OVERHEAD),
            None => None,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Command> {
        match code {
            wire::CMD_RESET => Some(Command::Reset),
            wire::CMD_GET_SSID => Some(Command::GetSsid),
            wire::CMD_GET_HOSTS => Some(Command::GetHosts),
            wire::CMD_GET_DEVICE_SLOTS => Some(Command::GetDeviceSlots),
            _ => None,
        }
    }
}

fn write_printable(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    use core::fmt::Write;
    for &byte in bytes {
        f.write_char(if (0x20..=0x7E).contains(&byte) {
            byte as char
        } else {
            '.'
        })?;
    }
    Ok(())
}

/// The opaque payload of a get-SSID response.
///
/// The peripheral's configuration tooling renders this block as a raw
/// dump; no structural decode is defined for it here.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Ssid {
    raw: [u8; SSID_PAYLOAD_LEN],
}

impl Ssid {
    /// Decode from a validated get-SSID payload.
    /// # Errors
    /// Returns [`Error::PayloadLength`] unless `payload` is exactly
    /// [`SSID_PAYLOAD_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<Ssid, Error> {
        ensure!(
            payload.len() == SSID_PAYLOAD_LEN,
            PayloadLengthSnafu {
                len: payload.len(),
                expected: SSID_PAYLOAD_LEN,
            }
        );
        let mut raw = [0; SSID_PAYLOAD_LEN];
        raw.copy_from_slice(payload);
        Ok(Ssid { raw })
    }

    /// The raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl fmt::Debug for Ssid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ssid(")?;
        write_printable(f, &self.raw)?;
        write!(f, ")")
    }
}

/// One 32-byte host slot record from a get-hosts response.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct HostSlot {
    raw: [u8; HOST_SLOT_LEN],
}

impl HostSlot {
    pub(crate) fn from_raw(raw: [u8; HOST_SLOT_LEN]) -> HostSlot {
        HostSlot { raw }
    }

    /// A slot is empty when all 32 record bytes are zero.
    pub fn is_empty(&self) -> bool {
        self.raw.iter().all(|&byte| byte == 0)
    }

    /// The host name: every byte up to the first NUL, or the whole record
    /// when no NUL is present.
    pub fn name(&self) -> &[u8] {
        let end = self.raw.iter().position(|&byte| byte == 0);
        &self.raw[..end.unwrap_or(HOST_SLOT_LEN)]
    }

    /// The raw record bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}

impl fmt::Debug for HostSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "HostSlot(empty)")
        } else {
            write!(f, "HostSlot(")?;
            write_printable(f, self.name())?;
            write!(f, ")")
        }
    }
}

/// The eight host slots of a get-hosts response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HostSlots {
    slots: [HostSlot; HOST_SLOT_COUNT],
}

impl HostSlots {
    /// Decode the 256-byte get-hosts payload into its eight fixed-width
    /// records.
    /// # Errors
    /// Returns [`Error::PayloadLength`] unless `payload` is exactly
    /// [`HOSTS_PAYLOAD_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<HostSlots, Error> {
        ensure!(
            payload.len() == HOSTS_PAYLOAD_LEN,
            PayloadLengthSnafu {
                len: payload.len(),
                expected: HOSTS_PAYLOAD_LEN,
            }
        );
        let mut rest = payload;
        let mut slots = [HostSlot {
            raw: [0; HOST_SLOT_LEN],
        }; HOST_SLOT_COUNT];
        for slot in slots.iter_mut() {
            let (next, raw) =
                records::host_slot(rest).expect("BUG: record layout already length-checked");
            *slot = HostSlot::from_raw(raw);
            rest = next;
        }
        Ok(HostSlots { slots })
    }

    /// All eight slots, in slot order.
    pub fn slots(&self) -> &[HostSlot] {
        &self.slots
    }

    /// The configured slots with their zero-based slot index.
    ///
    /// Empty slots are skipped entirely. This intentionally differs from
    /// [`DeviceSlots::iter`], which always reports all eight slots: the
    /// host list hides unset entries, the device-slot list marks them.
    pub fn present(&self) -> impl Iterator<Item = (usize, &HostSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
    }
}

/// One 38-byte device slot record from a get-device-slots response.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct DeviceSlot {
    host_slot: u8,
    mode: u8,
    filename: [u8; FILENAME_LEN],
}

impl DeviceSlot {
    pub(crate) fn from_raw(host_slot: u8, mode: u8, filename: [u8; FILENAME_LEN]) -> DeviceSlot {
        DeviceSlot {
            host_slot,
            mode,
            filename,
        }
    }

    /// Index of the host slot this device is mounted from.
    pub fn host_slot(&self) -> u8 {
        self.host_slot
    }

    /// Mount mode (read / read-write, as defined by the peripheral).
    pub fn mode(&self) -> u8 {
        self.mode
    }

    /// The mounted filename, truncated at the first NUL or at the field
    /// width, whichever comes first. `None` when the whole field is zero.
    pub fn filename(&self) -> Option<&[u8]> {
        if self.filename.iter().all(|&byte| byte == 0) {
            return None;
        }
        let end = self.filename.iter().position(|&byte| byte == 0);
        Some(&self.filename[..end.unwrap_or(FILENAME_LEN)])
    }
}

impl fmt::Debug for DeviceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceSlot(host={}, mode={}, file=", self.host_slot, self.mode)?;
        match self.filename() {
            Some(name) => write_printable(f, name)?,
            None => write!(f, "(empty)")?,
        }
        write!(f, ")")
    }
}

/// The eight device slots of a get-device-slots response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceSlots {
    slots: [DeviceSlot; DEVICE_SLOT_COUNT],
}

impl DeviceSlots {
    /// Decode the 304-byte get-device-slots payload into its eight
    /// fixed-width records.
    /// # Errors
    /// Returns [`Error::PayloadLength`] unless `payload` is exactly
    /// [`DEVICE_SLOTS_PAYLOAD_LEN`] bytes.
    pub fn decode(payload: &[u8]) -> Result<DeviceSlots, Error> {
        ensure!(
            payload.len() == DEVICE_SLOTS_PAYLOAD_LEN,
            PayloadLengthSnafu {
                len: payload.len(),
                expected: DEVICE_SLOTS_PAYLOAD_LEN,
            }
        );
        let mut rest = payload;
        let mut slots = [DeviceSlot {
            host_slot: 0,
            mode: 0,
            filename: [0; FILENAME_LEN],
        }; DEVICE_SLOT_COUNT];
        for slot in slots.iter_mut() {
            let (next, (host_slot, mode, filename)) =
                records::device_slot(rest).expect("BUG: record layout already length-checked");
            *slot = DeviceSlot::from_raw(host_slot, mode, filename);
            rest = next;
        }
        Ok(DeviceSlots { slots })
    }

    /// All eight slots, in slot order.
    ///
    /// Unlike [`HostSlots::present`], nothing is filtered here: slots with
    /// no mounted file are still listed, with [`DeviceSlot::filename`]
    /// returning `None`.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceSlot> {
        self.slots.iter()
    }

    /// All eight slots as a slice.
    pub fn slots(&self) -> &[DeviceSlot] {
        &self.slots
    }
}
