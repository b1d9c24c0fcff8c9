//! Constants defining the on-wire shape of the FujiNet serial protocol.

/// Device id addressing the FujiNet peripheral, byte 0 of every request.
pub const DEVICE_FUJINET: u8 = 0x70;

/// First status byte of a response: request acknowledged.
pub const ACK: u8 = b'A';
/// Second status byte of a response: command completed.
pub const COMPLETE: u8 = b'C';
/// The two-byte status prefix every response starts with.
pub const STATUS_PREFIX: [u8; 2] = [ACK, COMPLETE];

pub const CMD_RESET: u8 = 0xFF;
pub const CMD_GET_SSID: u8 = 0xFE;
pub const CMD_GET_HOSTS: u8 = 0xF4;
pub const CMD_GET_DEVICE_SLOTS: u8 = 0xF2;

/// Request frame length: device id, command, four arguments, checksum.
pub const FRAME_LEN: usize = 7;

/// Bytes surrounding every response payload: the status prefix and the
/// trailing checksum.
pub const RESPONSE_OVERHEAD: usize = 3;

pub const GET_SSID_RESPONSE_LEN: usize = 100;
pub const GET_HOSTS_RESPONSE_LEN: usize = 259;
pub const GET_DEVICE_SLOTS_RESPONSE_LEN: usize = 307;

/// The longest response on the wire (get-device-slots).
pub const MAX_RESPONSE_LEN: usize = GET_DEVICE_SLOTS_RESPONSE_LEN;
