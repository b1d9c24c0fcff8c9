//! Host (master) side of the FujiNet serial exchange.
//!
//! The types here form a sans-io state machine for one command
//! transaction: build a request with [`request`], put its bytes on the
//! wire, then feed whatever the line delivers into the receive half until
//! the fixed-length response is complete, or give up with
//! [`ReceiveResponse::timed_out`], which zero-fills the remainder and
//! lets validation report the short read.
//!
//! # Example
//!
//! ```
//! use fujinet_proto::{checksum, Command};
//! use fujinet_proto::master::{self, Exchange, ReceiveResult};
//!
//! // Build and "transmit" a get-hosts request.
//! let send = master::request(Command::GetHosts);
//! assert_eq!(send.as_bytes()[0], 0x70);
//!
//! let recv = match send.data_sent() {
//!     Exchange::Receive(recv) => recv,
//!     Exchange::Done => unreachable!("get-hosts has a response"),
//! };
//!
//! // The peripheral answers with the status prefix, 256 payload bytes
//! // and a trailing payload checksum.
//! let mut payload = [0u8; 256];
//! payload[..4].copy_from_slice(b"tnfs");
//! let mut wire = vec![b'A', b'C'];
//! wire.extend_from_slice(&payload);
//! wire.push(checksum(&payload));
//!
//! let response = match recv.receive_data(&wire) {
//!     ReceiveResult::Complete(response) => response,
//!     ReceiveResult::NeedData(_) => unreachable!("the whole response was fed"),
//! };
//! assert!(response.validate().is_valid());
//!
//! let hosts = response.host_slots().unwrap();
//! assert_eq!(hosts.present().count(), 1);
//! ```

use core::fmt;

use arrayvec::ArrayVec;
use snafu::{ensure, OptionExt};

use crate::buffer::ResponseBuf;
use crate::checksum;
use crate::nom_parser::master::response_envelope;
use crate::types::{
    Command, CommandMismatchSnafu, DeviceSlots, Error, HostSlots, InvalidResponseSnafu, Ssid,
};
use crate::wire::{DEVICE_FUJINET, FRAME_LEN};

/// Start a transaction for `command` with zero-valued arguments.
///
/// All commands modelled by this crate take no arguments on the wire;
/// [`request_with_args`] is the general form.
pub fn request(command: Command) -> SendRequest {
    request_with_args(command, [0; 4])
}

/// Start a transaction for `command` with explicit argument bytes.
pub fn request_with_args(command: Command, args: [u8; 4]) -> SendRequest {
    let mut frame = ArrayVec::<u8, FRAME_LEN>::new();
    frame.push(DEVICE_FUJINET);
    frame.push(command.code());
    frame
        .try_extend_from_slice(&args)
        .expect("BUG: frame buffer too small");
    let chk = checksum(&frame);
    frame.push(chk);
    SendRequest { command, frame }
}

/// A request frame waiting to be transmitted.
#[derive(Debug)]
pub struct SendRequest {
    command: Command,
    frame: ArrayVec<u8, FRAME_LEN>,
}

impl SendRequest {
    /// The frame bytes, in wire order. Transmit them all, first to last.
    pub fn as_bytes(&self) -> &[u8] {
        &self.frame
    }

    /// The command this request is for.
    pub fn command(&self) -> Command {
        self.command
    }

    /// Signal that every byte is on the wire, and move to the receive
    /// half of the transaction.
    pub fn data_sent(self) -> Exchange {
        match self.command.response_len() {
            Some(len) => Exchange::Receive(ReceiveResponse {
                command: self.command,
                buf: ResponseBuf::new(len),
            }),
            // fire-and-forget: nothing comes back
            None => Exchange::Done,
        }
    }
}

/// What follows once a request has been transmitted.
#[derive(Debug)]
pub enum Exchange {
    /// The command has a fixed-length response to gather.
    Receive(ReceiveResponse),
    /// Fire-and-forget command; the transaction is already over.
    Done,
}

/// The receive half of a transaction, collecting a fixed-length response.
#[derive(Debug)]
pub struct ReceiveResponse {
    command: Command,
    buf: ResponseBuf,
}

impl ReceiveResponse {
    /// Total length this response must reach.
    pub fn expected_len(&self) -> usize {
        self.buf.expected()
    }

    /// Bytes still missing.
    pub fn missing(&self) -> usize {
        self.buf.missing()
    }

    /// Feed bytes taken off the line. Anything beyond the expected length
    /// is ignored.
    pub fn receive_data(mut self, data: &[u8]) -> ReceiveResult {
        self.buf.write(data);
        if self.buf.is_full() {
            ReceiveResult::Complete(Response {
                command: self.command,
                buf: self.buf,
            })
        } else {
            ReceiveResult::NeedData(self)
        }
    }

    /// Give up on the line. The rest of the buffer, from the first
    /// missing byte onward, is zero-filled in one shot and the response
    /// completes with a short receive count; there is no per-byte retry.
    pub fn timed_out(mut self) -> Response {
        log::warn!(
            "{:?}: receive timed out after {} of {} bytes",
            self.command,
            self.buf.received(),
            self.buf.expected()
        );
        self.buf.zero_fill();
        Response {
            command: self.command,
            buf: self.buf,
        }
    }
}

/// Outcome of feeding received data into a [`ReceiveResponse`].
#[derive(Debug)]
pub enum ReceiveResult {
    /// More bytes are needed.
    NeedData(ReceiveResponse),
    /// The fixed length has been reached.
    Complete(Response),
}

/// A gathered response, complete or zero-filled after a timeout.
#[derive(Debug)]
pub struct Response {
    command: Command,
    buf: ResponseBuf,
}

impl Response {
    /// The command this response answers.
    pub fn command(&self) -> Command {
        self.command
    }

    /// How many bytes actually arrived before completion or timeout.
    pub fn bytes_received(&self) -> usize {
        self.buf.received()
    }

    /// The raw buffer: always the full expected length, zero-filled past
    /// the last received byte.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Check framing and payload checksum.
    ///
    /// A short receive fails outright. Otherwise the status prefix is
    /// checked first, and only then the trailing checksum, computed over
    /// the payload region alone. The checksum bytes are reported whenever
    /// they were computed, so a mismatch can be displayed to the operator.
    pub fn validate(&self) -> Validation {
        if self.buf.received() < self.buf.expected() {
            return Validation {
                protocol_valid: false,
                checksum_valid: false,
                expected_checksum: 0,
                received_checksum: 0,
            };
        }
        match response_envelope(self.as_bytes()) {
            None => Validation {
                protocol_valid: false,
                checksum_valid: false,
                expected_checksum: 0,
                received_checksum: 0,
            },
            Some(envelope) => {
                let expected = checksum(envelope.payload);
                Validation {
                    protocol_valid: true,
                    checksum_valid: expected == envelope.checksum,
                    expected_checksum: expected,
                    received_checksum: envelope.checksum,
                }
            }
        }
    }

    /// The payload region (between the status prefix and the trailing
    /// checksum), available only when the response validates.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.validate().is_valid() {
            Some(&self.as_bytes()[2..self.buf.expected() - 1])
        } else {
            None
        }
    }

    /// Decode a validated get-SSID response.
    /// # Errors
    /// [`Error::CommandMismatch`] when this response answers another
    /// command, [`Error::InvalidResponse`] when validation fails.
    pub fn ssid(&self) -> Result<Ssid, Error> {
        Ssid::decode(self.checked_payload(Command::GetSsid)?)
    }

    /// Decode a validated get-hosts response.
    /// # Errors
    /// [`Error::CommandMismatch`] when this response answers another
    /// command, [`Error::InvalidResponse`] when validation fails.
    pub fn host_slots(&self) -> Result<HostSlots, Error> {
        HostSlots::decode(self.checked_payload(Command::GetHosts)?)
    }

    /// Decode a validated get-device-slots response.
    /// # Errors
    /// [`Error::CommandMismatch`] when this response answers another
    /// command, [`Error::InvalidResponse`] when validation fails.
    pub fn device_slots(&self) -> Result<DeviceSlots, Error> {
        DeviceSlots::decode(self.checked_payload(Command::GetDeviceSlots)?)
    }

    fn checked_payload(&self, want: Command) -> Result<&[u8], Error> {
        ensure!(self.command == want, CommandMismatchSnafu);
        self.payload().context(InvalidResponseSnafu)
    }
}

/// Outcome of response validation.
///
/// Both flags must hold before the payload may be decoded. The checksum
/// bytes are carried along for operator display even when the comparison
/// fails; they are zero when validation never got far enough to compute
/// them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Validation {
    /// The full length arrived and the status prefix was "AC".
    pub protocol_valid: bool,
    /// The trailing checksum matched the payload.
    pub checksum_valid: bool,
    /// Checksum computed over the received payload region.
    pub expected_checksum: u8,
    /// Checksum byte the peripheral sent.
    pub received_checksum: u8,
}

impl Validation {
    /// True when the payload may be decoded.
    pub fn is_valid(&self) -> bool {
        self.protocol_valid && self.checksum_valid
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "protocol valid: {}, checksum valid: {}, expected checksum: {:02X}, received checksum: {:02X}",
            self.protocol_valid, self.checksum_valid, self.expected_checksum, self.received_checksum
        )
    }
}
