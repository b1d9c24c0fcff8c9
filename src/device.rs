//! Responding (device) end of the FujiNet exchange.
//!
//! The real responder is the FujiNet peripheral itself; this module
//! exists so the crate can talk to itself in tests and simulations, and
//! to pin down the framing rules from the other side of the line. It is
//! a sans-io state machine in the same style as [`crate::master`]:
//! gather a 7-byte request frame, hand the verified command to the
//! embedding application, and wrap whatever payload it answers with in
//! the status prefix and trailing checksum.
//!
//! ```
//! use fujinet_proto::device::DeviceState;
//! use fujinet_proto::{master, Command};
//!
//! let request = master::request(Command::GetSsid);
//!
//! let mut device = DeviceState::new();
//! device = match device {
//!     DeviceState::Receive(recv) => recv.receive_data(request.as_bytes()),
//!     other => other,
//! };
//!
//! match device {
//!     DeviceState::Handle(handle) => {
//!         assert_eq!(handle.command(), Some(Command::GetSsid));
//!         let reply = handle.respond(&[0; 97]);
//!         match reply {
//!             DeviceState::Send(send) => assert_eq!(send.get_data().len(), 100),
//!             _ => unreachable!(),
//!         }
//!     }
//!     _ => unreachable!("a complete valid frame was fed"),
//! }
//! ```

use arrayvec::ArrayVec;

use crate::checksum;
use crate::nom_parser::device::request_frame;
use crate::types::Command;
use crate::wire::{ACK, COMPLETE, FRAME_LEN, MAX_RESPONSE_LEN};

/// Device-side protocol states.
#[derive(Debug)]
pub enum DeviceState {
    /// More request bytes need to be received.
    Receive(Receive),
    /// A complete, checksum-valid request is waiting to be answered.
    Handle(Handle),
    /// Response data is waiting to be transmitted.
    Send(Send),
}

impl DeviceState {
    /// A fresh responder, waiting for the first request byte.
    pub fn new() -> DeviceState {
        Receive {
            buf: ArrayVec::new(),
        }
        .into()
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        DeviceState::new()
    }
}

impl From<Receive> for DeviceState {
    fn from(x: Receive) -> Self {
        DeviceState::Receive(x)
    }
}

impl From<Handle> for DeviceState {
    fn from(x: Handle) -> Self {
        DeviceState::Handle(x)
    }
}

impl From<Send> for DeviceState {
    fn from(x: Send) -> Self {
        DeviceState::Send(x)
    }
}

/// Struct with methods for the "receive request bytes" state.
#[derive(Debug)]
pub struct Receive {
    buf: ArrayVec<u8, FRAME_LEN>,
}

impl Receive {
    /// Feed bytes taken off the line.
    ///
    /// Once seven bytes are gathered the frame is parsed; a frame with
    /// the wrong device id or a bad checksum is logged and discarded
    /// whole, and receiving resumes with the bytes that follow it.
    pub fn receive_data(mut self, data: &[u8]) -> DeviceState {
        for &byte in data {
            self.buf.push(byte);
            if !self.buf.is_full() {
                continue;
            }
            let mut frame = [0; FRAME_LEN];
            frame.copy_from_slice(&self.buf);
            self.buf.clear();
            match request_frame(&frame) {
                Some((code, args)) => {
                    // half-duplex: anything after a complete frame is stale
                    return Handle { code, args }.into();
                }
                None => log::warn!("discarding invalid request frame {:02X?}", frame),
            }
        }
        self.into()
    }
}

/// Struct representing the "request received" state.
#[derive(Debug)]
pub struct Handle {
    code: u8,
    args: [u8; 4],
}

impl Handle {
    /// The raw command byte from the frame.
    pub fn code(&self) -> u8 {
        self.code
    }

    /// The command, when it is one this crate models.
    pub fn command(&self) -> Option<Command> {
        Command::from_code(self.code)
    }

    /// The four argument bytes from the frame.
    pub fn args(&self) -> [u8; 4] {
        self.args
    }

    /// Answer with a payload. The responder adds the status prefix and
    /// the trailing payload checksum; `payload` must fit the largest
    /// response on the wire.
    pub fn respond(self, payload: &[u8]) -> DeviceState {
        let mut data = ArrayVec::new();
        data.push(ACK);
        data.push(COMPLETE);
        data.try_extend_from_slice(payload)
            .expect("BUG: payload too large for a response");
        data.push(checksum(payload));
        Send { data }.into()
    }

    /// Send nothing back and return to receiving. This is the correct
    /// answer to reset, which is fire-and-forget on the master side.
    pub fn no_reply(self) -> DeviceState {
        DeviceState::new()
    }
}

/// Struct with methods for the "transmit response" state.
#[derive(Debug)]
pub struct Send {
    data: ArrayVec<u8, MAX_RESPONSE_LEN>,
}

impl Send {
    /// The response bytes to put on the wire.
    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    /// Signal that the data was sent, and go back to receiving.
    pub fn data_sent(self) -> DeviceState {
        DeviceState::new()
    }
}
