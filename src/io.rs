//! Blocking driver for running FujiNet transactions over a serial link.
//!
//! [`Master`] owns a [`SerialLink`], the platform's byte-level serial
//! primitives, and runs one complete half-duplex transaction per call:
//! route the port, transmit the request frame, gather the fixed-length
//! response under the per-byte poll budget, restore the port, then
//! validate and decode.
//!
//! # Example
//!
//! ```
//! use std::collections::VecDeque;
//!
//! use fujinet_proto::checksum;
//! use fujinet_proto::io::{Master, SerialLink};
//!
//! struct Scripted {
//!     rx: VecDeque<u8>,
//!     tx: Vec<u8>,
//! }
//!
//! impl SerialLink for Scripted {
//!     fn configure(&mut self) {}
//!     fn restore(&mut self) {}
//!     fn send_byte(&mut self, byte: u8) {
//!         self.tx.push(byte);
//!     }
//!     fn poll_available(&mut self) -> bool {
//!         !self.rx.is_empty()
//!     }
//!     fn read_byte(&mut self) -> Option<u8> {
//!         self.rx.pop_front()
//!     }
//! }
//!
//! // Script a valid get-SSID response: "AC", 97 payload bytes, checksum.
//! let payload = [7u8; 97];
//! let mut rx: VecDeque<u8> = vec![b'A', b'C'].into();
//! rx.extend(payload.iter().copied());
//! rx.push_back(checksum(&payload));
//!
//! let mut master = Master::new(Scripted { rx, tx: Vec::new() });
//! let ssid = master.get_ssid().expect("scripted response is valid");
//! assert_eq!(ssid.as_bytes(), &payload[..]);
//! ```

use snafu::Snafu;

use crate::master::{self, Exchange, ReceiveResult, Response, Validation};
use crate::types::{Command, DeviceSlots, HostSlots, Ssid};

/// Per-byte poll budget used when none is configured.
///
/// The receive loop is iteration-counted, not wall-clock based: each
/// missing byte may be polled for at most this many times before the
/// whole transaction is abandoned. Links whose `poll_available` is more
/// expensive than a buffer flag check should scale the budget
/// accordingly via [`Master::with_byte_budget`].
pub const DEFAULT_BYTE_POLL_BUDGET: u32 = 10_000;

/// Platform primitives for one half-duplex serial port.
///
/// Transmission is best-effort: the protocol does not model a failed
/// write, so `send_byte` has no return value. `configure`/`restore`
/// bracket every transaction and carry the coarse port-routing side
/// effect (rates, stream routing, stale-buffer flush) of the surrounding
/// platform.
pub trait SerialLink {
    /// Route the port for a protocol exchange.
    fn configure(&mut self);
    /// Restore the routing that was in effect before
    /// [`configure`](Self::configure). Called on every path out of a
    /// transaction.
    fn restore(&mut self);
    /// Queue one byte for transmission.
    fn send_byte(&mut self, byte: u8);
    /// True when at least one received byte is waiting.
    fn poll_available(&mut self) -> bool;
    /// Take one received byte, or `None` when there is none after all.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Error type for failed transactions.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The response failed protocol or checksum validation. Timeouts
    /// surface here too, as a short receive count that can never
    /// validate.
    #[snafu(display("Invalid response ({})", validation))]
    InvalidResponse { validation: Validation },
    /// A validated payload did not match its record layout.
    #[snafu(context(false), display("{}", source))]
    Decode { source: crate::types::Error },
}

/// Blocking FujiNet master over a [`SerialLink`].
///
/// One command maps to one call; nothing persists on the line between
/// calls.
#[derive(Debug)]
pub struct Master<L> {
    link: L,
    byte_budget: u32,
}

impl<L: SerialLink> Master<L> {
    pub fn new(link: L) -> Master<L> {
        Master::with_byte_budget(link, DEFAULT_BYTE_POLL_BUDGET)
    }

    /// Use a custom per-byte poll budget (iterations, not time).
    pub fn with_byte_budget(link: L, byte_budget: u32) -> Master<L> {
        Master { link, byte_budget }
    }

    /// Give the serial link back.
    pub fn into_link(self) -> L {
        self.link
    }

    /// Reboot the peripheral. Fire-and-forget: nothing is read back.
    pub fn reset(&mut self) {
        let _ = self.transact(Command::Reset);
    }

    /// Read the current wifi SSID block.
    /// # Errors
    /// [`Error::InvalidResponse`] when the response times out short or
    /// fails validation.
    pub fn get_ssid(&mut self) -> Result<Ssid, Error> {
        Ok(self.validated(Command::GetSsid)?.ssid()?)
    }

    /// Read the eight TNFS host slots.
    /// # Errors
    /// [`Error::InvalidResponse`] when the response times out short or
    /// fails validation.
    pub fn get_hosts(&mut self) -> Result<HostSlots, Error> {
        Ok(self.validated(Command::GetHosts)?.host_slots()?)
    }

    /// Read the eight mounted device slots.
    /// # Errors
    /// [`Error::InvalidResponse`] when the response times out short or
    /// fails validation.
    pub fn get_device_slots(&mut self) -> Result<DeviceSlots, Error> {
        Ok(self.validated(Command::GetDeviceSlots)?.device_slots()?)
    }

    /// Run one transaction and return the raw response, `None` for
    /// fire-and-forget commands. The port is configured for the duration
    /// of the exchange and restored before this returns, so validation
    /// failures never leave the port routed away from its owner.
    pub fn transact(&mut self, command: Command) -> Option<Response> {
        let budget = self.byte_budget;
        let mut guard = PortGuard::new(&mut self.link);

        let send = master::request(command);
        log::debug!("{:?}: sending frame {:02X?}", command, send.as_bytes());
        for &byte in send.as_bytes() {
            guard.link().send_byte(byte);
        }

        let mut recv = match send.data_sent() {
            Exchange::Receive(recv) => recv,
            Exchange::Done => return None,
        };
        loop {
            match poll_byte(guard.link(), budget) {
                Some(byte) => match recv.receive_data(&[byte]) {
                    ReceiveResult::NeedData(next) => recv = next,
                    ReceiveResult::Complete(response) => return Some(response),
                },
                // First missed byte gives up on the whole remainder.
                None => return Some(recv.timed_out()),
            }
        }
    }

    fn validated(&mut self, command: Command) -> Result<Response, Error> {
        let response = self
            .transact(command)
            .expect("BUG: query commands always gather a response");
        let validation = response.validate();
        if validation.is_valid() {
            log::debug!(
                "{:?}: response valid, {} bytes",
                command,
                response.bytes_received()
            );
            Ok(response)
        } else {
            log::warn!("{:?}: {}", command, validation);
            InvalidResponseSnafu { validation }.fail()
        }
    }
}

/// Spin-wait for one byte, bounded by the per-byte budget.
///
/// `None` covers both failure modes: budget exhausted, or the link
/// reporting data that a read then fails to produce. Both abort the
/// transaction the same way.
fn poll_byte<L: SerialLink>(link: &mut L, budget: u32) -> Option<u8> {
    let mut waited: u32 = 0;
    while !link.poll_available() {
        waited += 1;
        if waited >= budget {
            return None;
        }
    }
    link.read_byte()
}

/// Scoped port acquisition: `configure` on creation, `restore` on drop,
/// so the original routing comes back on every path out of a
/// transaction.
struct PortGuard<'a, L: SerialLink> {
    link: &'a mut L,
}

impl<'a, L: SerialLink> PortGuard<'a, L> {
    fn new(link: &'a mut L) -> PortGuard<'a, L> {
        link.configure();
        PortGuard { link }
    }

    fn link(&mut self) -> &mut L {
        self.link
    }
}

impl<L: SerialLink> Drop for PortGuard<'_, L> {
    fn drop(&mut self) {
        self.link.restore();
    }
}
