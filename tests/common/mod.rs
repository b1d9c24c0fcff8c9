#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use fujinet_proto::checksum;
use fujinet_proto::device::{DeviceState, Handle};
use fujinet_proto::io::SerialLink;

/// Scripted serial peer: plays back `rx` byte by byte, records every
/// byte the master transmits, and counts the port routing calls.
pub struct SerialInterface {
    rx: Vec<u8>,
    rx_pos: usize,
    pub tx: Vec<u8>,
    pub configured: u32,
    pub restored: u32,
}

impl SerialInterface {
    pub fn new(rx: &[u8]) -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            rx: rx.to_vec(),
            rx_pos: 0,
            tx: Vec::new(),
            configured: 0,
            restored: 0,
        }))
    }
}

pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

impl SerialIOPlane {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialIOPlane {
        SerialIOPlane(serial_if.clone())
    }
}

impl SerialLink for SerialIOPlane {
    fn configure(&mut self) {
        self.0.borrow_mut().configured += 1;
    }

    fn restore(&mut self) {
        self.0.borrow_mut().restored += 1;
    }

    fn send_byte(&mut self, byte: u8) {
        self.0.borrow_mut().tx.push(byte);
    }

    fn poll_available(&mut self) -> bool {
        let inner = self.0.borrow();
        inner.rx_pos < inner.rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut inner = self.0.borrow_mut();
        if inner.rx_pos < inner.rx.len() {
            let byte = inner.rx[inner.rx_pos];
            inner.rx_pos += 1;
            Some(byte)
        } else {
            None
        }
    }
}

/// Build a complete response: status prefix, payload, trailing checksum.
pub fn response_bytes(payload: &[u8]) -> Vec<u8> {
    let mut buf = b"AC".to_vec();
    buf.extend_from_slice(payload);
    buf.push(checksum(payload));
    buf
}

/// In-memory link with a device-side state machine behind the wire:
/// master writes feed the responder, responder output becomes master
/// input. Single-threaded, like the half-duplex line it stands in for.
pub struct DeviceLink {
    device: Option<DeviceState>,
    handler: Box<dyn FnMut(Handle) -> DeviceState>,
    pending: VecDeque<u8>,
    pub configured: u32,
    pub restored: u32,
}

impl DeviceLink {
    pub fn new(handler: impl FnMut(Handle) -> DeviceState + 'static) -> DeviceLink {
        DeviceLink {
            device: Some(DeviceState::new()),
            handler: Box::new(handler),
            pending: VecDeque::new(),
            configured: 0,
            restored: 0,
        }
    }

    fn pump(&mut self, byte: u8) {
        let mut state = match self.device.take().expect("device state missing") {
            DeviceState::Receive(recv) => recv.receive_data(&[byte]),
            other => other,
        };
        loop {
            state = match state {
                DeviceState::Handle(request) => (self.handler)(request),
                DeviceState::Send(send) => {
                    self.pending.extend(send.get_data().iter().copied());
                    send.data_sent()
                }
                DeviceState::Receive(recv) => {
                    self.device = Some(DeviceState::Receive(recv));
                    return;
                }
            };
        }
    }
}

impl SerialLink for DeviceLink {
    fn configure(&mut self) {
        self.configured += 1;
    }

    fn restore(&mut self) {
        self.restored += 1;
    }

    fn send_byte(&mut self, byte: u8) {
        self.pump(byte);
    }

    fn poll_available(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pending.pop_front()
    }
}
