//! Simulated FujiNet peripheral on stdin/stdout, serving canned data.
//! Wire it to the repl demo through a pty pair to exercise the whole
//! protocol without hardware.

use std::error::Error;
use std::io::{self, Read, Write};

use fujinet_proto::device::DeviceState;
use fujinet_proto::types::{
    Command, DEVICE_SLOTS_PAYLOAD_LEN, DEVICE_SLOT_LEN, HOSTS_PAYLOAD_LEN, HOST_SLOT_LEN,
    SSID_PAYLOAD_LEN,
};

fn ssid_payload() -> [u8; SSID_PAYLOAD_LEN] {
    let mut payload = [0; SSID_PAYLOAD_LEN];
    payload[..12].copy_from_slice(b"FUJINET-WIFI");
    payload
}

fn hosts_payload() -> [u8; HOSTS_PAYLOAD_LEN] {
    let mut payload = [0; HOSTS_PAYLOAD_LEN];
    let names: [&[u8]; 3] = [b"fujinet.online", b"tnfs.example.com", b"atari.local"];
    for (slot, name) in names.iter().enumerate() {
        payload[slot * HOST_SLOT_LEN..slot * HOST_SLOT_LEN + name.len()].copy_from_slice(name);
    }
    payload
}

fn device_slots_payload() -> [u8; DEVICE_SLOTS_PAYLOAD_LEN] {
    let mut payload = [0; DEVICE_SLOTS_PAYLOAD_LEN];
    // slot 0: host 1, read-only mount
    payload[0] = 1;
    payload[1] = 0;
    payload[2..2 + 11].copy_from_slice(b"JUMPMAN.ATR");
    // slot 1: host 2, read-write mount
    let base = DEVICE_SLOT_LEN;
    payload[base] = 2;
    payload[base + 1] = 1;
    payload[base + 2..base + 2 + 9].copy_from_slice(b"SAVES.ATR");
    payload
}

fn device_main_loop() -> Result<(), Box<dyn Error>> {
    let mut device = DeviceState::new();

    loop {
        device = match device {
            DeviceState::Receive(recv) => {
                let mut data_in = [0; 1];
                let len = io::stdin().read(&mut data_in)?;
                if len == 0 {
                    break;
                }
                recv.receive_data(&data_in[..len])
            }

            DeviceState::Send(send) => {
                io::stdout().write_all(send.get_data())?;
                io::stdout().flush()?;
                send.data_sent()
            }

            DeviceState::Handle(request) => match request.command() {
                Some(Command::GetSsid) => request.respond(&ssid_payload()),
                Some(Command::GetHosts) => request.respond(&hosts_payload()),
                Some(Command::GetDeviceSlots) => request.respond(&device_slots_payload()),
                // reset and anything unrecognised: stay quiet
                Some(Command::Reset) | None => request.no_reply(),
            },
        };
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    device_main_loop()
}
