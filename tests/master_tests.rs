mod common;

use common::{response_bytes, SerialIOPlane, SerialInterface};
use fujinet_proto::checksum;
use fujinet_proto::io::{Error, Master};
use fujinet_proto::types::{HOSTS_PAYLOAD_LEN, HOST_SLOT_LEN, SSID_PAYLOAD_LEN};

#[test]
fn get_ssid_round_trip() {
    let mut payload = [0u8; SSID_PAYLOAD_LEN];
    payload[..12].copy_from_slice(b"FUJINET-WIFI");
    let serial_sim = SerialInterface::new(&response_bytes(&payload));

    let mut master = Master::new(SerialIOPlane::new(&serial_sim));
    let ssid = master.get_ssid().expect("scripted response is valid");
    assert_eq!(ssid.as_bytes(), &payload[..]);

    let inner = serial_sim.borrow();
    assert_eq!(inner.tx.len(), 7);
    assert_eq!(inner.tx[0], 0x70);
    assert_eq!(inner.tx[1], 0xFE);
    assert_eq!(&inner.tx[2..6], &[0, 0, 0, 0]);
    assert_eq!(inner.tx[6], checksum(&inner.tx[..6]));
    assert_eq!(inner.configured, 1);
    assert_eq!(inner.restored, 1);
}

#[test]
fn reset_transmits_and_reads_nothing() {
    let serial_sim = SerialInterface::new(b"");
    let mut master = Master::new(SerialIOPlane::new(&serial_sim));
    master.reset();

    let inner = serial_sim.borrow();
    let expected_frame = {
        let mut frame = vec![0x70, 0xFF, 0, 0, 0, 0];
        frame.push(checksum(&frame));
        frame
    };
    assert_eq!(inner.tx, expected_frame);
    assert_eq!(inner.configured, 1);
    assert_eq!(inner.restored, 1);
}

#[test]
fn silent_line_reports_invalid_response() {
    let serial_sim = SerialInterface::new(b"");
    let mut master = Master::with_byte_budget(SerialIOPlane::new(&serial_sim), 50);

    match master.get_hosts() {
        Err(Error::InvalidResponse { validation }) => {
            assert!(!validation.protocol_valid);
            assert!(!validation.checksum_valid);
        }
        other => panic!("expected invalid response, got {:?}", other),
    }
    // the port is restored even though the command failed
    let inner = serial_sim.borrow();
    assert_eq!(inner.configured, 1);
    assert_eq!(inner.restored, 1);
}

#[test]
fn short_response_reports_invalid_response() {
    let payload = [0u8; HOSTS_PAYLOAD_LEN];
    let mut wire = response_bytes(&payload);
    wire.truncate(50);
    let serial_sim = SerialInterface::new(&wire);
    let mut master = Master::with_byte_budget(SerialIOPlane::new(&serial_sim), 50);

    match master.get_hosts() {
        Err(Error::InvalidResponse { validation }) => {
            assert!(!validation.protocol_valid);
        }
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[test]
fn corrupted_payload_fails_checksum_only() {
    let payload = [0x11u8; HOSTS_PAYLOAD_LEN];
    let mut wire = response_bytes(&payload);
    wire[20] ^= 0x01;
    let serial_sim = SerialInterface::new(&wire);
    let mut master = Master::new(SerialIOPlane::new(&serial_sim));

    match master.get_hosts() {
        Err(Error::InvalidResponse { validation }) => {
            assert!(validation.protocol_valid);
            assert!(!validation.checksum_valid);
            assert_ne!(validation.expected_checksum, validation.received_checksum);
        }
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[test]
fn bad_status_prefix_fails_protocol() {
    let payload = [0u8; HOSTS_PAYLOAD_LEN];
    let mut wire = response_bytes(&payload);
    wire[1] = b'E'; // peripheral-side error status instead of COMPLETE
    let serial_sim = SerialInterface::new(&wire);
    let mut master = Master::new(SerialIOPlane::new(&serial_sim));

    match master.get_hosts() {
        Err(Error::InvalidResponse { validation }) => {
            assert!(!validation.protocol_valid);
            assert!(!validation.checksum_valid);
        }
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[test]
fn get_hosts_decodes_configured_slots() {
    let mut payload = [0u8; HOSTS_PAYLOAD_LEN];
    payload[..14].copy_from_slice(b"fujinet.online");
    let base = 4 * HOST_SLOT_LEN;
    payload[base..base + 11].copy_from_slice(b"atari.local");
    let serial_sim = SerialInterface::new(&response_bytes(&payload));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim));

    let hosts = master.get_hosts().expect("scripted response is valid");
    let present: Vec<_> = hosts.present().collect();
    assert_eq!(present.len(), 2);
    assert_eq!(present[0].0, 0);
    assert_eq!(present[0].1.name(), b"fujinet.online");
    assert_eq!(present[1].0, 4);
    assert_eq!(present[1].1.name(), b"atari.local");
}
