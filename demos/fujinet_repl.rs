//! Interactive FujiNet test menu on a real serial port.
//!
//! Usage: `cargo run --example fujinet_repl [port]`. Pair it with the
//! `device_sim` binary over a pty to run without hardware.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use fujinet_proto::io::{Master, SerialLink};

struct Port(Box<dyn serialport::SerialPort>);

impl SerialLink for Port {
    fn configure(&mut self) {
        // drop whatever the previous exchange left in the input buffer
        let _ = self.0.clear(serialport::ClearBuffer::Input);
    }

    fn restore(&mut self) {}

    fn send_byte(&mut self, byte: u8) {
        let _ = self.0.write_all(&[byte]);
    }

    fn poll_available(&mut self) -> bool {
        self.0.bytes_to_read().map(|n| n > 0).unwrap_or(false)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0; 1];
        match self.0.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}

fn printable(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (0x20..=0x7E).contains(&b) { b as char } else { '.' })
        .collect()
}

fn hex_dump(data: &[u8]) {
    for (line, chunk) in data.chunks(8).enumerate() {
        print!("    {:04X}  ", line * 8);
        for byte in chunk {
            print!("{:02X} ", byte);
        }
        for _ in chunk.len()..8 {
            print!("   ");
        }
        println!(" |{}|", printable(chunk));
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args();
    args.next(); // Skip program name
    let port = args.next().unwrap_or("/dev/ttyUSB0".to_string());

    let serial = serialport::new(&port, 9600)
        .timeout(Duration::from_millis(100))
        .open()
        .with_context(|| format!("Failed to open serial port {}", port))?;

    // bytes_to_read is a syscall rather than a buffer flag, so a poll is
    // on the order of a microsecond; this budget covers a byte time at
    // 9600 baud with plenty of margin.
    let mut fuji = Master::with_byte_budget(Port(serial), 500_000);

    let mut stdout = std::io::stdout();
    loop {
        println!("=== FujiNet Serial Test Menu ===");
        println!("1. Reset FujiNet");
        println!("2. Get SSID");
        println!("3. Get Hosts");
        println!("4. Get Device Slots");
        println!("5. Exit");
        print!("Enter choice (1-5): ");
        stdout.flush()?;

        let mut choice = String::new();
        if std::io::stdin().read_line(&mut choice)? == 0 {
            break;
        }
        println!();

        match choice.trim() {
            "1" => {
                fuji.reset();
                println!("Reset sent.");
            }
            "2" => match fuji.get_ssid() {
                Ok(ssid) => {
                    println!("SSID block:");
                    hex_dump(ssid.as_bytes());
                }
                Err(err) => println!("{}", err),
            },
            "3" => match fuji.get_hosts() {
                Ok(hosts) => {
                    println!("Hosts found:");
                    for (index, slot) in hosts.present() {
                        println!("Host {}: {}", index + 1, printable(slot.name()));
                    }
                }
                Err(err) => println!("{}", err),
            },
            "4" => match fuji.get_device_slots() {
                Ok(slots) => {
                    println!("Device Slots:");
                    for (index, slot) in slots.iter().enumerate() {
                        print!(
                            "Slot {}: Host={}, Mode={}",
                            index + 1,
                            slot.host_slot(),
                            slot.mode()
                        );
                        match slot.filename() {
                            Some(name) => println!(", File={}", printable(name)),
                            None => println!(", File=(empty)"),
                        }
                    }
                }
                Err(err) => println!("{}", err),
            },
            "5" => break,
            other => println!("Invalid choice {:?}. Please enter 1-5.", other),
        }
        println!();
    }
    Ok(())
}
