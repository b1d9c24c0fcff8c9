use nom::bytes::complete::{tag, take};
use nom::combinator::{all_consuming, consumed, map, verify};
use nom::number::complete::u8;
use nom::sequence::{preceded, tuple};
use nom::IResult;

use crate::checksum;
use crate::wire::{DEVICE_FUJINET, RESPONSE_OVERHEAD, STATUS_PREFIX};

type Buf = [u8];

pub(crate) mod master {
    use super::*;

    /// Structural split of a full-length response buffer.
    #[derive(Debug, PartialEq)]
    pub(crate) struct Envelope<'a> {
        pub(crate) payload: &'a Buf,
        /// The trailing checksum byte as sent by the peripheral.
        pub(crate) checksum: u8,
    }

    /// Split a complete response into its payload and trailing checksum
    /// byte, verifying the status prefix. Returns `None` when the prefix
    /// isn't "AC". Checksum comparison is left to the caller, which needs
    /// both sides of the comparison for reporting.
    pub(crate) fn response_envelope(buf: &Buf) -> Option<Envelope<'_>> {
        let payload_len = buf.len().checked_sub(RESPONSE_OVERHEAD)?;
        let result: IResult<&Buf, Envelope<'_>> = all_consuming(map(
            preceded(tag(&STATUS_PREFIX[..]), tuple((take(payload_len), u8))),
            |(payload, checksum)| Envelope { payload, checksum },
        ))(buf);
        match result {
            Ok((_, envelope)) => Some(envelope),
            Err(_) => None,
        }
    }
}

pub(crate) mod device {
    use super::*;

    /// Parse one complete 7-byte request frame: device id, command byte,
    /// four argument bytes, checksum over the first six. Returns the
    /// command byte and arguments, or `None` when the device id or the
    /// checksum doesn't match.
    pub(crate) fn request_frame(frame: &Buf) -> Option<(u8, [u8; 4])> {
        let result: IResult<&Buf, (u8, [u8; 4])> = all_consuming(checked_frame)(frame);
        match result {
            Ok((_, request)) => Some(request),
            Err(_) => None,
        }
    }

    fn checked_frame(buf: &Buf) -> IResult<&Buf, (u8, [u8; 4])> {
        let (buf, (checked, (_id, command, args))) =
            consumed(tuple((device_id, u8, take(4usize))))(buf)?;
        let (buf, _) = verify(u8, |received: &u8| checksum(checked) == *received)(buf)?;
        Ok((buf, (command, to_args(args))))
    }

    fn device_id(buf: &Buf) -> IResult<&Buf, u8> {
        verify(u8, |&id: &u8| id == DEVICE_FUJINET)(buf)
    }

    fn to_args(bytes: &Buf) -> [u8; 4] {
        let mut args = [0; 4];
        args.copy_from_slice(bytes);
        args
    }
}

pub(crate) mod records {
    use super::*;
    use crate::types::{FILENAME_LEN, HOST_SLOT_LEN};

    pub(crate) fn host_slot(buf: &Buf) -> IResult<&Buf, [u8; HOST_SLOT_LEN]> {
        map(take(HOST_SLOT_LEN), |slice: &Buf| {
            let mut raw = [0; HOST_SLOT_LEN];
            raw.copy_from_slice(slice);
            raw
        })(buf)
    }

    pub(crate) fn device_slot(buf: &Buf) -> IResult<&Buf, (u8, u8, [u8; FILENAME_LEN])> {
        tuple((u8, u8, filename))(buf)
    }

    fn filename(buf: &Buf) -> IResult<&Buf, [u8; FILENAME_LEN]> {
        map(take(FILENAME_LEN), |slice: &Buf| {
            let mut raw = [0; FILENAME_LEN];
            raw.copy_from_slice(slice);
            raw
        })(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(payload: &[u8]) -> Vec<u8> {
        let mut buf = STATUS_PREFIX.to_vec();
        buf.extend_from_slice(payload);
        buf.push(checksum(payload));
        buf
    }

    #[test]
    fn envelope_splits_payload_and_checksum() {
        let buf = response(b"hello");
        let envelope = master::response_envelope(&buf).unwrap();
        assert_eq!(envelope.payload, b"hello");
        assert_eq!(envelope.checksum, checksum(b"hello"));
    }

    #[test]
    fn envelope_rejects_bad_prefix() {
        let mut buf = response(b"hello");
        buf[0] = b'N';
        assert!(master::response_envelope(&buf).is_none());
    }

    #[test]
    fn envelope_keeps_mismatched_checksum() {
        // A corrupted trailing byte still splits; the caller compares.
        let mut buf = response(b"hello");
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;
        let envelope = master::response_envelope(&buf).unwrap();
        assert_ne!(envelope.checksum, checksum(b"hello"));
    }

    #[test]
    fn request_frame_round_trip() {
        let mut frame = [DEVICE_FUJINET, 0xF4, 1, 2, 3, 4, 0];
        frame[6] = checksum(&frame[..6]);
        assert_eq!(device::request_frame(&frame), Some((0xF4, [1, 2, 3, 4])));
    }

    #[test]
    fn request_frame_rejects_bad_checksum() {
        let mut frame = [DEVICE_FUJINET, 0xF4, 1, 2, 3, 4, 0];
        frame[6] = checksum(&frame[..6]) ^ 1;
        assert_eq!(device::request_frame(&frame), None);
    }

    #[test]
    fn request_frame_rejects_wrong_device_id() {
        let mut frame = [0x71, 0xF4, 0, 0, 0, 0, 0];
        frame[6] = checksum(&frame[..6]);
        assert_eq!(device::request_frame(&frame), None);
    }
}
