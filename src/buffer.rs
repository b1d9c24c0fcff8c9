use arrayvec::ArrayVec;

use crate::wire::MAX_RESPONSE_LEN;

/// Receive-side accumulator for one fixed-length response.
///
/// Tracks how many bytes actually arrived separately from the buffer
/// contents, so a zero-filled timeout remainder stays distinguishable
/// from received zero bytes.
#[derive(Debug)]
pub(crate) struct ResponseBuf {
    data: ArrayVec<u8, MAX_RESPONSE_LEN>,
    expected: usize,
    received: usize,
}

impl ResponseBuf {
    pub fn new(expected: usize) -> ResponseBuf {
        assert!(expected <= MAX_RESPONSE_LEN);
        ResponseBuf {
            data: ArrayVec::new(),
            expected,
            received: 0,
        }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn received(&self) -> usize {
        self.received
    }

    pub fn missing(&self) -> usize {
        self.expected - self.data.len()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.expected
    }

    /// Append received bytes, capped at the expected length. Returns how
    /// many were consumed.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.missing());
        self.data
            .try_extend_from_slice(&bytes[..take])
            .expect("BUG: response buffer overflow");
        self.received += take;
        take
    }

    /// Zero-fill everything that hasn't arrived, in one shot. The received
    /// count keeps only the bytes that were actually read off the line.
    pub fn zero_fill(&mut self) {
        while !self.is_full() {
            self.data.push(0);
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
