//! Frame assembly for the raw serial stream.
//!
//! Wire layout (logical bytes, after unescaping):
//!
//! ```text
//! +-------+-----+------------------+---------+------+-------------------+--------+
//! | start | len | ext address[8]   | transid | ctrl | id + fields (len) | chksum |
//! +-------+-----+------------------+---------+------+-------------------+--------+
//!    [0]    [1]      [2..10)          [10]     [11]     [12..12+len)     [12+len]
//! ```
//!
//! The length byte counts only the packet region: the packet-type code plus
//! its fields. The checksum covers every byte before it, start marker and
//! length included. The assembler eats one raw wire byte at a time, runs it
//! through the unescaper, hunts for the start marker, and hands back frames
//! whose checksum verified. A frame that fails its checksum is dropped whole
//! and the hunt starts over, so the stream resynchronizes on its own.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::checksum::frame_checksum;
use crate::constants::{ADDRESSING_LEN, ADDRESS_LEN, FRAME_START, MAX_FRAME_SIZE};
use crate::escape::{escape, EscapeConfig, Unescaper};
use crate::types::ExtendedAddress;

/// Byte positions of the fixed header region.
///
/// The addressing overhead is the part of the header most likely to move
/// between firmware generations, so it lives here rather than in hardcoded
/// offsets. `addressing_len` must be at least [`ADDRESS_LEN`] + 2; any bytes
/// past the control byte are reserved padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    /// Marker byte that opens every frame.
    pub start_marker: u8,
    /// Bytes between the length byte and the packet region: extended
    /// address, transaction id, control byte.
    pub addressing_len: usize,
}

impl Default for FrameLayout {
    fn default() -> Self {
        FrameLayout {
            start_marker: FRAME_START,
            addressing_len: ADDRESSING_LEN,
        }
    }
}

impl FrameLayout {
    /// Offset of the extended address.
    pub fn address_offset(&self) -> usize {
        2
    }

    /// Offset of the transaction id byte.
    pub fn transaction_id_offset(&self) -> usize {
        2 + ADDRESS_LEN
    }

    /// Offset of the control byte.
    pub fn control_offset(&self) -> usize {
        2 + ADDRESS_LEN + 1
    }

    /// Offset of the packet-type code, the first byte the length byte counts.
    pub fn packet_offset(&self) -> usize {
        2 + self.addressing_len
    }

    /// Total logical frame size for a declared packet-region length.
    pub fn frame_size(&self, declared_len: usize) -> usize {
        // start + length byte + addressing block + packet region + checksum
        2 + self.addressing_len + declared_len + 1
    }
}

/// A complete frame whose checksum verified.
///
/// `raw` holds the logical bytes exactly as accumulated, start marker through
/// checksum; `payload` is the same buffer minus the trailing checksum byte.
/// Values of this type only exist on the far side of a successful
/// verification, so consumers never see a frame that might still be garbage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub(crate) raw: Bytes,
    pub(crate) payload: Bytes,
}

impl Frame {
    pub(crate) fn from_verified(raw: Bytes) -> Self {
        let payload = raw.slice(..raw.len() - 1);
        Frame { raw, payload }
    }

    /// Every logical byte of the frame, checksum included.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The checksum-covered bytes: start marker through the end of the
    /// packet region.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The declared packet-region length from the header.
    pub fn declared_len(&self) -> u8 {
        self.raw[1]
    }

    /// The verified trailing checksum byte.
    pub fn checksum(&self) -> u8 {
        self.raw[self.raw.len() - 1]
    }
}

/// Outcome of feeding one raw wire byte to the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResult {
    /// Byte consumed; the frame in progress is still incomplete.
    Pending,
    /// Byte discarded while hunting for a start marker.
    Skipped,
    /// The byte completed a frame and its checksum verified.
    Frame(Frame),
    /// The byte completed a frame whose checksum disagreed. The whole frame
    /// was dropped and the hunt for a start marker begins again.
    BadChecksum {
        /// Checksum computed over the received bytes.
        expected: u8,
        /// Trailer byte that arrived on the wire.
        actual: u8,
    },
}

/// Incremental frame assembler.
///
/// Feed raw wire bytes one at a time. Between frames the assembler skips
/// anything that is not the start marker; inside a frame every byte first
/// passes through the unescaper, and only emitted logical bytes accumulate.
/// The expected frame size is unknown until the length byte is held.
#[derive(Debug)]
pub struct FrameAssembler {
    layout: FrameLayout,
    unescaper: Unescaper,
    buffer: BytesMut,
    accumulating: bool,
}

impl FrameAssembler {
    /// Create an assembler for the given layout and escaping setup.
    pub fn new(layout: FrameLayout, escape: EscapeConfig) -> Self {
        FrameAssembler {
            layout,
            unescaper: Unescaper::new(escape),
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
            accumulating: false,
        }
    }

    /// Feed one raw wire byte.
    pub fn feed(&mut self, raw: u8) -> FeedResult {
        if !self.accumulating {
            if raw != self.layout.start_marker {
                return FeedResult::Skipped;
            }
            self.accumulating = true;
            self.unescaper.reset();
            self.buffer.clear();
            self.buffer.put_u8(raw);
            return FeedResult::Pending;
        }

        // Inside the body every raw byte runs through the unescaper first;
        // a held-back escape marker emits nothing.
        let Some(byte) = self.unescaper.feed(raw) else {
            return FeedResult::Pending;
        };
        self.buffer.put_u8(byte);

        let Some(total) = self.expected_total() else {
            return FeedResult::Pending;
        };
        if self.buffer.len() < total {
            return FeedResult::Pending;
        }

        // Frame complete. Verify, then reset to hunting either way.
        self.accumulating = false;
        let raw_frame = self.buffer.split().freeze();
        let trailer = raw_frame[raw_frame.len() - 1];
        let expected = frame_checksum(&raw_frame[..raw_frame.len() - 1]);
        if expected == trailer {
            FeedResult::Frame(Frame::from_verified(raw_frame))
        } else {
            FeedResult::BadChecksum {
                expected,
                actual: trailer,
            }
        }
    }

    fn expected_total(&self) -> Option<usize> {
        if self.buffer.len() < 2 {
            return None;
        }
        Some(self.layout.frame_size(self.buffer[1] as usize))
    }

    /// Logical bytes of the frame currently in progress.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Logical bytes still needed before the current frame completes, once
    /// the length byte has been seen.
    pub fn remaining(&self) -> Option<usize> {
        if !self.accumulating {
            return None;
        }
        self.expected_total().map(|total| total - self.buffer.len())
    }

    /// Drop any frame in progress and hunt for a start marker again.
    pub fn reset(&mut self) {
        self.accumulating = false;
        self.buffer.clear();
        self.unescaper.reset();
    }

    /// The layout this assembler parses.
    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }
}

/// Build a complete wire frame: header, packet region, checksum, escaping.
///
/// `packet` is the packet-type code followed by its fields; its length
/// becomes the declared length byte and must fit in one byte. The start
/// marker goes out bare; everything after it is escaped per `escape_config`.
pub fn encode_frame(
    layout: &FrameLayout,
    escape_config: &EscapeConfig,
    address: &ExtendedAddress,
    transaction_id: u8,
    control: u8,
    packet: &[u8],
) -> Vec<u8> {
    debug_assert!(packet.len() <= u8::MAX as usize);

    let mut logical = Vec::with_capacity(layout.frame_size(packet.len()));
    logical.push(layout.start_marker);
    logical.push(packet.len() as u8);
    logical.extend_from_slice(address.as_bytes());
    logical.push(transaction_id);
    logical.push(control);
    // Addressing blocks wider than address + transaction id + control pad
    // with zeros.
    logical.resize(2 + layout.addressing_len, 0);
    logical.extend_from_slice(packet);
    logical.push(frame_checksum(&logical));

    if !escape_config.is_enabled() {
        return logical;
    }
    let mut wire = Vec::with_capacity(logical.len() + 4);
    wire.push(logical[0]);
    wire.extend_from_slice(&escape(&logical[1..], escape_config));
    wire
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_address() -> ExtendedAddress {
        ExtendedAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08])
    }

    fn status_packet() -> Vec<u8> {
        // STATUS: reboot reason 0x02, serial of twelve 0xAA bytes.
        let mut packet = vec![0x03, 0x02];
        packet.extend_from_slice(&[0xAA; 12]);
        packet
    }

    fn feed_all(assembler: &mut FrameAssembler, data: &[u8]) -> Vec<FeedResult> {
        data.iter().map(|&b| assembler.feed(b)).collect()
    }

    #[test]
    fn test_encode_layout() {
        let layout = FrameLayout::default();
        let wire = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x01,
            0x00,
            &status_packet(),
        );

        assert_eq!(wire.len(), layout.frame_size(14));
        assert_eq!(wire[0], FRAME_START);
        assert_eq!(wire[1], 0x0E);
        assert_eq!(&wire[2..10], test_address().as_bytes());
        assert_eq!(wire[10], 0x01);
        assert_eq!(wire[11], 0x00);
        assert_eq!(wire[12], 0x03);
        // Trailer verifies over everything before it.
        assert_eq!(*wire.last().unwrap(), frame_checksum(&wire[..wire.len() - 1]));
    }

    #[test]
    fn test_assemble_single_frame() {
        let layout = FrameLayout::default();
        let wire = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x01,
            0x00,
            &status_packet(),
        );

        let mut assembler = FrameAssembler::new(layout, EscapeConfig::disabled());
        let results = feed_all(&mut assembler, &wire);

        // Every byte but the last leaves the frame pending.
        for result in &results[..results.len() - 1] {
            assert_eq!(*result, FeedResult::Pending);
        }
        match results.last().unwrap() {
            FeedResult::Frame(frame) => {
                assert_eq!(frame.raw(), &wire[..]);
                assert_eq!(frame.payload(), &wire[..wire.len() - 1]);
                assert_eq!(frame.declared_len(), 0x0E);
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_noise_skipped_before_start() {
        let layout = FrameLayout::default();
        let wire = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x01,
            0x00,
            &status_packet(),
        );

        let mut assembler = FrameAssembler::new(layout, EscapeConfig::disabled());
        assert_eq!(assembler.feed(0x00), FeedResult::Skipped);
        assert_eq!(assembler.feed(0x42), FeedResult::Skipped);

        let results = feed_all(&mut assembler, &wire);
        assert!(matches!(results.last().unwrap(), FeedResult::Frame(_)));
    }

    #[test]
    fn test_bad_checksum_discards_and_resyncs() {
        let layout = FrameLayout::default();
        let mut wire = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x01,
            0x00,
            &status_packet(),
        );
        let good_trailer = *wire.last().unwrap();
        *wire.last_mut().unwrap() = good_trailer.wrapping_add(1);

        let mut assembler = FrameAssembler::new(layout.clone(), EscapeConfig::disabled());
        let results = feed_all(&mut assembler, &wire);
        match results.last().unwrap() {
            FeedResult::BadChecksum { expected, actual } => {
                assert_eq!(*expected, good_trailer);
                assert_eq!(*actual, good_trailer.wrapping_add(1));
            }
            other => panic!("expected a checksum failure, got {:?}", other),
        }
        assert_eq!(assembler.buffered_len(), 0);

        // The very next valid frame assembles cleanly.
        let good = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x02,
            0x00,
            &status_packet(),
        );
        let results = feed_all(&mut assembler, &good);
        assert!(matches!(results.last().unwrap(), FeedResult::Frame(_)));
    }

    #[test]
    fn test_two_frames_back_to_back() {
        let layout = FrameLayout::default();
        let mut burst = Vec::new();
        for transaction_id in [0x01, 0x02] {
            burst.extend_from_slice(&encode_frame(
                &layout,
                &EscapeConfig::disabled(),
                &test_address(),
                transaction_id,
                0x00,
                &status_packet(),
            ));
        }

        let mut assembler = FrameAssembler::new(layout.clone(), EscapeConfig::disabled());
        let frames: Vec<Frame> = feed_all(&mut assembler, &burst)
            .into_iter()
            .filter_map(|r| match r {
                FeedResult::Frame(f) => Some(f),
                _ => None,
            })
            .collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].payload()[layout.transaction_id_offset()], 0x01);
        assert_eq!(frames[1].payload()[layout.transaction_id_offset()], 0x02);
    }

    #[test]
    fn test_escaped_frame_round_trip() {
        // Address full of trigger bytes forces escape pairs on the wire.
        let layout = FrameLayout::default();
        let escape_config = EscapeConfig::standard();
        let address =
            ExtendedAddress::new([0xFE, 0x7D, 0x11, 0x13, 0x05, 0x06, 0x07, 0x08]);
        let wire = encode_frame(
            &layout,
            &escape_config,
            &address,
            0x01,
            0x00,
            &status_packet(),
        );
        assert!(wire.len() > layout.frame_size(14));

        let mut assembler = FrameAssembler::new(layout.clone(), escape_config);
        let results = feed_all(&mut assembler, &wire);
        match results.last().unwrap() {
            FeedResult::Frame(frame) => {
                assert_eq!(frame.raw().len(), layout.frame_size(14));
                assert_eq!(
                    &frame.payload()[layout.address_offset()..layout.address_offset() + 8],
                    address.as_bytes()
                );
            }
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_remaining_tracks_length_byte() {
        let layout = FrameLayout::default();
        let mut assembler = FrameAssembler::new(layout.clone(), EscapeConfig::disabled());

        assert_eq!(assembler.remaining(), None);
        assembler.feed(FRAME_START);
        // Length byte not held yet.
        assert_eq!(assembler.remaining(), None);
        assembler.feed(0x0E);
        assert_eq!(assembler.remaining(), Some(layout.frame_size(14) - 2));
    }

    #[test]
    fn test_reset_drops_partial_frame() {
        let layout = FrameLayout::default();
        let mut assembler = FrameAssembler::new(layout, EscapeConfig::disabled());
        assembler.feed(FRAME_START);
        assembler.feed(0x0E);
        assert_eq!(assembler.buffered_len(), 2);

        assembler.reset();
        assert_eq!(assembler.buffered_len(), 0);
        assert_eq!(assembler.feed(0xAA), FeedResult::Skipped);
    }

    #[test]
    fn test_wide_addressing_layout() {
        // Two reserved bytes between the control byte and the packet region.
        let layout = FrameLayout {
            start_marker: FRAME_START,
            addressing_len: ADDRESSING_LEN + 2,
        };
        let wire = encode_frame(
            &layout,
            &EscapeConfig::disabled(),
            &test_address(),
            0x01,
            0x00,
            &status_packet(),
        );
        assert_eq!(wire.len(), layout.frame_size(14));
        assert_eq!(wire[layout.packet_offset()], 0x03);
        assert_eq!(&wire[12..14], &[0x00, 0x00]);

        let mut assembler = FrameAssembler::new(layout, EscapeConfig::disabled());
        let results: Vec<FeedResult> = wire.iter().map(|&b| assembler.feed(b)).collect();
        assert!(matches!(results.last().unwrap(), FeedResult::Frame(_)));
    }
}
