//! Frame checksum.
//!
//! One byte trails every frame: 0xFF minus the low byte of the sum of every
//! preceding logical frame byte, start marker and length byte included. A
//! frame whose trailer disagrees is dropped whole by the assembler.

/// Compute the checksum over the checksum-covered bytes of a frame.
pub fn frame_checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0xFF - sum
}

/// Check a received trailer byte against the bytes it covers.
pub fn verify_checksum(payload: &[u8], candidate: u8) -> bool {
    frame_checksum(payload) == candidate
}
