//! Protocol constants
//!
//! These constants define the wire framing values, the packet-type codes
//! reported by sensor devices, and the command codes the host sends back
//! over the sniffer serial link.

// ============================================================================
// Framing
// ============================================================================

/// Marker byte that opens every frame on the wire.
pub const FRAME_START: u8 = 0xFE;
/// Escape marker: the next wire byte is XORed with [`ESCAPE_XOR`].
pub const ESCAPE_MARKER: u8 = 0x7D;
/// XOR applied to the byte following an escape marker.
pub const ESCAPE_XOR: u8 = 0x20;
/// Software flow control bytes, escaped when escaping is switched on.
pub const XON: u8 = 0x11;
/// See [`XON`].
pub const XOFF: u8 = 0x13;

/// Width of a device extended (IEEE) address.
pub const ADDRESS_LEN: usize = 8;
/// Bytes between the length byte and the packet region: extended address,
/// transaction id, control byte.
pub const ADDRESSING_LEN: usize = ADDRESS_LEN + 2;
/// Logical frame bytes not counted by the length byte: start marker, length
/// byte, addressing block, trailing checksum.
pub const FRAME_OVERHEAD: usize = 2 + ADDRESSING_LEN + 1;
/// Largest logical frame the length byte can declare.
pub const MAX_FRAME_SIZE: usize = u8::MAX as usize + FRAME_OVERHEAD;

// ============================================================================
// Packet-type Codes (device → host)
// ============================================================================

/// Boot report: reboot reason plus the device serial number.
pub const PKT_STATUS: u8 = 0x03;
/// Sensor data point: port readings, environment, battery, identity block.
pub const PKT_SDP: u8 = 0x05;
/// Network diagnostics: link quality, uptime, traffic counters, neighbors.
pub const PKT_NDP: u8 = 0x06;
/// Secure join request carrying the joining device's extended address.
pub const PKT_SJOIN_REQ: u8 = 0x09;
/// OTA: device asks whether a newer package is available.
pub const PKT_QUERY_NEXT_PACKAGE_REQ: u8 = 0x0B;
/// OTA: device asks for a block of the package image.
pub const PKT_PACKAGE_BLOCK_REQ: u8 = 0x0C;
/// OTA: device reports the end of a package transfer.
pub const PKT_PACKAGE_END_REQ: u8 = 0x0D;
/// Device asks the host for the current UTC time.
pub const PKT_TIME_REQ: u8 = 0x0F;
/// PAN configuration report: rotary switch, PAN id, security key.
pub const PKT_PANID: u8 = 0x13;
/// Echo of a remote console command and its output.
pub const PKT_REMOTE_CMD: u8 = 0x21;
/// Acknowledgement of a host command, by transaction id.
pub const PKT_ACK: u8 = 0x80;
/// Firmware debug report (error code). May carry extra context bytes.
pub const PKT_DBG_INFO: u8 = 0xD1;
/// Firmware debug report (error message).
pub const PKT_DBG_INFO_2: u8 = 0xDD;

// ============================================================================
// Command Codes (host → device)
// ============================================================================
//
// Each reply code is its request's packet-type code plus 0x10, and no reply
// code collides with a packet-type code above. The decoder relies on the two
// sets staying disjoint to tell a command echo from an unknown response.

/// Reply to [`PKT_TIME_REQ`]: current UTC time in seconds.
pub const CMD_TIME_SYNC: u8 = 0x1F;
/// Reply to [`PKT_SJOIN_REQ`]: approve the join.
pub const CMD_JOIN_APPROVAL: u8 = 0x19;
/// Reply to [`PKT_QUERY_NEXT_PACKAGE_REQ`]: describe the available package.
pub const CMD_PACKAGE_INFO: u8 = 0x1B;
/// Reply to [`PKT_PACKAGE_BLOCK_REQ`]: one block of the package image.
pub const CMD_PACKAGE_BLOCK: u8 = 0x1C;
/// Reply to [`PKT_PACKAGE_END_REQ`]: confirm the transfer result.
pub const CMD_PACKAGE_END: u8 = 0x1D;
