//! WSN Sniffer Serial Protocol
//!
//! This crate provides the framing and decoding engine for the serial link
//! between a wireless-sensor-network sniffer dongle and the host. The dongle
//! relays device packets as framed messages; the host answers device
//! requests (time, join approval, update packages) with framed commands.
//!
//! # Protocol Overview
//!
//! Every frame starts with a marker byte, carries a one-byte length that
//! counts only the packet region, a ten-byte addressing block, the packet
//! region itself, and a one-byte checksum over everything before it:
//!
//! ```text
//! +-------+-----+------------------+---------+------+-------------------+--------+
//! | start | len | ext address[8]   | transid | ctrl | id + fields (len) | chksum |
//! +-------+-----+------------------+---------+------+-------------------+--------+
//! ```
//!
//! Receiving is a three-stage pipe:
//!
//! - [`FrameAssembler`] turns a noisy raw byte stream into checksum-verified
//!   [`Frame`]s, skipping garbage and optionally unescaping.
//! - [`ResponseDecoder`] looks the packet-type code up in a
//!   [`SchemaRegistry`] and slices the packet region into named fields.
//! - [`Command`] values encode the host's replies back into wire frames.
//!
//! # Example
//!
//! ```rust,ignore
//! use wsnlink_protocol::{
//!     standard_registry, EscapeConfig, FeedResult, FrameAssembler, FrameLayout,
//!     ResponseDecoder,
//! };
//!
//! let layout = FrameLayout::default();
//! let mut assembler = FrameAssembler::new(layout.clone(), EscapeConfig::disabled());
//! let decoder = ResponseDecoder::new(standard_registry(), layout);
//!
//! for byte in received {
//!     if let FeedResult::Frame(frame) = assembler.feed(byte) {
//!         let response = decoder.decode(&frame)?;
//!         println!("{} from {}", response.packet_name, response.address);
//!     }
//! }
//! ```

mod checksum;
mod commands;
mod constants;
mod decode;
mod error;
mod escape;
mod frame;
mod schema;
mod types;

pub use checksum::*;
pub use commands::*;
pub use constants::*;
pub use decode::*;
pub use error::*;
pub use escape::*;
pub use frame::*;
pub use schema::*;
pub use types::*;
