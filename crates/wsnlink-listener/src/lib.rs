//! Background listener for the WSN sniffer serial link.
//!
//! This crate wires a byte source (live transport thread or a replayed
//! capture) to the `wsnlink-protocol` engine: a dedicated worker thread
//! polls the source, assembles and verifies frames, decodes them against
//! the packet registry, and delivers every outcome to a consumer callback
//! in wire order.
//!
//! # Example
//!
//! ```rust,ignore
//! use wsnlink_listener::{spawn_listener, ListenerConfig, ReplaySource};
//! use wsnlink_protocol::{standard_registry, FrameLayout, ResponseDecoder};
//!
//! let decoder = ResponseDecoder::new(standard_registry(), FrameLayout::default());
//! let handle = spawn_listener(
//!     ReplaySource::new(captured_bytes),
//!     decoder,
//!     |outcome| println!("{:?}", outcome),
//!     ListenerConfig::default(),
//! )?;
//!
//! // ... later
//! let stats = handle.halt().expect("listener worker panicked");
//! println!("{} responses", stats.frames_delivered);
//! ```

mod listener;
mod source;

pub use listener::*;
pub use source::*;
