//! The listener worker.
//!
//! One dedicated thread owns the byte source, the frame assembler, and the
//! decoder. It polls the source, feeds bytes through the assembler one at a
//! time, and hands every decode outcome to the consumer callback in wire
//! order. Checksum failures are counted and logged here and never reach the
//! consumer. Only a cancelled token ends the loop.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wsnlink_protocol::{
    DecodeError, DecodedResponse, EscapeConfig, FeedResult, FrameAssembler, FrameLayout,
    ResponseDecoder,
};

use crate::source::ByteSource;

/// Shared stop flag between a listener worker and its owner.
///
/// Cloning hands out another owner of the same flag; any of them may cancel.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the worker to stop at its next loop iteration.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether a cancel has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Listener tuning knobs.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// How long to sleep when the source has nothing to read.
    pub poll_interval: Duration,
    /// Name for the worker thread.
    pub thread_name: String,
    /// Frame layout the assembler parses.
    pub layout: FrameLayout,
    /// Escaping applied on the wire.
    pub escape: EscapeConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        ListenerConfig {
            poll_interval: Duration::from_millis(10),
            thread_name: "wsnlink-listener".to_string(),
            layout: FrameLayout::default(),
            escape: EscapeConfig::default(),
        }
    }
}

impl ListenerConfig {
    /// Set the idle poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the frame layout.
    pub fn with_layout(mut self, layout: FrameLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the wire escaping.
    pub fn with_escape(mut self, escape: EscapeConfig) -> Self {
        self.escape = escape;
        self
    }
}

/// Counters a listener run leaves behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Responses handed to the consumer as `Ok`.
    pub frames_delivered: u64,
    /// Frames dropped whole for a bad checksum.
    pub checksum_failures: u64,
    /// Completed frames the decoder rejected (delivered as `Err`).
    pub decode_errors: u64,
    /// Noise bytes discarded while hunting for a start marker.
    pub bytes_skipped: u64,
}

impl ListenerStats {
    /// True when the run ended before a single response was delivered.
    pub fn cancelled_before_start(&self) -> bool {
        self.frames_delivered == 0
    }
}

/// Run the listener loop on the current thread until the token cancels.
///
/// Exposed separately from [`spawn_listener`] so tests and replay tooling
/// can drive the loop synchronously. The token is checked once per byte
/// cycle, so a cancel is honored within one poll interval plus one read,
/// even mid-frame; a partial frame in the assembler is simply dropped.
pub fn run_listener<S, F>(
    mut source: S,
    decoder: &ResponseDecoder,
    mut consumer: F,
    token: &CancelToken,
    config: &ListenerConfig,
) -> ListenerStats
where
    S: ByteSource,
    F: FnMut(Result<DecodedResponse, DecodeError>),
{
    let mut assembler = FrameAssembler::new(config.layout.clone(), config.escape.clone());
    let mut stats = ListenerStats::default();

    loop {
        if token.is_cancelled() {
            break;
        }

        if source.available() == 0 {
            thread::sleep(config.poll_interval);
            continue;
        }

        let byte = match source.read_byte() {
            Ok(byte) => byte,
            Err(err) => {
                log::warn!("byte source read failed: {}", err);
                // Back off before retrying so a wedged source cannot spin.
                thread::sleep(config.poll_interval);
                continue;
            }
        };

        match assembler.feed(byte) {
            FeedResult::Pending => {}
            FeedResult::Skipped => {
                stats.bytes_skipped += 1;
                log::trace!("skipped noise byte 0x{:02X} while hunting for frame start", byte);
            }
            FeedResult::BadChecksum { expected, actual } => {
                stats.checksum_failures += 1;
                log::warn!(
                    "frame dropped: checksum 0x{:02X} on the wire, computed 0x{:02X}",
                    actual,
                    expected
                );
            }
            FeedResult::Frame(frame) => match decoder.decode(&frame) {
                Ok(response) => {
                    stats.frames_delivered += 1;
                    log::trace!(
                        "{} response from {}",
                        response.packet_name,
                        response.address
                    );
                    consumer(Ok(response));
                }
                Err(err) => {
                    stats.decode_errors += 1;
                    consumer(Err(err));
                }
            },
        }
    }

    if stats.cancelled_before_start() {
        log::debug!("listener cancelled before any response was delivered");
    }
    stats
}

/// Handle to a running listener worker.
///
/// Held by whoever spawned the listener to stop it and collect its run
/// statistics.
pub struct ListenerHandle {
    token: CancelToken,
    thread: JoinHandle<ListenerStats>,
}

impl ListenerHandle {
    /// The worker's cancellation token. Clone it to cancel from elsewhere.
    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    /// Check if the worker has exited (normally or by panic).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop the worker and collect its run statistics.
    ///
    /// Returns within a bounded delay: the loop re-checks the token at least
    /// once per poll interval and never blocks in a read.
    pub fn halt(self) -> thread::Result<ListenerStats> {
        self.token.cancel();
        self.thread.join()
    }
}

/// Spawn the listener loop on its own named thread.
///
/// The consumer is invoked on the worker thread, synchronously, once per
/// completed frame and in wire order; it should return promptly.
pub fn spawn_listener<S, F>(
    source: S,
    decoder: ResponseDecoder,
    consumer: F,
    config: ListenerConfig,
) -> io::Result<ListenerHandle>
where
    S: ByteSource + Send + 'static,
    F: FnMut(Result<DecodedResponse, DecodeError>) + Send + 'static,
{
    let token = CancelToken::new();
    let worker_token = token.clone();
    let thread = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || run_listener(source, &decoder, consumer, &worker_token, &config))?;
    Ok(ListenerHandle { token, thread })
}
