//! End-to-end tests: raw bytes in, decoded responses out of a live worker.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use wsnlink_listener::{
    spawn_listener, ChannelSource, ListenerConfig, ListenerStats, ReplaySource,
};
use wsnlink_protocol::{
    encode_frame, standard_registry, Command, DecodeError, DecodedResponse, EscapeConfig,
    ExtendedAddress, FrameLayout, ResponseDecoder, CMD_TIME_SYNC, PKT_STATUS,
};

type Outcomes = Arc<Mutex<Vec<Result<DecodedResponse, DecodeError>>>>;

fn test_address() -> ExtendedAddress {
    ExtendedAddress::new([0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08])
}

fn status_wire(transaction_id: u8, escape: &EscapeConfig) -> Vec<u8> {
    let mut packet = vec![PKT_STATUS, 0x02];
    packet.extend_from_slice(&[0xAA; 12]);
    encode_frame(
        &FrameLayout::default(),
        escape,
        &test_address(),
        transaction_id,
        0x00,
        &packet,
    )
}

fn decoder() -> ResponseDecoder {
    ResponseDecoder::new(standard_registry(), FrameLayout::default())
}

fn fast_config() -> ListenerConfig {
    ListenerConfig::default().with_poll_interval(Duration::from_millis(1))
}

fn collecting_consumer() -> (Outcomes, impl FnMut(Result<DecodedResponse, DecodeError>)) {
    let outcomes: Outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = outcomes.clone();
    (outcomes, move |outcome| sink.lock().unwrap().push(outcome))
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 5s");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_status_frame_end_to_end() {
    let (outcomes, consumer) = collecting_consumer();
    let source = ReplaySource::new(status_wire(0x01, &EscapeConfig::disabled()));
    let handle = spawn_listener(source, decoder(), consumer, fast_config()).unwrap();

    wait_for(|| !outcomes.lock().unwrap().is_empty());
    let stats = handle.halt().unwrap();

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    let response = outcomes[0].as_ref().unwrap();
    assert_eq!(response.packet_name, "STATUS");
    assert_eq!(response.address, test_address());
    assert_eq!(response.transaction_id, 0x01);
    assert_eq!(response.field("Reboot_Reason"), Some(&[0x02][..]));
    assert_eq!(response.field("Serial"), Some(&[0xAA; 12][..]));

    assert_eq!(stats.frames_delivered, 1);
    assert_eq!(stats.checksum_failures, 0);
}

#[test]
fn test_corrupted_frame_then_valid_frame() {
    let escape = EscapeConfig::disabled();
    let mut bytes = status_wire(0x01, &escape);
    let last = bytes.len() - 1;
    bytes[last] = bytes[last].wrapping_add(1);
    bytes.extend_from_slice(&status_wire(0x02, &escape));

    let (outcomes, consumer) = collecting_consumer();
    let handle =
        spawn_listener(ReplaySource::new(bytes), decoder(), consumer, fast_config()).unwrap();

    wait_for(|| !outcomes.lock().unwrap().is_empty());
    let stats = handle.halt().unwrap();

    // Only the valid frame arrives; the corrupted one died at the checksum.
    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].as_ref().unwrap().transaction_id, 0x02);
    assert_eq!(stats.checksum_failures, 1);
    assert_eq!(stats.frames_delivered, 1);
}

#[test]
fn test_burst_of_two_frames_in_order() {
    let escape = EscapeConfig::disabled();
    let mut burst = status_wire(0x01, &escape);
    burst.extend_from_slice(&status_wire(0x02, &escape));

    let (outcomes, consumer) = collecting_consumer();
    let handle =
        spawn_listener(ReplaySource::new(burst), decoder(), consumer, fast_config()).unwrap();

    wait_for(|| outcomes.lock().unwrap().len() >= 2);
    let stats = handle.halt().unwrap();

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].as_ref().unwrap().transaction_id, 0x01);
    assert_eq!(outcomes[1].as_ref().unwrap().transaction_id, 0x02);
    assert_eq!(stats.frames_delivered, 2);
}

#[test]
fn test_halt_before_any_bytes() {
    let (tx, source) = ChannelSource::channel();
    let (outcomes, consumer) = collecting_consumer();
    let handle = spawn_listener(source, decoder(), consumer, fast_config()).unwrap();

    let started = Instant::now();
    let stats = handle.halt().unwrap();

    // Prompt return, nothing delivered, and the classification holds.
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(stats, ListenerStats::default());
    assert!(stats.cancelled_before_start());

    // Bytes sent after the halt go nowhere. The worker has dropped its end
    // of the channel, so the send itself may already fail.
    let _ = tx.send(status_wire(0x01, &EscapeConfig::disabled()));
    thread::sleep(Duration::from_millis(20));
    assert!(outcomes.lock().unwrap().is_empty());
}

#[test]
fn test_cancel_via_token_finishes_worker() {
    let (_tx, source) = ChannelSource::channel();
    let (_outcomes, consumer) = collecting_consumer();
    let handle = spawn_listener(source, decoder(), consumer, fast_config()).unwrap();

    assert!(!handle.is_finished());
    handle.token().cancel();
    wait_for(|| handle.is_finished());

    let stats = handle.halt().unwrap();
    assert!(stats.cancelled_before_start());
}

#[test]
fn test_live_chunks_over_channel() {
    let escape = EscapeConfig::disabled();
    let wire = status_wire(0x07, &escape);
    let (tx, source) = ChannelSource::channel();
    let (outcomes, consumer) = collecting_consumer();
    let handle = spawn_listener(source, decoder(), consumer, fast_config()).unwrap();

    // Split one frame across three chunks with noise in front.
    tx.send(vec![0x99, 0x00]).unwrap();
    tx.send(wire[..5].to_vec()).unwrap();
    tx.send(wire[5..20].to_vec()).unwrap();
    tx.send(wire[20..].to_vec()).unwrap();

    wait_for(|| !outcomes.lock().unwrap().is_empty());
    let stats = handle.halt().unwrap();

    assert_eq!(outcomes.lock().unwrap().len(), 1);
    assert_eq!(stats.frames_delivered, 1);
    assert_eq!(stats.bytes_skipped, 2);
}

#[test]
fn test_command_echo_reported_to_consumer() {
    // A host command looped straight back at the listener.
    let wire = Command::TimeSync { utc_time: 0x1234 }.to_frame(
        &FrameLayout::default(),
        &EscapeConfig::disabled(),
        &test_address(),
        0x01,
        0x00,
    );

    let (outcomes, consumer) = collecting_consumer();
    let handle =
        spawn_listener(ReplaySource::new(wire), decoder(), consumer, fast_config()).unwrap();

    wait_for(|| !outcomes.lock().unwrap().is_empty());
    let stats = handle.halt().unwrap();

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(
        outcomes[0],
        Err(DecodeError::UnexpectedCommandEcho { id: CMD_TIME_SYNC })
    );
    assert_eq!(stats.decode_errors, 1);
    assert_eq!(stats.frames_delivered, 0);
}

#[test]
fn test_escaped_traffic_end_to_end() {
    // Run the wire with the classic escape set switched on; the address is
    // chosen to force escape pairs into the stream.
    let escape = EscapeConfig::standard();
    let address = ExtendedAddress::new([0xFE, 0x7D, 0x11, 0x13, 0x05, 0x06, 0x07, 0x08]);
    let mut packet = vec![PKT_STATUS, 0x02];
    packet.extend_from_slice(&[0xAA; 12]);
    let wire = encode_frame(
        &FrameLayout::default(),
        &escape,
        &address,
        0x03,
        0x00,
        &packet,
    );

    let (outcomes, consumer) = collecting_consumer();
    let config = fast_config().with_escape(escape);
    let handle = spawn_listener(ReplaySource::new(wire), decoder(), consumer, config).unwrap();

    wait_for(|| !outcomes.lock().unwrap().is_empty());
    handle.halt().unwrap();

    let outcomes = outcomes.lock().unwrap();
    let response = outcomes[0].as_ref().unwrap();
    assert_eq!(response.address, address);
    assert_eq!(response.transaction_id, 0x03);
}
