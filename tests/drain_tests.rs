//! Kernel flush and active drain of stale modem output.

mod common;

use at_tty::at::DRAIN_WINDOW;
use at_tty::{Channel, MockSerialPort, ReadOutcome};
use common::{fast_profile, mock_channel};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_drain_reports_discarded_output() {
    let (mut channel, modem) = mock_channel(&fast_profile(200));
    modem.enqueue_in_flight(b"+CMTI: \"SM\",3\r\nRING\r\n");
    modem.enqueue_in_flight(b"half a li");

    let report = channel.drain_modem_buffers().unwrap();
    assert_eq!(report.lines, 3);
    assert_eq!(report.bytes, 15 + 6 + 9);
    assert!(report.elapsed < DRAIN_WINDOW);
    assert_eq!(modem.available_bytes(), 0);
}

#[test]
fn test_drain_on_clean_modem() {
    let (mut channel, modem) = mock_channel(&fast_profile(200));
    let before = modem.clear_count();

    let report = channel.drain_modem_buffers().unwrap();
    assert_eq!(report.lines, 0);
    assert_eq!(report.bytes, 0);
    // One flush before the drain and one after.
    assert_eq!(modem.clear_count(), before + 2);
}

#[test]
fn test_drain_leaves_later_output_alone() {
    let (mut channel, modem) = mock_channel(&fast_profile(500));
    modem.enqueue_in_flight(b"RING\r\n");
    modem.enqueue_read_after(Duration::from_millis(50), b"OK\r\n");

    let report = channel.drain_modem_buffers().unwrap();
    assert_eq!(report.lines, 1);

    let response = channel.read();
    assert_eq!(response.outcome, ReadOutcome::Success);
    assert_eq!(response.message.unwrap().as_bytes(), b"OK\r\n");
}

#[test]
fn test_drain_stops_on_read_error() {
    let (mut channel, modem) = mock_channel(&fast_profile(200));
    modem.enqueue_in_flight(b"RING\r\n");
    modem.fail_reads(true);

    let report = channel.drain_modem_buffers().unwrap();
    assert_eq!(report.lines, 0);
}

#[test]
fn test_drain_bounded_under_constant_chatter() {
    let (mut channel, modem) = mock_channel(&fast_profile(200));
    modem.start_chatter(b"RING\r\n", Duration::from_millis(1));

    let report = channel.drain_modem_buffers().unwrap();
    assert!(report.elapsed <= DRAIN_WINDOW + Duration::from_millis(100));
}

#[test]
fn test_open_with_clear_flag_drains() {
    let port = MockSerialPort::new("MOCK0");
    port.enqueue_in_flight(b"+CREG: 1,5\r\nOK\r\n");
    let handle = port.clone();

    let profile = fast_profile(100).with_clear_modem_side_buffers(true);
    let mut channel = Channel::from_port(port, &profile);

    assert_eq!(handle.available_bytes(), 0);
    assert_eq!(handle.clear_count(), 2);
    assert_eq!(channel.read().outcome, ReadOutcome::CommError);
}

#[test]
fn test_open_without_clear_flag_only_flushes() {
    let port = MockSerialPort::new("MOCK0");
    port.enqueue_in_flight(b"OK\r\n");
    let handle = port.clone();

    let mut channel = Channel::from_port(port, &fast_profile(200));

    assert_eq!(handle.clear_count(), 1);
    // In-flight output survives a kernel flush and is read as a response.
    assert_eq!(channel.read().outcome, ReadOutcome::Success);
}

#[test]
fn test_flush_clears_kernel_queues() {
    let (mut channel, modem) = mock_channel(&fast_profile(200));
    modem.enqueue_read(b"RING\r\n");
    let before = modem.clear_count();

    channel.flush_kernel_buffers().unwrap();
    assert_eq!(modem.clear_count(), before + 1);
    assert_eq!(modem.available_bytes(), 0);
}
