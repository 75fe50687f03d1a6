//! Integration tests for the broadcast server: real WebSocket clients
//! against a server wired to in-memory backends.
//!
//! The in-memory store/bus/counter have the same observable semantics
//! as the Redis backend, which lets these tests assert on shared state
//! directly while exercising the full connect → toggle → fanout →
//! disconnect flow over actual sockets.

use std::sync::Arc;
use std::time::Duration;

use boxgrid::{BroadcastServerBuilder, NoopNotifier};
use boxgrid_protocol::Frame;
use boxgrid_store::{
    BitStore, Counter, MemoryBitStore, MemoryBus, MemoryCounter,
};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Handles to the shared backend a test server runs against.
struct TestBackend {
    store: Arc<MemoryBitStore>,
    counter: Arc<MemoryCounter>,
}

/// Starts a server on a random port with fresh in-memory backends.
/// Returns the address and the backend handles for assertions.
async fn start_server(canvas_bits: u32) -> (String, TestBackend) {
    let store = Arc::new(MemoryBitStore::new(canvas_bits));
    let bus = Arc::new(MemoryBus::new());
    let counter = Arc::new(MemoryCounter::new());
    counter.reset(0).await.expect("cold-start reset");

    let server = BroadcastServerBuilder::new()
        .bind("127.0.0.1:0")
        .canvas_bits(canvas_bits)
        .build(
            Arc::clone(&store),
            bus,
            Arc::clone(&counter),
            NoopNotifier,
        )
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, TestBackend { store, counter })
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

/// Connects a client and waits for its first player-count frame, so
/// tests can sequence connects deterministically.
async fn connect_and_sync(addr: &str, expected_count: u8) -> ClientWs {
    let mut ws = connect(addr).await;
    let frame = recv_frame(&mut ws).await;
    assert_eq!(
        frame,
        vec![0x20, 0x00, expected_count],
        "first frame after connect should be the player count"
    );
    ws
}

/// Receives the next binary frame, failing the test after 2 seconds.
async fn recv_frame(ws: &mut ClientWs) -> Vec<u8> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream should not end")
            .expect("websocket error");
        if let Message::Binary(data) = msg {
            return data.into();
        }
    }
}

/// Asserts that no frame arrives within a grace window.
async fn expect_silence(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

/// Polls the counter until it reaches `expected` (teardown runs in a
/// background task, so the decrement is eventually visible).
async fn wait_for_count(counter: &MemoryCounter, expected: i64) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if counter.get().await.expect("counter get") == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| {
        panic!("counter never reached {expected}");
    });
}

fn toggle_bytes(offset: u32, value: bool) -> Vec<u8> {
    Frame::toggle(offset, value)
        .encode()
        .expect("valid toggle")
        .to_vec()
}

const FULL_CANVAS: u32 = boxgrid_store::DEFAULT_CANVAS_BITS;

// =========================================================================
// Connect / disconnect
// =========================================================================

#[tokio::test]
async fn test_connect_receives_player_count_one() {
    let (addr, _backend) = start_server(FULL_CANVAS).await;

    let mut ws = connect(&addr).await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x01]);
}

#[tokio::test]
async fn test_second_connect_broadcasts_count_to_both() {
    let (addr, _backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;

    // The earlier client observes the new total too.
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    expect_silence(&mut ws_b).await;
}

#[tokio::test]
async fn test_disconnect_broadcasts_decremented_count() {
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    ws_b.close(None).await.expect("should close");

    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x01]);
    wait_for_count(&backend.counter, 1).await;
}

#[tokio::test]
async fn test_counter_equals_connects_minus_disconnects() {
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let _ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let mut ws_c = connect_and_sync(&addr, 3).await;

    ws_b.close(None).await.expect("should close");
    ws_c.close(None).await.expect("should close");

    // 3 connects, 2 disconnects, reset value 0: the count is 1.
    wait_for_count(&backend.counter, 1).await;
}

// =========================================================================
// Toggle fanout
// =========================================================================

#[tokio::test]
async fn test_toggle_fans_out_to_all_connections_including_sender() {
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    ws_a.send(Message::Binary(toggle_bytes(16, true).into()))
        .await
        .expect("should send");

    // Both clients receive the identical frame — the sender gets its
    // own toggle back through the bus like any other client.
    assert_eq!(recv_frame(&mut ws_a).await, toggle_bytes(16, true));
    assert_eq!(recv_frame(&mut ws_b).await, toggle_bytes(16, true));

    // And the canvas was written: bit 16 is the MSB of byte 2.
    let snap = backend.store.snapshot().await.expect("should snapshot");
    assert_eq!(snap[2], 0x80);
}

#[tokio::test]
async fn test_toggle_off_clears_the_bit() {
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let mut ws = connect_and_sync(&addr, 1).await;

    ws.send(Message::Binary(toggle_bytes(5, true).into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws).await, toggle_bytes(5, true));

    ws.send(Message::Binary(toggle_bytes(5, false).into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws).await, toggle_bytes(5, false));

    let snap = backend.store.snapshot().await.expect("should snapshot");
    assert_eq!(snap[0], 0);
}

// =========================================================================
// Bad input is contained to the message, not the connection
// =========================================================================

#[tokio::test]
async fn test_malformed_frame_is_dropped_and_connection_survives() {
    let (addr, _backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    // Two bytes: a protocol error, silently ignored.
    ws_a.send(Message::Binary(vec![0x00, 0x10].into()))
        .await
        .expect("should send");

    // The same connection still works afterwards.
    ws_a.send(Message::Binary(toggle_bytes(7, true).into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws_a).await, toggle_bytes(7, true));
    assert_eq!(recv_frame(&mut ws_b).await, toggle_bytes(7, true));
}

#[tokio::test]
async fn test_non_toggle_inbound_frame_is_ignored() {
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    // A client has no business announcing player counts; the frame is
    // dropped without a broadcast and without closing the connection.
    ws_a.send(Message::Binary(vec![0x20, 0x00, 0x05].into()))
        .await
        .expect("should send");

    expect_silence(&mut ws_b).await;
    assert_eq!(backend.counter.get().await.unwrap(), 2);
}

#[tokio::test]
async fn test_toggle_outside_canvas_is_dropped() {
    // A canvas of 1024 boxes: offset 2000 decodes fine but addresses
    // nothing.
    let (addr, backend) = start_server(1024).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    ws_a.send(Message::Binary(toggle_bytes(2000, true).into()))
        .await
        .expect("should send");

    expect_silence(&mut ws_b).await;
    let snap = backend.store.snapshot().await.expect("should snapshot");
    assert!(snap.iter().all(|&b| b == 0), "canvas must be untouched");
}

// =========================================================================
// Isolation between connections
// =========================================================================

#[tokio::test]
async fn test_one_client_closing_does_not_affect_another() {
    let (addr, _backend) = start_server(FULL_CANVAS).await;

    let mut ws_a = connect_and_sync(&addr, 1).await;
    let mut ws_b = connect_and_sync(&addr, 2).await;
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x02]);

    ws_b.close(None).await.expect("should close");
    let frame = recv_frame(&mut ws_a).await;
    assert_eq!(frame, vec![0x20, 0x00, 0x01]);

    // The surviving client can still toggle and hear itself.
    ws_a.send(Message::Binary(toggle_bytes(3, true).into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws_a).await, toggle_bytes(3, true));
}

#[tokio::test]
async fn test_scenario_known_bytes_apply_and_republish_identically() {
    // The canonical wire scenario: [0x00, 0x00, 0x10] is a toggle of
    // box 16 to off, and the republished frame is byte-identical.
    let (addr, backend) = start_server(FULL_CANVAS).await;

    let mut ws = connect_and_sync(&addr, 1).await;

    // Set the bit first so clearing it is observable.
    ws.send(Message::Binary(toggle_bytes(16, true).into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws).await, toggle_bytes(16, true));

    ws.send(Message::Binary(vec![0x00, 0x00, 0x10].into()))
        .await
        .expect("should send");
    assert_eq!(recv_frame(&mut ws).await, vec![0x00, 0x00, 0x10]);

    let snap = backend.store.snapshot().await.expect("should snapshot");
    assert_eq!(snap[2], 0, "box 16 should be off again");
}
