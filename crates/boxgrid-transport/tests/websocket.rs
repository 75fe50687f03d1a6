//! Integration tests for the WebSocket transport.
//!
//! These spin up a real WebSocket server and client to verify that
//! binary messages actually flow over the network correctly.

#[cfg(feature = "websocket")]
mod websocket {
    use boxgrid_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    /// Helper: connects a tokio-tungstenite client to the given address.
    async fn connect_client(
        addr: &str,
    ) -> tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    > {
        let url = format!("ws://{addr}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        // "127.0.0.1:0" tells the OS to pick an available port;
        // local_addr() reports which one it chose.
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);

        // --- Server sends, client receives ---
        server_conn
            .send(&[0x00, 0x00, 0x10])
            .await
            .expect("send should succeed");

        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), &[0x00, 0x00, 0x10]);

        // --- Client sends, server receives ---
        client_ws
            .send(Message::Binary(vec![0x10, 0x00, 0x05].into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, vec![0x10, 0x00, 0x05]);

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws.send(Message::Close(None)).await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_recv_skips_text_messages() {
        // The wire protocol is binary-only: a text message must not be
        // surfaced as frame bytes, the next binary message must be.
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();

        client_ws
            .send(Message::Text("not a frame".into()))
            .await
            .unwrap();
        client_ws
            .send(Message::Binary(vec![0x20, 0x00, 0x01].into()))
            .await
            .unwrap();

        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, vec![0x20, 0x00, 0x01]);
    }

    #[tokio::test]
    async fn test_websocket_clones_share_one_socket() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client_ws = connect_client(&addr).await;
        let server_conn = server_handle.await.unwrap();
        let clone = server_conn.clone();

        assert_eq!(server_conn.id(), clone.id());

        // A message sent through the clone arrives on the same client.
        clone.send(&[1, 2, 3]).await.expect("send should succeed");
        let msg = client_ws.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), &[1, 2, 3]);
    }
}
