//! # Gateway Flows
//!
//! The assembled runtime served over a real TCP listener. Clients speak raw
//! HTTP/1.1 and read WebSocket frames directly off the socket.
//!
//! ## Flows Tested
//!
//! 1. **Upgrade**: valid parameters switch protocols and register the client
//! 2. **Rejection**: an empty id or unknown role never upgrades
//! 3. **Broadcast**: a posted question arrives as a text frame
//! 4. **Shutdown**: the signal closes sockets and drains the notifier
//! 5. **Metrics**: `/metrics` serves the Prometheus text format

#[cfg(test)]
mod tests {
    use std::io::Write as _;
    use std::net::SocketAddr;
    use std::time::Duration;

    use gateway_runtime::{GatewayConfig, GatewayRuntime, QueueWriter};
    use shared_types::Question;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;
    use tq_01_name_index::NameIndexApi;
    use tq_02_queue_notifier::ConnectionRegistry;

    const OPCODE_TEXT: u8 = 0x1;
    const OPCODE_CLOSE: u8 = 0x8;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Served {
        addr: SocketAddr,
        stop: oneshot::Sender<()>,
        server: JoinHandle<GatewayRuntime>,
        registry: ConnectionRegistry,
        writer: QueueWriter,
    }

    impl Served {
        /// Fire the shutdown signal and take the runtime back.
        async fn stop_serving(self) -> GatewayRuntime {
            let _ = self.stop.send(());
            self.server.await.unwrap()
        }
    }

    async fn serve(config: GatewayConfig) -> Served {
        tq_telemetry::register_metrics().unwrap();

        let mut runtime = GatewayRuntime::new(config).unwrap();
        runtime.start().await.unwrap();
        let registry = runtime.container().registry.clone();
        let writer = runtime.container().queue_writer();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();

        let server = tokio::spawn(async move {
            let signal = async move {
                let _ = stopped.await;
            };
            runtime.serve(listener, signal).await.unwrap();
            runtime
        });

        Served {
            addr,
            stop,
            server,
            registry,
            writer,
        }
    }

    async fn read_head(stream: &mut TcpStream) -> String {
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            stream.read_exact(&mut byte).await.unwrap();
            head.push(byte[0]);
        }
        String::from_utf8(head).unwrap()
    }

    async fn upgrade(addr: SocketAddr, query: &str) -> (TcpStream, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET /v1/ws?{query} HTTP/1.1\r\n\
             Host: {addr}\r\n\
             Connection: Upgrade\r\n\
             Upgrade: websocket\r\n\
             Sec-WebSocket-Version: 13\r\n\
             Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let head = read_head(&mut stream).await;
        (stream, head)
    }

    /// Read one unfragmented server frame: (opcode, payload).
    async fn read_frame(stream: &mut TcpStream) -> (u8, Vec<u8>) {
        let mut header = [0u8; 2];
        stream.read_exact(&mut header).await.unwrap();
        let opcode = header[0] & 0x0f;
        let len = match header[1] & 0x7f {
            126 => usize::from(stream.read_u16().await.unwrap()),
            127 => usize::try_from(stream.read_u64().await.unwrap()).unwrap(),
            n => usize::from(n),
        };
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.unwrap();
        (opcode, payload)
    }

    async fn read_json(stream: &mut TcpStream) -> serde_json::Value {
        let (opcode, payload) = tokio::time::timeout(Duration::from_secs(2), read_frame(stream))
            .await
            .unwrap();
        assert_eq!(opcode, OPCODE_TEXT);
        serde_json::from_slice(&payload).unwrap()
    }

    async fn wait_for_len(registry: &ConnectionRegistry, len: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while registry.len().await != len {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    fn status_line(head: &str) -> &str {
        head.lines().next().unwrap_or_default()
    }

    // =========================================================================
    // UPGRADE
    // =========================================================================

    #[tokio::test]
    async fn test_invalid_parameters_are_rejected() {
        let served = serve(GatewayConfig::default()).await;

        let (_, head) = upgrade(served.addr, "id=&role=teacher").await;
        assert!(status_line(&head).contains("400"), "{head}");

        let (_, head) = upgrade(served.addr, "id=t1&role=wizard").await;
        assert!(status_line(&head).contains("400"), "{head}");

        let (_, head) = upgrade(served.addr, "id=t1").await;
        assert!(status_line(&head).contains("400"), "{head}");

        assert!(served.registry.is_empty().await);
        served.stop_serving().await.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_client_disconnect_deregisters() {
        let served = serve(GatewayConfig::default()).await;

        let (stream, head) = upgrade(served.addr, "id=s1&role=student").await;
        assert!(status_line(&head).contains("101"), "{head}");
        wait_for_len(&served.registry, 1).await;

        drop(stream);
        wait_for_len(&served.registry, 0).await;

        served.stop_serving().await.shutdown().await.unwrap();
    }

    // =========================================================================
    // BROADCAST AND SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_question_flow_over_socket() {
        let served = serve(GatewayConfig::default()).await;

        let (mut teacher, head) = upgrade(served.addr, "id=t1&role=teacher").await;
        assert!(status_line(&head).contains("101"), "{head}");
        let (mut student, _) = upgrade(served.addr, "id=s2&role=student").await;
        wait_for_len(&served.registry, 2).await;

        served
            .writer
            .post_question(Question::for_student("s1"))
            .await
            .unwrap();
        let snapshot = read_json(&mut teacher).await;
        assert_eq!(snapshot["type"], "queueSnapshot");
        assert_eq!(snapshot["data"]["queue"][0]["id"], "s1");
        let waiting = read_json(&mut student).await;
        assert!(waiting["data"]["position"].is_null());

        served
            .writer
            .post_question(Question::for_student("s2"))
            .await
            .unwrap();
        let _ = read_json(&mut teacher).await;
        let position = read_json(&mut student).await;
        assert_eq!(position["data"]["position"], 2);
        assert_eq!(position["data"]["queueLength"], 2);

        let registry = served.registry.clone();
        let mut runtime = served.stop_serving().await;

        // The shutdown signal closes every socket.
        let (opcode, _) = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut teacher))
            .await
            .unwrap();
        assert_eq!(opcode, OPCODE_CLOSE);
        assert!(registry.is_empty().await);

        let summary = runtime.shutdown().await.unwrap();
        assert_eq!(summary.broadcasts, 2);
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let served = serve(GatewayConfig::default()).await;

        let mut stream = TcpStream::connect(served.addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(status_line(&response).contains("200"), "{response}");
        assert!(response.contains("tq_connections_active"));
        assert!(response.contains("tq_name_index_entries"));

        served.stop_serving().await.shutdown().await.unwrap();
    }

    // =========================================================================
    // SEEDED NAME INDEX
    // =========================================================================

    #[tokio::test]
    async fn test_identities_file_seeds_search() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":7,"names":["gh","Grace Hopper"]}},{{"id":8,"names":["gm","Grace Murray"]}}]"#
        )
        .unwrap();

        let config = GatewayConfig {
            identities_file: Some(file.path().to_path_buf()),
            ..GatewayConfig::default()
        };
        let mut runtime = GatewayRuntime::new(config).unwrap();
        runtime.start().await.unwrap();

        let index = &runtime.container().name_index;
        assert_eq!(index.search("GRA", None), vec![7, 8]);
        assert_eq!(index.search("hop", None), vec![7]);

        runtime.shutdown().await.unwrap();
    }
}
