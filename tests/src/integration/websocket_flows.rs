//! # WebSocket Flows
//!
//! The WebSocket adapter wired to the notifier, with in-process channels
//! standing in for the socket halves.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::ws::Message;
    use futures::channel::mpsc as fmpsc;
    use futures::StreamExt;
    use shared_bus::InMemoryBroker;
    use shared_types::{ConnectionId, Question, Role};
    use tokio::task::JoinHandle;
    use tq_02_queue_notifier::adapters::serve_connection;
    use tq_02_queue_notifier::{
        ConnectionRegistry, FanoutNotifier, InMemoryQueueStore, PumpExit, WsState,
    };

    use gateway_runtime::QueueWriter;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    type ClientFrames = fmpsc::UnboundedSender<Result<Message, String>>;

    struct Client {
        frames: ClientFrames,
        received: fmpsc::UnboundedReceiver<Message>,
        served: JoinHandle<PumpExit>,
    }

    fn id(raw: &str) -> ConnectionId {
        ConnectionId::new(raw).unwrap()
    }

    fn connect(state: &WsState, raw_id: &str, role: Role) -> Client {
        let (sink, received) = fmpsc::unbounded::<Message>();
        let (frames, stream) = fmpsc::unbounded::<Result<Message, String>>();
        let served = tokio::spawn(serve_connection(
            sink,
            stream,
            id(raw_id),
            role,
            state.clone(),
        ));
        Client {
            frames,
            received,
            served,
        }
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

    async fn next_json(client: &mut Client) -> serde_json::Value {
        let message = tokio::time::timeout(Duration::from_secs(2), client.received.next())
            .await
            .unwrap()
            .unwrap();
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    // =========================================================================
    // BROADCAST OVER THE ADAPTER
    // =========================================================================

    #[tokio::test]
    async fn test_queue_change_reaches_socket_clients() {
        let registry = ConnectionRegistry::new();
        let state = WsState::new(registry.clone(), 8);
        let store = Arc::new(InMemoryQueueStore::new());
        let broker = Arc::new(InMemoryBroker::new());
        let writer = QueueWriter::new(store.clone(), broker.clone());

        let notifier = tokio::spawn(
            FanoutNotifier::new(registry.clone(), store.clone()).run(broker.consume().unwrap()),
        );

        let mut teacher = connect(&state, "t1", Role::Teacher);
        let mut student = connect(&state, "s2", Role::Student);
        wait_for_len(&registry, 2).await;

        writer.post_question(Question::for_student("s1")).await.unwrap();
        writer.post_question(Question::for_student("s2")).await.unwrap();

        let first = next_json(&mut teacher).await;
        assert_eq!(first["type"], "queueSnapshot");
        let second = next_json(&mut teacher).await;
        assert_eq!(second["data"]["queue"][1]["id"], "s2");

        let _ = next_json(&mut student).await;
        let position = next_json(&mut student).await;
        assert_eq!(position["data"]["position"], 2);
        assert_eq!(position["data"]["queueLength"], 2);

        // Client closes; the read pump deregisters it.
        student.frames.unbounded_send(Ok(Message::Close(None))).unwrap();
        assert_eq!(student.served.await.unwrap(), PumpExit::Closed);
        assert_eq!(registry.ids().await, vec![id("t1")]);

        broker.close();
        let summary = notifier.await.unwrap();
        assert_eq!(summary.broadcasts, 2);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_previous_socket() {
        let registry = ConnectionRegistry::new();
        let state = WsState::new(registry.clone(), 8);

        let mut old = connect(&state, "s1", Role::Student);
        wait_for_len(&registry, 1).await;
        let new = connect(&state, "s1", Role::Student);

        // The replaced socket is closed and its pump ends without touching
        // the new registration.
        assert_eq!(
            tokio::time::timeout(Duration::from_secs(2), old.served)
                .await
                .unwrap()
                .unwrap(),
            PumpExit::Closed
        );
        assert_eq!(old.received.next().await, Some(Message::Close(None)));
        assert_eq!(registry.len().await, 1);
        assert!(registry.contains(&id("s1")).await);

        drop(new.frames);
        assert_eq!(new.served.await.unwrap(), PumpExit::Closed);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_client_read_error_deregisters() {
        let registry = ConnectionRegistry::new();
        let state = WsState::new(registry.clone(), 8);

        let client = connect(&state, "t1", Role::Teacher);
        wait_for_len(&registry, 1).await;

        client
            .frames
            .unbounded_send(Err("connection reset".to_string()))
            .unwrap();
        assert!(matches!(
            client.served.await.unwrap(),
            PumpExit::ReadError(_)
        ));
        assert!(registry.is_empty().await);
    }

    // =========================================================================
    // BACKPRESSURE
    // =========================================================================

    #[tokio::test]
    async fn test_stalled_client_is_pruned() {
        let registry = ConnectionRegistry::new();
        let state = WsState::new(registry.clone(), 1);
        let store = Arc::new(InMemoryQueueStore::new());
        let broker = Arc::new(InMemoryBroker::new());
        let writer = QueueWriter::new(store.clone(), broker.clone());

        // Socket sink that is never drained.
        let (sink, _stalled) = fmpsc::channel::<Message>(0);
        let (_frames, stream) = fmpsc::unbounded::<Result<Message, String>>();
        let served = tokio::spawn(serve_connection(
            sink,
            stream,
            id("t1"),
            Role::Teacher,
            state.clone(),
        ));
        wait_for_len(&registry, 1).await;

        for n in 0..16 {
            writer
                .post_question(Question::for_student(format!("s{n}")))
                .await
                .unwrap();
        }
        broker.close();

        let summary = FanoutNotifier::new(registry.clone(), store)
            .run(broker.consume().unwrap())
            .await;
        assert_eq!(summary.pruned, 1);
        assert!(registry.is_empty().await);

        // Closing the transport ends the read pump as well.
        assert_eq!(
            tokio::time::timeout(Duration::from_secs(2), served)
                .await
                .unwrap()
                .unwrap(),
            PumpExit::Closed
        );
    }
}
