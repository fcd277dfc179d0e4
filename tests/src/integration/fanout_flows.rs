//! # Fan-out Flows
//!
//! Queue writes travelling through the broker to registered connections:
//!
//! ```text
//! QueueWriter ──store + publish──→ InMemoryBroker ──Delivery──→ FanoutNotifier
//!                                                                   │
//!                               teacher: queueSnapshot ←────────────┤
//!                               student: studentPosition ←──────────┘
//! ```

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use gateway_runtime::QueueWriter;
    use shared_bus::{DeliverySource, InMemoryBroker, MessagePublisher};
    use shared_types::{ConnectionId, Question, Role};
    use tq_02_queue_notifier::testing::{CountingObserver, FailingTransport, RecordingTransport};
    use tq_02_queue_notifier::{
        ConnectionRegistry, DeliveryOutcome, FanoutNotifier, InMemoryQueueStore,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Harness {
        registry: ConnectionRegistry,
        store: Arc<InMemoryQueueStore>,
        broker: Arc<InMemoryBroker>,
        writer: QueueWriter,
        observer: Arc<CountingObserver>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(InMemoryQueueStore::new());
            let broker = Arc::new(InMemoryBroker::new());
            Self {
                registry: ConnectionRegistry::new(),
                writer: QueueWriter::new(store.clone(), broker.clone()),
                store,
                broker,
                observer: Arc::new(CountingObserver::default()),
            }
        }

        fn notifier(&self) -> FanoutNotifier<InMemoryQueueStore> {
            FanoutNotifier::new(self.registry.clone(), self.store.clone())
                .with_observer(self.observer.clone())
        }

        async fn connect(&self, id: &str, role: Role) -> Arc<RecordingTransport> {
            let transport = Arc::new(RecordingTransport::new());
            self.registry
                .insert(ConnectionId::new(id).unwrap(), role, transport.clone())
                .await;
            transport
        }
    }

    fn question(student: &str, topic: &str) -> Question {
        Question {
            topic: topic.to_string(),
            ..Question::for_student(student)
        }
    }

    // =========================================================================
    // ROLE PAYLOADS
    // =========================================================================

    #[tokio::test]
    async fn test_each_role_receives_its_view() {
        let h = Harness::new();
        let teacher = h.connect("teacher-1", Role::Teacher).await;
        let first = h.connect("s1", Role::Student).await;
        let second = h.connect("s2", Role::Student).await;
        let waiting = h.connect("s9", Role::Student).await;

        h.writer.post_question(question("s1", "recursion")).await.unwrap();
        h.writer.post_question(question("s2", "pointers")).await.unwrap();
        h.broker.close();

        let summary = h.notifier().run(h.broker.consume().unwrap()).await;
        assert_eq!(summary.broadcasts, 2);
        assert_eq!(summary.pruned, 0);

        let snapshot = teacher.last_json().unwrap();
        assert_eq!(snapshot["type"], "queueSnapshot");
        assert_eq!(snapshot["data"]["queue"][0]["id"], "s1");
        assert_eq!(snapshot["data"]["queue"][0]["topic"], "recursion");
        assert_eq!(snapshot["data"]["queue"][1]["id"], "s2");

        let s1 = first.last_json().unwrap();
        assert_eq!(s1["type"], "studentPosition");
        assert_eq!(s1["data"]["position"], 1);
        assert_eq!(s1["data"]["queueLength"], 2);

        let s2 = second.last_json().unwrap();
        assert_eq!(s2["data"]["position"], 2);

        let s9 = waiting.last_json().unwrap();
        assert!(s9["data"]["position"].is_null());
        assert_eq!(s9["data"]["queueLength"], 2);

        // Students never see other students' question details.
        assert!(!first.frames().iter().any(|frame| frame.contains("pointers")));
    }

    #[tokio::test]
    async fn test_resolve_moves_everyone_up() {
        let h = Harness::new();
        let student = h.connect("s3", Role::Student).await;

        for id in ["s1", "s2", "s3"] {
            h.writer.post_question(Question::for_student(id)).await.unwrap();
        }
        h.writer.resolve_question("s1").await.unwrap();
        h.broker.close();

        h.notifier().run(h.broker.consume().unwrap()).await;

        let view = student.last_json().unwrap();
        assert_eq!(view["data"]["position"], 2);
        assert_eq!(view["data"]["queueLength"], 2);
    }

    #[tokio::test]
    async fn test_clear_reports_empty_queue() {
        let h = Harness::new();
        let teacher = h.connect("t", Role::Teacher).await;

        h.writer.post_question(Question::for_student("s1")).await.unwrap();
        assert_eq!(h.writer.clear_queue().await.unwrap(), 1);
        h.broker.close();

        h.notifier().run(h.broker.consume().unwrap()).await;

        let snapshot = teacher.last_json().unwrap();
        assert_eq!(snapshot["data"]["queue"].as_array().map(Vec::len), Some(0));
    }

    // =========================================================================
    // FAILURE ISOLATION
    // =========================================================================

    #[tokio::test]
    async fn test_broken_connection_is_pruned_without_affecting_others() {
        let h = Harness::new();
        let teacher = h.connect("t", Role::Teacher).await;
        let broken = Arc::new(FailingTransport::new());
        h.registry
            .insert(ConnectionId::new("s1").unwrap(), Role::Student, broken.clone())
            .await;

        h.writer.post_question(Question::for_student("s1")).await.unwrap();
        h.writer.post_question(Question::for_student("s2")).await.unwrap();
        h.broker.close();

        let summary = h.notifier().run(h.broker.consume().unwrap()).await;

        assert_eq!(summary.pruned, 1);
        assert_eq!(broken.attempts(), 1);
        assert!(broken.is_closed());
        assert_eq!(teacher.frames().len(), 2);
        assert_eq!(h.registry.ids().await, vec![ConnectionId::new("t").unwrap()]);
        assert_eq!(h.observer.pruned.load(Ordering::SeqCst), 1);
        assert_eq!(h.observer.active.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_event_is_acked_and_dropped() {
        let h = Harness::new();
        let teacher = h.connect("t", Role::Teacher).await;

        h.broker.publish(b"{not json".to_vec()).await.unwrap();
        h.writer.post_question(Question::for_student("s1")).await.unwrap();
        h.broker.close();

        let summary = h.notifier().run(h.broker.consume().unwrap()).await;

        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.broadcasts, 1);
        assert_eq!(teacher.frames().len(), 1);
        assert_eq!(h.broker.unacked_count(), 0);
        assert_eq!(h.broker.acked_count(), 2);
    }

    // =========================================================================
    // ACKNOWLEDGEMENT AND REDELIVERY
    // =========================================================================

    #[tokio::test]
    async fn test_unsettled_delivery_is_redelivered_and_rebroadcast() {
        let h = Harness::new();
        let teacher = h.connect("t", Role::Teacher).await;
        let mut consumer = h.broker.consume().unwrap();

        h.writer.post_question(Question::for_student("s1")).await.unwrap();

        // Consumer crashes before settling the delivery.
        let lost = consumer.recv().await.unwrap();
        assert!(!lost.redelivered());
        drop(lost);
        assert_eq!(h.broker.unacked_count(), 1);

        assert_eq!(h.broker.recover().await.unwrap(), 1);
        let again = consumer.recv().await.unwrap();
        assert!(again.redelivered());

        let outcome = h.notifier().handle_delivery(again).await;
        assert_eq!(
            outcome,
            DeliveryOutcome::Broadcast {
                delivered: 1,
                pruned: 0
            }
        );
        assert_eq!(h.broker.unacked_count(), 0);
        assert_eq!(teacher.last_json().unwrap()["data"]["queue"][0]["id"], "s1");
    }

    #[tokio::test]
    async fn test_notifier_stops_when_broker_closes() {
        let h = Harness::new();
        let consumer = h.broker.consume().unwrap();
        let task = tokio::spawn(h.notifier().run(consumer));

        h.writer.post_question(Question::for_student("s1")).await.unwrap();
        h.broker.close();

        let summary = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(summary.deliveries, 1);
        assert!(h.writer.post_question(Question::for_student("s2")).await.is_err());
    }
}
