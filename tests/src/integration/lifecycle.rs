//! # Subscription Lifecycle
//!
//! End-to-end coverage of how subscriptions end: fatal platform errors,
//! kicks from newer subscribers, forced reconnects, and shutdown. Each test
//! asserts both sides of the contract: what the remote caller sees, and
//! what arrives on the subscription's `done` channel.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::future::join_all;
    use tokio::sync::{oneshot, watch};
    use tokio::time::{sleep, timeout, Instant};

    use backhaul_bus::{
        BusConfig, Connecter, LoggedPlatform, MemoryTransport, Subscriber, SubscriptionError,
    };
    use backhaul_types::testing::MockPlatform;
    use backhaul_types::{
        Cause, InstanceId, Platform, PlatformError, ReleaseKind, ResourceSpec, UpdateChange,
        UpdateSpec,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn test_config() -> BusConfig {
        BusConfig::new().with_call_timeout(Duration::from_secs(1))
    }

    fn connecter(bus: &MemoryTransport, config: BusConfig) -> Connecter {
        Connecter::new(Arc::new(bus.clone()), config)
    }

    async fn subscribe_on(
        bus: &MemoryTransport,
        config: BusConfig,
        instance: &str,
        platform: Arc<dyn Platform>,
    ) -> (
        watch::Sender<bool>,
        oneshot::Receiver<Result<(), SubscriptionError>>,
    ) {
        crate::init_tracing();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (done_tx, done_rx) = oneshot::channel();
        Subscriber::new(Arc::new(bus.clone()), config)
            .subscribe(shutdown_rx, InstanceId::new(instance), platform, done_tx)
            .await
            .expect("subscribe");
        (shutdown_tx, done_rx)
    }

    fn release_spec() -> UpdateSpec {
        UpdateSpec {
            cause: Cause {
                message: "release frontend 1.2.1".into(),
                user: "release-bot@example.com".into(),
            },
            change: UpdateChange::ReleaseImage {
                service_specs: vec![ResourceSpec::all()],
                image_spec: "registry.example.com/frontend:1.2.1".into(),
                kind: ReleaseKind::Execute,
                excludes: vec![],
            },
        }
    }

    // =============================================================================
    // FATAL ERRORS
    // =============================================================================

    #[tokio::test]
    async fn test_fatal_ping_ends_subscription_with_the_message() {
        let bus = MemoryTransport::new();
        let platform = Arc::new(
            MockPlatform::new().failing("Ping", PlatformError::fatal("ping problem")),
        );
        let (_shutdown, done) =
            subscribe_on(&bus, test_config(), "wirey-bird-68", platform).await;

        let caller = connecter(&bus, test_config());
        let err = caller
            .ping(&InstanceId::new("wirey-bird-68"))
            .await
            .expect_err("fatal ping should fail the call");
        assert_eq!(err.to_string(), "ping problem");

        let outcome = timeout(Duration::from_millis(100), done)
            .await
            .expect("done within 100ms")
            .expect("done sender kept");
        match outcome.expect_err("fatal outcome") {
            SubscriptionError::Fatal(message) => assert_eq!(message, "ping problem"),
            other => panic!("expected Fatal, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_list_services_errors_call_and_done() {
        let bus = MemoryTransport::new();
        // Wrapped in the tracing middleware the way an agent binary would be.
        let platform = Arc::new(LoggedPlatform::new(
            MockPlatform::new().failing("ListServices", PlatformError::fatal("disaster")),
        ));
        let (_shutdown, done) =
            subscribe_on(&bus, test_config(), "golden-years-75", platform).await;

        let stub = connecter(&bus, test_config()).connect(InstanceId::new("golden-years-75"));
        let err = timeout(Duration::from_secs(1), stub.list_services("default".into()))
            .await
            .expect("call returns within 1s")
            .expect_err("fatal should fail the call");
        assert_eq!(err.to_string(), "disaster");

        let outcome = timeout(Duration::from_secs(1), done)
            .await
            .expect("done within 1s")
            .expect("done sender kept");
        assert!(matches!(
            outcome.expect_err("fatal outcome"),
            SubscriptionError::Fatal(message) if message == "disaster"
        ));
    }

    #[tokio::test]
    async fn test_concurrent_fatals_deliver_one_outcome() {
        let bus = MemoryTransport::new();
        let platform = Arc::new(
            MockPlatform::new().failing("Ping", PlatformError::fatal("meltdown")),
        );
        let (_shutdown, done) =
            subscribe_on(&bus, test_config(), "many-fatals", platform).await;

        let caller = connecter(&bus, test_config());
        let id = InstanceId::new("many-fatals");
        let probes = (0..5).map(|_| caller.ping(&id));
        for result in join_all(probes).await {
            // Losers of the teardown race see the agent as gone instead.
            result.expect_err("every ping should fail");
        }

        let outcome = timeout(Duration::from_secs(1), done)
            .await
            .expect("done within 1s")
            .expect("done sender kept");
        assert!(matches!(
            outcome.expect_err("fatal outcome"),
            SubscriptionError::Fatal(message) if message == "meltdown"
        ));
    }

    // =============================================================================
    // KICKS
    // =============================================================================

    #[tokio::test]
    async fn test_resubscribe_kicks_previous_owner_only() {
        let bus = MemoryTransport::new();
        let first = Arc::new(MockPlatform::new().with_version("first"));
        let second = Arc::new(MockPlatform::new().with_version("second"));

        let (_shutdown_first, first_done) =
            subscribe_on(&bus, test_config(), "breaky-chain-77", first).await;
        let caller = connecter(&bus, test_config());
        caller
            .await_presence(&InstanceId::new("breaky-chain-77"), Duration::from_secs(1))
            .await
            .expect("first subscriber live");

        let (_shutdown_second, mut second_done) =
            subscribe_on(&bus, test_config(), "breaky-chain-77", second).await;

        let outcome = timeout(Duration::from_secs(1), first_done)
            .await
            .expect("first done within 1s")
            .expect("done sender kept");
        assert!(matches!(
            outcome.expect_err("kicked outcome"),
            SubscriptionError::Kicked { .. }
        ));
        caller
            .await_presence(&InstanceId::new("breaky-chain-77"), Duration::from_secs(1))
            .await
            .expect("second subscriber live");

        // The kick that ended the first subscription must not leak into the
        // second; its own broadcast is filtered by token.
        sleep(Duration::from_millis(300)).await;
        assert!(second_done.try_recv().is_err());

        // The first subscriber unsubscribed before its done fired, so from
        // here on only the second can answer.
        let stub = connecter(&bus, test_config()).connect(InstanceId::new("breaky-chain-77"));
        assert_eq!(stub.version().await.expect("second answers"), "second");
    }

    #[tokio::test]
    async fn test_rapid_resubscribes_converge_on_last_owner() {
        let bus = MemoryTransport::new();
        let oldest = Arc::new(MockPlatform::new().with_version("oldest"));
        let middle = Arc::new(MockPlatform::new().with_version("middle"));
        let newest = Arc::new(MockPlatform::new().with_version("newest"));

        let (_shutdown_a, oldest_done) =
            subscribe_on(&bus, test_config(), "chain-of-three", oldest).await;
        let (_shutdown_b, middle_done) =
            subscribe_on(&bus, test_config(), "chain-of-three", middle).await;
        let (_shutdown_c, mut newest_done) =
            subscribe_on(&bus, test_config(), "chain-of-three", newest).await;

        for done in [oldest_done, middle_done] {
            let outcome = timeout(Duration::from_secs(1), done)
                .await
                .expect("done within 1s")
                .expect("done sender kept");
            assert!(matches!(
                outcome.expect_err("kicked outcome"),
                SubscriptionError::Kicked { .. }
            ));
        }

        sleep(Duration::from_millis(300)).await;
        assert!(newest_done.try_recv().is_err());

        let stub = connecter(&bus, test_config()).connect(InstanceId::new("chain-of-three"));
        assert_eq!(stub.version().await.expect("newest answers"), "newest");
    }

    // =============================================================================
    // FORCED RECONNECT & SHUTDOWN
    // =============================================================================

    #[tokio::test]
    async fn test_forced_reconnect_then_resubscribe() {
        let bus = MemoryTransport::new();
        let config = test_config().with_max_age(Duration::from_millis(100));
        let platform: Arc<dyn Platform> = Arc::new(MockPlatform::new().with_version("4.2.0"));

        let (_shutdown, done) = subscribe_on(
            &bus,
            config.clone(),
            "short-leash",
            Arc::clone(&platform),
        )
        .await;

        let outcome = timeout(Duration::from_secs(1), done)
            .await
            .expect("done within 1s")
            .expect("done sender kept");
        outcome.expect("forced reconnect reports success");
        assert_eq!(bus.subscription_count(), 0);

        // The contract on an Ok outcome is to subscribe again.
        let (_shutdown, _done) =
            subscribe_on(&bus, config, "short-leash", Arc::clone(&platform)).await;
        let stub = connecter(&bus, test_config()).connect(InstanceId::new("short-leash"));
        assert_eq!(stub.version().await.expect("agent back"), "4.2.0");
    }

    #[tokio::test]
    async fn test_shutdown_during_traffic_reports_cancelled() {
        let bus = MemoryTransport::new();
        let platform = Arc::new(MockPlatform::new());
        let (shutdown, done) =
            subscribe_on(&bus, test_config(), "daily-restart", platform).await;

        let caller = connecter(&bus, test_config());
        caller
            .await_presence(&InstanceId::new("daily-restart"), Duration::from_secs(1))
            .await
            .expect("agent live");

        shutdown.send(true).expect("dispatch loop listening");
        let outcome = timeout(Duration::from_secs(1), done)
            .await
            .expect("done within 1s")
            .expect("done sender kept");
        assert!(matches!(
            outcome.expect_err("cancelled outcome"),
            SubscriptionError::Cancelled
        ));
        assert_eq!(bus.subscription_count(), 0);
    }

    // =============================================================================
    // DISPATCH CONCURRENCY
    // =============================================================================

    #[tokio::test]
    async fn test_slow_update_does_not_starve_pings() {
        let bus = MemoryTransport::new();
        let platform = Arc::new(
            MockPlatform::new().with_update_delay(Duration::from_millis(300)),
        );
        let (_shutdown, _done) =
            subscribe_on(&bus, test_config(), "busy-agent", platform).await;

        let stub = connecter(&bus, test_config()).connect(InstanceId::new("busy-agent"));
        let slow = {
            let stub = stub.clone();
            tokio::spawn(async move { stub.update_manifests(release_spec()).await })
        };
        sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        for _ in 0..3 {
            stub.ping().await.expect("ping during slow update");
        }
        assert!(
            started.elapsed() < Duration::from_millis(150),
            "pings were starved by the in-flight update"
        );

        timeout(Duration::from_secs(1), slow)
            .await
            .expect("update finishes")
            .expect("update task ran")
            .expect("update succeeds");
    }
}
