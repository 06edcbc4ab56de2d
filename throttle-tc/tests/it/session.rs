use throttle_tc::{
    mock::{Kernel, MockExecutor},
    Error, LinkConditions, Profile, Throttle, ThrottleConfig,
};

fn simulated() -> Throttle<MockExecutor> {
    let _ = tracing_subscriber::fmt::try_init();

    Throttle::new(MockExecutor::simulated("eth0"), ThrottleConfig::default())
}

#[tokio::test]
async fn stop_without_session() {
    let throttle = simulated();

    throttle.stop().await.unwrap();
    throttle.stop().await.unwrap();

    assert_eq!(throttle.executor().kernel().unwrap().object_count(), 0);
}

#[tokio::test]
async fn start_shapes_both_directions() {
    let throttle = simulated();

    let conditions = LinkConditions::new().up(500).rtt(100).jitter(10).packet_loss(2.0);
    throttle.start(&conditions).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    let eth0 = &kernel.devices["eth0"];
    let ifb0 = &kernel.devices["ifb0"];

    assert!(ifb0.up);
    assert!(eth0.ingress);
    assert_eq!(
        eth0.filters,
        ["protocol ip u32 match u32 0 0 flowid 1:1 action mirred egress redirect dev ifb0"]
    );
    assert_eq!(
        eth0.root.as_deref(),
        Some("handle 1:0 netem delay 50ms 10ms rate 500kbit loss 2%")
    );
    assert_eq!(ifb0.root.as_deref(), Some("handle 1:0 netem delay 50ms 10ms loss 2%"));
}

#[tokio::test]
async fn start_twice_keeps_one_session() {
    let throttle = simulated();

    throttle.start(&Profile::ThreeG.conditions()).await.unwrap();
    throttle.start(&Profile::Cable.conditions()).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.object_count(), 4);
    assert_eq!(kernel.devices["eth0"].filters.len(), 1);
    assert_eq!(
        kernel.devices["eth0"].root.as_deref(),
        Some("handle 1:0 netem delay 14ms rate 1000kbit")
    );
    assert_eq!(
        kernel.devices["ifb0"].root.as_deref(),
        Some("handle 1:0 netem delay 14ms rate 5000kbit")
    );
}

#[tokio::test]
async fn unconstrained_start_installs_plumbing_only() {
    let throttle = simulated();

    throttle.start(&LinkConditions::default()).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert!(kernel.devices["eth0"].ingress);
    assert_eq!(kernel.devices["eth0"].filters.len(), 1);
    assert_eq!(kernel.devices["eth0"].root, None);
    assert_eq!(kernel.devices["ifb0"].root, None);

    let netem_calls =
        throttle.executor().privileged_calls().into_iter().filter(|c| c.contains("netem")).count();
    assert_eq!(netem_calls, 0);
}

#[tokio::test]
async fn download_only_shapes_ingress() {
    let throttle = simulated();

    throttle.start(&LinkConditions::new().down(1000)).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.devices["ifb0"].root.as_deref(), Some("handle 1:0 netem rate 1000kbit"));
    assert_eq!(kernel.devices["eth0"].root, None);
}

#[tokio::test]
async fn stop_removes_the_session() {
    let throttle = simulated();

    throttle.start(&Profile::Lte.conditions().packet_loss(1.0)).await.unwrap();
    throttle.stop().await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.object_count(), 0);
    // The ifb device itself outlives the session.
    assert!(kernel.devices.contains_key("ifb0"));
}

#[tokio::test]
async fn container_without_module_tooling() {
    let kernel = Kernel { modprobe_available: false, ..Kernel::new(["eth0"]) };
    let executor = MockExecutor::simulated("eth0").with_kernel(kernel);
    let throttle = Throttle::new(executor, ThrottleConfig::default());

    throttle.start(&LinkConditions::new().rtt(80)).await.unwrap();
    // Second run: the ifb device already exists and cannot be created again.
    throttle.start(&LinkConditions::new().rtt(80)).await.unwrap();

    let calls = throttle.executor().privileged_calls();
    assert_eq!(calls.iter().filter(|c| *c == "ip link add ifb0 type ifb").count(), 2);
    assert_eq!(throttle.executor().kernel().unwrap().object_count(), 4);
}

#[tokio::test]
async fn custom_ifb_device_is_created() {
    let config = ThrottleConfig::default().with_ifb_device("ifb2");
    let throttle = Throttle::new(MockExecutor::simulated("eth0"), config);

    throttle.start(&LinkConditions::new().down(1000)).await.unwrap();
    throttle.start(&LinkConditions::new().down(1000)).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert!(kernel.devices["ifb2"].up);
    assert_eq!(kernel.devices["ifb2"].root.as_deref(), Some("handle 1:0 netem rate 1000kbit"));
    assert_eq!(
        kernel.devices["eth0"].filters,
        ["protocol ip u32 match u32 0 0 flowid 1:1 action mirred egress redirect dev ifb2"]
    );
    assert_eq!(kernel.devices["ifb0"].root, None);
    assert_eq!(kernel.object_count(), 3);

    throttle.stop().await.unwrap();
    assert_eq!(throttle.executor().kernel().unwrap().object_count(), 0);
}

#[tokio::test]
async fn localhost_session() {
    let throttle = simulated();

    throttle.start_localhost(&LinkConditions::new().rtt(200).jitter(20)).await.unwrap();
    throttle.start_localhost(&LinkConditions::new().rtt(100)).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.devices["lo"].root.as_deref(), Some("handle 1:0 netem delay 50ms"));
    assert!(!kernel.devices["eth0"].ingress);

    throttle.stop_localhost().await;
    throttle.stop_localhost().await;
    assert_eq!(throttle.executor().kernel().unwrap().object_count(), 0);
}

#[tokio::test]
async fn unresolved_interface_fails_start() {
    let executor = MockExecutor::simulated("eth0").with_route_output("", "");
    let throttle = Throttle::new(executor, ThrottleConfig::default());

    let err = throttle.start(&Profile::Dsl.conditions()).await.unwrap_err();

    assert!(matches!(err, Error::Resolution { .. }));
    assert!(throttle.executor().privileged_calls().is_empty());
}
