use throttle_tc::{
    error::InstallStep, mock::MockExecutor, Error, LinkConditions, Profile, Throttle,
    ThrottleConfig,
};

fn throttle(executor: MockExecutor) -> Throttle<MockExecutor> {
    let _ = tracing_subscriber::fmt::try_init();

    Throttle::new(executor, ThrottleConfig::default())
}

#[tokio::test]
async fn failed_module_load_and_device_creation_do_not_block_start() {
    let executor =
        MockExecutor::new().fail_on(&["modprobe", "ifb"]).fail_on(&["ip", "link", "add"]);
    let throttle = throttle(executor);

    throttle.start(&Profile::ThreeG.conditions()).await.unwrap();

    let calls = throttle.executor().privileged_calls();
    let position = |command: &str| calls.iter().position(|c| c == command).unwrap();

    assert!(position("ip link add ifb0 type ifb") < position("ip link set dev ifb0 up"));
    assert!(calls.iter().any(|c| c.starts_with("tc filter add dev eth0")));
}

#[tokio::test]
async fn failed_bring_up_aborts_before_redirection() {
    let throttle = throttle(MockExecutor::new().fail_on(&["ip", "link", "set", "dev", "ifb0"]));

    let err = throttle.start(&Profile::ThreeG.conditions()).await.unwrap_err();

    assert!(err.is_setup());
    assert!(matches!(err, Error::DeviceUp { .. }));

    let calls = throttle.executor().privileged_calls();
    assert_eq!(calls.last().unwrap(), "ip link set dev ifb0 up");
    assert!(!calls.iter().any(|c| c.starts_with("tc qdisc add") || c.starts_with("tc filter")));
}

#[tokio::test]
async fn partial_setup_is_recovered_by_the_next_start() {
    let throttle = throttle(MockExecutor::simulated("eth0"));
    throttle.executor().inject_failure(&["tc", "filter", "add"]);

    let err = throttle.start(&LinkConditions::new().up(256).down(280)).await.unwrap_err();
    assert!(matches!(err, Error::Install { step: InstallStep::RedirectFilter, .. }));

    // The ingress qdisc is left behind without its filter.
    let kernel = throttle.executor().kernel().unwrap();
    assert!(kernel.devices["eth0"].ingress);
    assert!(kernel.devices["eth0"].filters.is_empty());

    throttle.executor().clear_failures();
    throttle.start(&LinkConditions::new().up(256).down(280)).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.devices["eth0"].filters.len(), 1);
    assert_eq!(kernel.object_count(), 4);
}

#[tokio::test]
async fn leftovers_from_a_crashed_session_are_replaced() {
    let throttle = throttle(MockExecutor::simulated("eth0"));

    throttle.start(&LinkConditions::new().rtt(300).packet_loss(5.0)).await.unwrap();
    // A new process knows nothing about the previous one.
    let kernel = throttle.executor().kernel().unwrap();
    let executor = MockExecutor::simulated("eth0").with_kernel(kernel);
    let throttle = Throttle::new(executor, ThrottleConfig::default());

    throttle.start(&LinkConditions::new().rtt(20)).await.unwrap();

    let kernel = throttle.executor().kernel().unwrap();
    assert_eq!(kernel.object_count(), 4);
    assert_eq!(kernel.devices["eth0"].root.as_deref(), Some("handle 1:0 netem delay 10ms"));
}

#[tokio::test]
async fn failed_shaping_is_recovered_by_stop() {
    let throttle = throttle(MockExecutor::simulated("eth0"));
    throttle.executor().inject_failure(&["tc", "qdisc", "add", "dev", "eth0", "root"]);

    let err = throttle.start(&LinkConditions::new().up(30)).await.unwrap_err();
    assert!(matches!(err, Error::Shaping { .. }));

    throttle.stop().await.unwrap();
    assert_eq!(throttle.executor().kernel().unwrap().object_count(), 0);
}
