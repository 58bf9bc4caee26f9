//! End-to-end tests for `AcaiaScale` over the in-memory transport.

use std::time::Duration;

use acaia_ble::mock::{FakeChannel, FakePeripheral, FakeTransport};
use acaia_ble::{AcaiaScale, CommandKind, Error, ScaleConfig, Variant};
use tokio::time::{advance, Instant};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(5);

fn config() -> ScaleConfig {
    ScaleConfig::default()
        .discovery_timeout(Duration::from_secs(10))
        .heartbeat_period(HEARTBEAT_PERIOD)
}

struct Rig {
    scale: AcaiaScale<FakeTransport>,
    read: FakeChannel,
    write: FakeChannel,
}

async fn connected(name: &str, variant: Variant) -> Rig {
    let peripheral = FakePeripheral::for_variant(name, "C8:00:00:00:00:01", variant);
    let read = peripheral.channel(variant.read_uuid()).unwrap();
    let write = peripheral.channel(variant.write_uuid()).unwrap();

    let transport = FakeTransport::new();
    transport.advertise(FakePeripheral::new("RANDOM", "C8:00:00:00:00:00"));
    transport.advertise(peripheral);

    let mut scale = AcaiaScale::new(transport, config());
    assert_eq!(scale.connect().await.unwrap(), variant);
    assert!(scale.is_connected());
    write.clear_writes();

    Rig { scale, read, write }
}

#[tokio::test(start_paused = true)]
async fn new_scale_reports_weight() {
    let mut rig = connected("LUNAR-ABC", Variant::New).await;
    assert_eq!(rig.scale.weight(), 0.0);

    let mut frame = vec![0u8; 13];
    frame[4] = 0x05;
    frame[5] = 0x88;
    frame[6] = 0x01;
    frame[9] = 1;
    frame[10] = 0x00;
    rig.read.notify(frame);

    let sample = rig.scale.poll_weight().unwrap();
    assert!(!sample.is_negative());
    assert!((rig.scale.weight() - 39.2).abs() < 1e-4);
    assert_eq!(rig.scale.poll_weight(), None);
}

#[tokio::test(start_paused = true)]
async fn old_scale_reports_negative_weight() {
    let mut rig = connected("ACAIA123", Variant::Old).await;
    rig.read.notify(vec![0xef, 0xdd, 0x64, 0x00, 0, 0, 1, 0x02, 0, 0]);

    rig.scale.poll_weight().unwrap();
    assert_eq!(rig.scale.weight(), -10.0);
}

#[tokio::test(start_paused = true)]
async fn generic_scale_reports_ascii_weight() {
    let mut rig = connected("FELICITA", Variant::Generic).await;

    rig.read.notify(b"ST+001234 g\r\n".to_vec());
    rig.scale.poll_weight().unwrap();
    assert!((rig.scale.weight() - 12.34).abs() < 1e-4);

    rig.read.notify(b"ST-001234 g\r\n".to_vec());
    rig.scale.poll_weight().unwrap();
    assert!((rig.scale.weight() + 12.34).abs() < 1e-4);
}

#[tokio::test(start_paused = true)]
async fn only_latest_notification_is_seen() {
    let mut rig = connected("PYXIS", Variant::Old).await;
    rig.read.notify(vec![0, 0, 0x0a, 0x00, 0, 0, 1, 0, 0, 0]);
    rig.read.notify(vec![0, 0, 0x14, 0x00, 0, 0, 1, 0, 0, 0]);

    assert_eq!(rig.scale.poll_weight().unwrap().value(), 2.0);
    assert_eq!(rig.scale.poll_weight(), None);
}

#[tokio::test(start_paused = true)]
async fn tare_length_depends_on_variant() {
    let mut generic = connected("CINCO", Variant::Generic).await;
    generic.scale.tare().await.unwrap();
    assert_eq!(generic.write.writes(), vec![vec![0x54]]);

    for variant in [Variant::Old, Variant::New] {
        let mut acaia = connected("ACAIA", variant).await;
        acaia.scale.tare().await.unwrap();
        let writes = acaia.write.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].len(), 20);
        assert_eq!(writes[0][..6], [0xef, 0xdd, 0x04, 0x00, 0x00, 0x00]);
    }
}

#[tokio::test(start_paused = true)]
async fn write_failure_disconnects_until_next_handshake() {
    let mut rig = connected("PROCH", Variant::New).await;
    rig.write.set_fail_writes(true);

    let err = rig.scale.stop_timer().await.unwrap_err();
    assert_eq!(err.failed_command(), Some(CommandKind::StopTimer));
    assert!(!rig.scale.is_connected());

    rig.write.set_fail_writes(false);
    assert!(matches!(rig.scale.reset_timer().await, Err(Error::NotConnected)));
    assert!(!rig.scale.is_connected());

    // Recovery is a fresh discovery and handshake.
    let replacement = FakePeripheral::for_variant("PROCH", "C8:00:00:00:00:02", Variant::New);
    rig.scale.transport().advertise(replacement);
    rig.scale.connect().await.unwrap();
    assert!(rig.scale.is_connected());
}

#[tokio::test(start_paused = true)]
async fn heartbeats_follow_period_for_acaia_scales() {
    let mut rig = connected("LUNAR", Variant::Old).await;

    assert!(rig.scale.heartbeat_required());
    assert!(rig.scale.keep_alive().await.unwrap());
    assert!(!rig.scale.heartbeat_required());

    advance(HEARTBEAT_PERIOD - Duration::from_millis(1)).await;
    assert!(!rig.scale.heartbeat_required());

    advance(Duration::from_millis(1)).await;
    assert!(rig.scale.heartbeat_required());
    assert!(rig.scale.keep_alive().await.unwrap());

    assert_eq!(
        rig.write.writes(),
        vec![
            vec![0xef, 0xdd, 0x00, 0x02, 0x00, 0x02, 0x00],
            vec![0xef, 0xdd, 0x00, 0x02, 0x00, 0x02, 0x00],
        ]
    );
}

// Generic scales must never be sent keep-alives, however long the session.
#[tokio::test(start_paused = true)]
async fn generic_scale_never_requires_heartbeat() {
    let mut rig = connected("FELIC", Variant::Generic).await;

    for _ in 0..5 {
        assert!(!rig.scale.heartbeat_required());
        assert!(!rig.scale.keep_alive().await.unwrap());
        advance(HEARTBEAT_PERIOD).await;
    }
    assert!(rig.write.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn heartbeat_failure_disconnects() {
    let mut rig = connected("ACAIA", Variant::New).await;
    rig.write.set_fail_writes(true);

    let err = rig.scale.heartbeat().await.unwrap_err();
    assert_eq!(err.failed_command(), Some(CommandKind::Heartbeat));
    assert!(!rig.scale.is_connected());
}

#[tokio::test(start_paused = true)]
async fn discovery_times_out_without_scale() {
    let transport = FakeTransport::new();
    transport.advertise(FakePeripheral::new("RANDOM", "00"));

    let mut scale = AcaiaScale::new(transport, config());
    let start = Instant::now();
    let err = scale.connect().await.unwrap_err();

    assert!(matches!(err, Error::DiscoveryTimeout { .. }));
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert!(!scale.transport().is_scanning());
}

#[tokio::test(start_paused = true)]
async fn handshake_failure_keeps_no_session() {
    let transport = FakeTransport::new();
    transport.advertise(
        FakePeripheral::new("ACAIA", "00")
            .with_channel(FakeChannel::write_only(Variant::New.read_uuid())),
    );

    let mut scale = AcaiaScale::new(transport, config());
    let err = scale.connect().await.unwrap_err();

    assert!(matches!(err, Error::UnknownVariant));
    assert!(scale.session().is_none());
    assert_eq!(scale.variant(), None);
}

#[tokio::test(start_paused = true)]
async fn target_address_selects_one_scale() {
    let transport = FakeTransport::new();
    transport.advertise(FakePeripheral::for_variant("ACAIA", "AA", Variant::Old));
    transport.advertise(FakePeripheral::for_variant("LUNAR", "BB", Variant::New));

    let mut scale = AcaiaScale::new(transport, config().target_address("BB"));
    assert_eq!(scale.connect().await.unwrap(), Variant::New);
}
