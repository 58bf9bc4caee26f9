//! In-memory transport for testing without Bluetooth hardware.
//!
//! [`FakeTransport`] hands out [`FakePeripheral`]s as if they had been
//! advertised, optionally after a delay measured from the start of the scan.
//! Peripherals expose any subset of [`FakeChannel`]s, so variant detection
//! can be exercised against arbitrary characteristic tables.
//!
//! # Features
//!
//! - **Failure injection**: scan start, connect, attribute discovery,
//!   subscription and writes can each be made to fail
//! - **Write recording**: every successful write is kept for inspection
//! - **Synthetic notifications**: [`FakeChannel::notify`] queues the value the
//!   next poll will see
//!
//! Handles are cheap clones sharing state, so a test can keep a channel or
//! peripheral while the code under test owns another copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::transport::{lock, Channel, ScalePeripheral, Transport, TransportError};
use crate::variant::Variant;

#[derive(Debug, Default)]
struct ChannelState {
    subscribable: bool,
    /// `can_subscribe` answers true this many times, then false.
    subscribable_checks: Option<usize>,
    fail_subscribe: bool,
    subscribed: bool,
    fail_writes: bool,
    writes_before_failure: Option<usize>,
    writes: Vec<Vec<u8>>,
    pending: Option<Vec<u8>>,
}

/// A fake characteristic.
#[derive(Debug, Clone)]
pub struct FakeChannel {
    uuid: Uuid,
    state: Arc<Mutex<ChannelState>>,
}

impl FakeChannel {
    /// A characteristic that supports notifications.
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            state: Arc::new(Mutex::new(ChannelState {
                subscribable: true,
                ..ChannelState::default()
            })),
        }
    }

    /// A characteristic without notify/indicate support.
    pub fn write_only(uuid: Uuid) -> Self {
        Self {
            uuid,
            state: Arc::new(Mutex::new(ChannelState::default())),
        }
    }

    /// Stop reporting subscription support after `checks` queries.
    #[must_use]
    pub fn revoke_subscription_after(self, checks: usize) -> Self {
        lock(&self.state).subscribable_checks = Some(checks);
        self
    }

    #[must_use]
    pub fn failing_subscribe(self) -> Self {
        lock(&self.state).fail_subscribe = true;
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Accept `count` more writes, then fail every write after that.
    pub fn fail_writes_after(&self, count: usize) {
        let mut state = lock(&self.state);
        state.writes_before_failure = Some(state.writes.len() + count);
    }

    /// Deliver a notification; replaces one that has not been polled yet.
    pub fn notify(&self, value: impl Into<Vec<u8>>) {
        lock(&self.state).pending = Some(value.into());
    }

    /// All successful writes, oldest first.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.state).subscribed
    }
}

#[async_trait]
impl Channel for FakeChannel {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn can_subscribe(&self) -> bool {
        let mut state = lock(&self.state);
        if !state.subscribable {
            return false;
        }
        match state.subscribable_checks.as_mut() {
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
            None => true,
        }
    }

    async fn subscribe(&self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.fail_subscribe {
            return Err(TransportError::other("subscribe rejected"));
        }
        state.subscribed = true;
        Ok(())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        let exhausted = state
            .writes_before_failure
            .is_some_and(|limit| state.writes.len() >= limit);
        if state.fail_writes || exhausted {
            return Err(TransportError::other("write rejected"));
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn take_update(&self) -> Option<Vec<u8>> {
        lock(&self.state).pending.take()
    }
}

#[derive(Debug, Default)]
struct PeripheralState {
    fail_connect: bool,
    fail_discovery: bool,
    connected: bool,
    attributes_discovered: bool,
    disconnects: usize,
}

/// A fake advertised peripheral.
#[derive(Debug, Clone)]
pub struct FakePeripheral {
    name: Option<String>,
    address: String,
    channels: HashMap<Uuid, FakeChannel>,
    state: Arc<Mutex<PeripheralState>>,
}

impl FakePeripheral {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::unnamed(address)
        }
    }

    /// A peripheral that advertises no local name.
    pub fn unnamed(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
            channels: HashMap::new(),
            state: Arc::new(Mutex::new(PeripheralState::default())),
        }
    }

    /// A peripheral exposing exactly the characteristics of `variant`.
    pub fn for_variant(
        name: impl Into<String>,
        address: impl Into<String>,
        variant: Variant,
    ) -> Self {
        Self::new(name, address).with_variant(variant)
    }

    /// Adds the read and write characteristics of `variant`.
    #[must_use]
    pub fn with_variant(self, variant: Variant) -> Self {
        let peripheral = self.with_channel(FakeChannel::new(variant.read_uuid()));
        if variant.read_uuid() == variant.write_uuid() {
            peripheral
        } else {
            peripheral.with_channel(FakeChannel::write_only(variant.write_uuid()))
        }
    }

    #[must_use]
    pub fn with_channel(mut self, channel: FakeChannel) -> Self {
        self.channels.insert(channel.uuid, channel);
        self
    }

    #[must_use]
    pub fn failing_connect(self) -> Self {
        lock(&self.state).fail_connect = true;
        self
    }

    #[must_use]
    pub fn failing_discovery(self) -> Self {
        lock(&self.state).fail_discovery = true;
        self
    }

    /// Shared handle to the characteristic with `uuid`, regardless of
    /// whether attributes were discovered.
    pub fn channel(&self, uuid: Uuid) -> Option<FakeChannel> {
        self.channels.get(&uuid).cloned()
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    pub fn disconnect_count(&self) -> usize {
        lock(&self.state).disconnects
    }
}

#[async_trait]
impl ScalePeripheral for FakePeripheral {
    type Channel = FakeChannel;

    async fn local_name(&self) -> Option<String> {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.fail_connect {
            return Err(TransportError::other("connection refused"));
        }
        state.connected = true;
        Ok(())
    }

    async fn discover_attributes(&self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(TransportError::other("not connected"));
        }
        if state.fail_discovery {
            return Err(TransportError::other("attribute discovery failed"));
        }
        state.attributes_discovered = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        state.connected = false;
        state.attributes_discovered = false;
        state.disconnects += 1;
        Ok(())
    }

    fn characteristic(&self, uuid: Uuid) -> Option<FakeChannel> {
        if !lock(&self.state).attributes_discovered {
            return None;
        }
        self.channel(uuid)
    }
}

#[derive(Debug)]
struct ActiveScan {
    started: Instant,
    target: Option<String>,
}

#[derive(Debug, Default)]
struct TransportState {
    advertisements: Vec<(Duration, FakePeripheral)>,
    scan: Option<ActiveScan>,
    fail_scan: bool,
    scans_started: usize,
    stop_count: usize,
}

/// A fake radio that replays scripted advertisements.
#[derive(Debug, Default)]
pub struct FakeTransport {
    state: Mutex<TransportState>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise `peripheral` as soon as a scan is running.
    pub fn advertise(&self, peripheral: FakePeripheral) {
        self.advertise_after(Duration::ZERO, peripheral);
    }

    /// Advertise `peripheral` once a scan has been running for `delay`.
    pub fn advertise_after(&self, delay: Duration, peripheral: FakePeripheral) {
        lock(&self.state).advertisements.push((delay, peripheral));
    }

    pub fn set_fail_scan(&self, fail: bool) {
        lock(&self.state).fail_scan = fail;
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.state).scan.is_some()
    }

    pub fn scans_started(&self) -> usize {
        lock(&self.state).scans_started
    }

    pub fn stop_count(&self) -> usize {
        lock(&self.state).stop_count
    }

    fn start(&self, target: Option<String>) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        if state.fail_scan {
            return Err(TransportError::other("scan could not be started"));
        }
        state.scans_started += 1;
        state.scan = Some(ActiveScan {
            started: Instant::now(),
            target,
        });
        Ok(())
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Peripheral = FakePeripheral;

    async fn scan(&self) -> Result<(), TransportError> {
        self.start(None)
    }

    async fn scan_for_address(&self, address: &str) -> Result<(), TransportError> {
        self.start(Some(address.to_string()))
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        let mut state = lock(&self.state);
        state.scan = None;
        state.stop_count += 1;
        Ok(())
    }

    async fn available(&self) -> Option<FakePeripheral> {
        let mut state = lock(&self.state);
        let scan = state.scan.as_ref()?;
        let elapsed = scan.started.elapsed();
        let target = scan.target.clone();

        let index = state.advertisements.iter().position(|(delay, peripheral)| {
            *delay <= elapsed
                && target
                    .as_deref()
                    .map_or(true, |t| peripheral.address.eq_ignore_ascii_case(t))
        })?;
        Some(state.advertisements.remove(index).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_records_writes_until_limit() {
        let channel = FakeChannel::write_only(Uuid::nil());
        channel.write(&[1]).await.unwrap();
        channel.fail_writes_after(1);
        channel.write(&[2]).await.unwrap();
        assert!(channel.write(&[3]).await.is_err());
        assert_eq!(channel.writes(), vec![vec![1], vec![2]]);
    }

    #[tokio::test]
    async fn test_notifications_are_last_value_wins() {
        let channel = FakeChannel::new(Uuid::nil());
        channel.notify(vec![1]);
        channel.notify(vec![2]);
        assert_eq!(channel.take_update(), Some(vec![2]));
        assert_eq!(channel.take_update(), None);
    }

    #[test]
    fn test_revoked_subscription() {
        let channel = FakeChannel::new(Uuid::nil()).revoke_subscription_after(1);
        assert!(channel.can_subscribe());
        assert!(!channel.can_subscribe());
    }

    #[tokio::test]
    async fn test_characteristics_hidden_until_discovered() {
        let peripheral = FakePeripheral::for_variant("LUNAR-1", "AA", Variant::New);
        assert!(peripheral.characteristic(Variant::New.read_uuid()).is_none());

        peripheral.connect().await.unwrap();
        peripheral.discover_attributes().await.unwrap();
        assert!(peripheral.characteristic(Variant::New.read_uuid()).is_some());
        assert!(peripheral.characteristic(Variant::Old.read_uuid()).is_none());
    }

    #[tokio::test]
    async fn test_transport_only_advertises_while_scanning() {
        let transport = FakeTransport::new();
        transport.advertise(FakePeripheral::new("ACAIA", "AA"));
        assert!(transport.available().await.is_none());

        transport.scan().await.unwrap();
        assert!(transport.available().await.is_some());
        assert!(transport.available().await.is_none());
    }

    #[tokio::test]
    async fn test_address_scan_filters_other_peripherals() {
        let transport = FakeTransport::new();
        transport.advertise(FakePeripheral::new("ACAIA", "AA"));
        transport.advertise(FakePeripheral::new("LUNAR", "BB"));

        transport.scan_for_address("bb").await.unwrap();
        let found = transport.available().await.unwrap();
        assert_eq!(found.address(), "BB");
        assert!(transport.available().await.is_none());
    }
}
