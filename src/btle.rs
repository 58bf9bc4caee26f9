//! btleplug implementation of the transport traits.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_stream::stream;
use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::stream::{Stream, StreamExt};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::transport::{lock, Channel, ScalePeripheral, Transport, TransportError};

type Discoveries = Pin<Box<dyn Stream<Item = Peripheral> + Send>>;

/// Scans through the first Bluetooth adapter of the host.
pub struct BtleTransport {
    adapter: Adapter,
    discoveries: tokio::sync::Mutex<Option<Discoveries>>,
}

impl BtleTransport {
    pub async fn new() -> Result<Self, TransportError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(TransportError::NoAdapter)?;
        Ok(Self::with_adapter(adapter))
    }

    pub fn with_adapter(adapter: Adapter) -> Self {
        Self {
            adapter,
            discoveries: tokio::sync::Mutex::new(None),
        }
    }

    async fn start(&self, target: Option<String>) -> Result<(), TransportError> {
        let events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;

        let discoveries = discoveries(self.adapter.clone(), events, target);
        *self.discoveries.lock().await = Some(Box::pin(discoveries));
        Ok(())
    }
}

fn format_peripheral_id(id: &PeripheralId) -> String {
    format!("{:?}", id)
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
        .to_string()
}

// Yields a peripheral each time one is seen or its advertisement changes, so
// a name that arrives in a later advertisement is still picked up.
fn discoveries(
    adapter: Adapter,
    mut events: Pin<Box<dyn Stream<Item = CentralEvent> + Send>>,
    target: Option<String>,
) -> impl Stream<Item = Peripheral> + Send {
    stream! {
        while let Some(event) = events.next().await {
            let id = match event {
                CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };
            let peripheral = match adapter.peripheral(&id).await {
                Ok(peripheral) => peripheral,
                Err(_) => continue,
            };
            if let Some(target) = target.as_deref() {
                // macOS hides MAC addresses, so the platform id is accepted too.
                let address = peripheral.address().to_string();
                let id = format_peripheral_id(&peripheral.id());
                if !address.eq_ignore_ascii_case(target) && !id.eq_ignore_ascii_case(target) {
                    continue;
                }
            }
            yield peripheral;
        }
    }
}

#[async_trait]
impl Transport for BtleTransport {
    type Peripheral = BtlePeripheral;

    async fn scan(&self) -> Result<(), TransportError> {
        self.start(None).await
    }

    async fn scan_for_address(&self, address: &str) -> Result<(), TransportError> {
        self.start(Some(address.to_string())).await
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        *self.discoveries.lock().await = None;
        self.adapter.stop_scan().await?;
        Ok(())
    }

    async fn available(&self) -> Option<BtlePeripheral> {
        let mut discoveries = self.discoveries.lock().await;
        let stream = discoveries.as_mut()?;
        stream
            .next()
            .now_or_never()
            .flatten()
            .map(BtlePeripheral::new)
    }
}

#[derive(Debug, Clone)]
pub struct BtlePeripheral {
    peripheral: Peripheral,
}

impl BtlePeripheral {
    pub fn new(peripheral: Peripheral) -> Self {
        Self { peripheral }
    }

    pub fn inner(&self) -> &Peripheral {
        &self.peripheral
    }
}

#[async_trait]
impl ScalePeripheral for BtlePeripheral {
    type Channel = BtleChannel;

    async fn local_name(&self) -> Option<String> {
        self.peripheral
            .properties()
            .await
            .ok()
            .flatten()
            .and_then(|props| props.local_name)
    }

    fn address(&self) -> String {
        self.peripheral.address().to_string()
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.peripheral.connect().await?;
        Ok(())
    }

    async fn discover_attributes(&self) -> Result<(), TransportError> {
        self.peripheral.discover_services().await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    fn characteristic(&self, uuid: Uuid) -> Option<BtleChannel> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .map(|c| BtleChannel::new(self.peripheral.clone(), c))
    }
}

/// A characteristic on a connected peripheral.
///
/// Subscribing spawns a task that keeps the latest notified value until
/// [`Channel::take_update`] collects it. The task ends with the channel.
pub struct BtleChannel {
    peripheral: Peripheral,
    characteristic: Characteristic,
    latest: Arc<Mutex<Option<Vec<u8>>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl BtleChannel {
    fn new(peripheral: Peripheral, characteristic: Characteristic) -> Self {
        Self {
            peripheral,
            characteristic,
            latest: Arc::new(Mutex::new(None)),
            listener: Mutex::new(None),
        }
    }

    fn write_type(&self) -> WriteType {
        if self
            .characteristic
            .properties
            .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
        {
            WriteType::WithoutResponse
        } else {
            WriteType::WithResponse
        }
    }
}

impl Drop for BtleChannel {
    fn drop(&mut self) {
        if let Some(listener) = lock(&self.listener).take() {
            listener.abort();
        }
    }
}

#[async_trait]
impl Channel for BtleChannel {
    fn uuid(&self) -> Uuid {
        self.characteristic.uuid
    }

    fn can_subscribe(&self) -> bool {
        self.characteristic
            .properties
            .intersects(CharPropFlags::NOTIFY | CharPropFlags::INDICATE)
    }

    async fn subscribe(&self) -> Result<(), TransportError> {
        let mut notifications = self.peripheral.notifications().await?;
        self.peripheral.subscribe(&self.characteristic).await?;

        let uuid = self.characteristic.uuid;
        let latest = Arc::clone(&self.latest);
        let listener = tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid == uuid {
                    *lock(&latest) = Some(notification.value);
                }
            }
            debug!("Notification stream for {} ended", uuid);
        });

        if let Some(previous) = lock(&self.listener).replace(listener) {
            previous.abort();
        }
        Ok(())
    }

    async fn write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.peripheral
            .write(&self.characteristic, bytes, self.write_type())
            .await?;
        Ok(())
    }

    fn take_update(&self) -> Option<Vec<u8>> {
        lock(&self.latest).take()
    }
}
