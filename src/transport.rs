use crate::constants::*;
use crate::frame::{self, FrameError};
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::StreamExt;
use hidapi::HidApi;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SERVICE_UUID: Uuid = Uuid::from_u128(0x0000ffe000001000800000805f9b34fb);
const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x0000ffe100001000800000805f9b34fb);
const BLE_DEVICE_NAME: &str = "xArm";
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
    #[error("Device error: {0}")]
    Device(String),
    #[error("No device found")]
    NoDeviceFound,
}

/// Link to the servo board, over USB HID or Bluetooth LE.
pub enum Transport {
    Hid(Arc<Mutex<hidapi::HidDevice>>),
    Bluetooth {
        device: Peripheral,
        characteristic: Characteristic,
    },
}

impl Transport {
    /// Open the board over USB, falling back to Bluetooth.
    pub async fn connect() -> Result<Self, TransportError> {
        match Self::try_hid().await {
            Ok(hid_device) => {
                info!("connected to servo board via USB HID");
                Ok(Transport::Hid(Arc::new(Mutex::new(hid_device))))
            }
            Err(e) => {
                warn!(error = %e, "USB HID unavailable, trying Bluetooth");
                match Self::try_bluetooth().await {
                    Ok((device, characteristic)) => {
                        info!("connected to servo board via Bluetooth");
                        Ok(Transport::Bluetooth {
                            device,
                            characteristic,
                        })
                    }
                    Err(e) => {
                        warn!(error = %e, "Bluetooth unavailable");
                        Err(TransportError::NoDeviceFound)
                    }
                }
            }
        }
    }

    async fn try_hid() -> Result<hidapi::HidDevice, TransportError> {
        tokio::task::spawn_blocking(|| -> Result<hidapi::HidDevice, TransportError> {
            let api = HidApi::new()?;
            Ok(api.open(VENDOR_ID, PRODUCT_ID)?)
        })
        .await
        .map_err(|e| TransportError::Device(e.to_string()))?
    }

    async fn try_bluetooth() -> Result<(Peripheral, Characteristic), TransportError> {
        let adapter = Manager::new()
            .await?
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TransportError::Device("No Bluetooth adapter found".into()))?;

        adapter.start_scan(ScanFilter::default()).await?;
        let discovered = tokio::time::timeout(SCAN_TIMEOUT, Self::discover_board(&adapter)).await;
        adapter.stop_scan().await?;

        let device = discovered.map_err(|_| TransportError::NoDeviceFound)??;
        let characteristic = Self::open_link(&device).await?;
        Ok((device, characteristic))
    }

    /// Wait for an advertisement from the board. Runs until the event stream ends.
    async fn discover_board(adapter: &Adapter) -> Result<Peripheral, TransportError> {
        let mut events = adapter.events().await?;
        debug!(name = BLE_DEVICE_NAME, "scanning");

        while let Some(event) = events.next().await {
            let CentralEvent::DeviceDiscovered(id) = event else {
                continue;
            };
            let peripheral = adapter.peripheral(&id).await?;
            let name = peripheral.properties().await.ok().flatten().and_then(|p| p.local_name);
            if name.as_deref() == Some(BLE_DEVICE_NAME) {
                return Ok(peripheral);
            }
        }
        Err(TransportError::NoDeviceFound)
    }

    async fn open_link(device: &Peripheral) -> Result<Characteristic, TransportError> {
        device.connect().await?;
        device.discover_services().await?;

        let characteristic = device
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == CHARACTERISTIC_UUID && c.service_uuid == SERVICE_UUID)
            .ok_or_else(|| TransportError::Device("Communication characteristic not found".into()))?;

        if characteristic.properties.contains(CharPropFlags::NOTIFY) {
            device.subscribe(&characteristic).await?;
        }
        Ok(characteristic)
    }

    pub async fn send(&mut self, cmd: u8, data: &[u8]) -> Result<(), TransportError> {
        let frame = frame::encode(cmd, data)?;
        match self {
            Transport::Hid(device) => {
                let device = Arc::clone(device);
                // HID reports carry a leading report id
                let mut report = Vec::with_capacity(frame.len() + 1);
                report.push(0);
                report.extend_from_slice(&frame);

                tokio::task::spawn_blocking(move || device.lock().write(&report))
                    .await
                    .map_err(|e| TransportError::Device(e.to_string()))??;
                Ok(())
            }
            Transport::Bluetooth { device, characteristic } => {
                device.write(characteristic, &frame, WriteType::WithResponse).await?;
                Ok(())
            }
        }
    }

    pub async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        let buf = match self {
            Transport::Hid(device) => {
                let device = Arc::clone(device);
                let timeout_ms = RESPONSE_TIMEOUT.as_millis() as i32;
                tokio::task::spawn_blocking(move || -> Result<Vec<u8>, TransportError> {
                    let mut buf = [0u8; 64];
                    let read = device.lock().read_timeout(&mut buf, timeout_ms)?;
                    Ok(buf[..read].to_vec())
                })
                .await
                .map_err(|e| TransportError::Device(e.to_string()))??
            }
            Transport::Bluetooth { device, characteristic } => {
                if characteristic.properties.contains(CharPropFlags::NOTIFY) {
                    let mut notifications = device.notifications().await?;
                    match tokio::time::timeout(RESPONSE_TIMEOUT, notifications.next()).await {
                        Ok(Some(data)) => data.value,
                        _ => return Err(TransportError::Device("No response received".into())),
                    }
                } else {
                    device.read(characteristic).await?
                }
            }
        };
        Ok(frame::decode(&buf)?.to_vec())
    }
}
