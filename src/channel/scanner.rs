// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Time-boxed broadcast advertisement scanning.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::ChannelError;
use crate::event::DeviceKey;
use crate::family::DeviceFamily;

/// One received broadcast advertisement.
#[derive(Debug, Clone)]
pub struct Advertisement {
    /// The advertising device.
    pub address: DeviceKey,
    /// The family-specific service-data frame, starting with the model
    /// tag byte.
    pub service_data: Vec<u8>,
}

/// The radio the scanner listens on.
///
/// The actual short-range transport (BLE stack, SDR, test double) lives
/// outside this library; implementations hand advertisements over on an
/// mpsc channel and accept raw command frames for transmission.
pub trait BroadcastTransport: Send + Sync + 'static {
    /// Starts a scan and returns the advertisement stream.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the radio cannot start scanning.
    fn start_scan(
        &self,
    ) -> impl Future<Output = Result<mpsc::Receiver<Advertisement>, ChannelError>> + Send;

    /// Stops the scan and releases the radio.
    ///
    /// Must be safe to call after a failed or timed-out scan.
    fn stop_scan(&self) -> impl Future<Output = ()> + Send;

    /// Transmits a command frame to a device.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if transmission fails.
    fn send_frame(
        &self,
        address: &DeviceKey,
        frame: &[u8],
    ) -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Scans for one device's advertisement within a bounded window.
///
/// The scan window defaults to one second and is capped at the platform
/// maximum regardless of configuration. The radio is always released when
/// the window closes, including on timeout and error paths.
#[derive(Debug)]
pub struct BroadcastScanner<T> {
    transport: Arc<T>,
    window: Duration,
}

impl<T> Clone for BroadcastScanner<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            window: self.window,
        }
    }
}

impl<T: BroadcastTransport> BroadcastScanner<T> {
    /// Default scan window.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(1);

    /// Longest permitted scan window.
    pub const MAX_WINDOW: Duration = Duration::from_secs(10);

    /// Creates a scanner with the default window.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            window: Self::DEFAULT_WINDOW,
        }
    }

    /// Sets the scan window, capped at [`Self::MAX_WINDOW`].
    #[must_use]
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window.min(Self::MAX_WINDOW);
        self
    }

    /// Returns the effective scan window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Listens for the first advertisement from `key` with the family's
    /// model tag, stopping the scan when one arrives or the window
    /// closes.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError::ScanTimeout` when the window elapses
    /// without a matching advertisement, or the transport's error if the
    /// scan cannot start.
    pub async fn scan_for(
        &self,
        key: &DeviceKey,
        family: DeviceFamily,
    ) -> Result<Advertisement, ChannelError> {
        let mut rx = self.transport.start_scan().await?;
        let tag = family.model_tag();

        let outcome = tokio::time::timeout(self.window, async {
            while let Some(advertisement) = rx.recv().await {
                if advertisement.address == *key
                    && advertisement.service_data.first() == Some(&tag)
                {
                    return Some(advertisement);
                }
                tracing::trace!(from = %advertisement.address, "ignoring non-matching advertisement");
            }
            None
        })
        .await;

        // Release the radio no matter how the window ended.
        self.transport.stop_scan().await;

        match outcome {
            Ok(Some(advertisement)) => Ok(advertisement),
            Ok(None) => Err(ChannelError::ChannelClosed(
                "advertisement stream ended".to_string(),
            )),
            Err(_) => {
                #[allow(clippy::cast_possible_truncation)]
                let window_ms = self.window.as_millis() as u64;
                Err(ChannelError::ScanTimeout(window_ms))
            }
        }
    }
}

/// A null transport for engines without a broadcast radio.
///
/// Every operation reports the channel as unavailable; the selector never
/// grants the broadcast channel a capability when this transport is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBroadcast;

impl BroadcastTransport for NoBroadcast {
    async fn start_scan(&self) -> Result<mpsc::Receiver<Advertisement>, ChannelError> {
        Err(ChannelError::Unavailable(
            "no broadcast transport configured".to_string(),
        ))
    }

    async fn stop_scan(&self) {}

    async fn send_frame(&self, _address: &DeviceKey, _frame: &[u8]) -> Result<(), ChannelError> {
        Err(ChannelError::Unavailable(
            "no broadcast transport configured".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted transport delivering a fixed set of advertisements.
    struct ScriptedTransport {
        advertisements: Mutex<Vec<Advertisement>>,
        stops: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(advertisements: Vec<Advertisement>) -> Self {
            Self {
                advertisements: Mutex::new(advertisements),
                stops: AtomicU32::new(0),
            }
        }
    }

    impl BroadcastTransport for ScriptedTransport {
        async fn start_scan(&self) -> Result<mpsc::Receiver<Advertisement>, ChannelError> {
            let (tx, rx) = mpsc::channel(16);
            for advertisement in self.advertisements.lock().drain(..) {
                let _ = tx.try_send(advertisement);
            }
            // Sender kept alive so the stream stays open until the window
            // closes; dropping tx here would end the stream early.
            tokio::spawn(async move {
                let _tx = tx;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            });
            Ok(rx)
        }

        async fn stop_scan(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        async fn send_frame(&self, _: &DeviceKey, _: &[u8]) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    fn meter_advertisement(key: &str) -> Advertisement {
        Advertisement {
            address: DeviceKey::new(key),
            service_data: vec![b'T', 21, 4, 47, 90],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_matching_advertisement() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            meter_advertisement("11:11:11:11:11:11"),
            meter_advertisement("AA:BB:CC:DD:EE:FF"),
        ]));
        let scanner = BroadcastScanner::new(Arc::clone(&transport));

        let result = scanner
            .scan_for(&DeviceKey::new("AA:BB:CC:DD:EE:FF"), DeviceFamily::Meter)
            .await
            .unwrap();

        assert_eq!(result.address, DeviceKey::new("AABBCCDDEEFF"));
        assert_eq!(transport.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn filters_by_model_tag() {
        // Right address, wrong family tag
        let transport = Arc::new(ScriptedTransport::new(vec![meter_advertisement(
            "AA:BB:CC:DD:EE:FF",
        )]));
        let scanner = BroadcastScanner::new(Arc::clone(&transport));

        let result = scanner
            .scan_for(&DeviceKey::new("AA:BB:CC:DD:EE:FF"), DeviceFamily::Plug)
            .await;

        assert!(matches!(result, Err(ChannelError::ScanTimeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn window_timeout_releases_the_radio() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let scanner =
            BroadcastScanner::new(Arc::clone(&transport)).with_window(Duration::from_secs(2));

        let result = scanner
            .scan_for(&DeviceKey::new("AA:BB:CC:DD:EE:FF"), DeviceFamily::Meter)
            .await;

        assert!(matches!(result, Err(ChannelError::ScanTimeout(2000))));
        assert_eq!(transport.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn window_is_capped_at_platform_maximum() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let scanner =
            BroadcastScanner::new(transport).with_window(Duration::from_secs(3600));
        assert_eq!(scanner.window(), BroadcastScanner::<ScriptedTransport>::MAX_WINDOW);
    }

    #[tokio::test]
    async fn no_broadcast_is_unavailable() {
        let scanner = BroadcastScanner::new(Arc::new(NoBroadcast));
        let result = scanner
            .scan_for(&DeviceKey::new("AA:BB:CC:DD:EE:FF"), DeviceFamily::Meter)
            .await;
        assert!(matches!(result, Err(ChannelError::Unavailable(_))));
    }
}
