// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end sync engine tests: coalescing, push ordering, channel
//! fallback, offline handling and shutdown.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use homesync_lib::channel::{
    Advertisement, ApiConfig, BroadcastTransport, Channel, NoBroadcast, PushReceiver,
};
use homesync_lib::engine::{EngineConfig, SyncEngine};
use homesync_lib::error::{ChannelError, Error};
use homesync_lib::event::DeviceEvent;
use homesync_lib::family::DeviceFamily;
use homesync_lib::registry::EngineRegistry;
use homesync_lib::retry::RetryPolicy;
use homesync_lib::select::SelectorConfig;
use homesync_lib::state::{Connectivity, Field, FieldValue, Intent, Source};
use homesync_lib::types::{Celsius, Percent, PowerState};
use homesync_lib::DeviceKey;

const MAC: &str = "AA:BB:CC:DD:EE:FF";

fn device() -> DeviceKey {
    DeviceKey::new(MAC)
}

/// A scripted radio: each scan drains the next batch of advertisements.
struct MockRadio {
    batches: Mutex<VecDeque<Vec<Advertisement>>>,
    stops: AtomicU32,
    sent_frames: Mutex<Vec<(DeviceKey, Vec<u8>)>>,
}

impl MockRadio {
    fn new(batches: Vec<Vec<Advertisement>>) -> Arc<Self> {
        Arc::new(Self {
            batches: Mutex::new(batches.into()),
            stops: AtomicU32::new(0),
            sent_frames: Mutex::new(Vec::new()),
        })
    }
}

impl BroadcastTransport for MockRadio {
    async fn start_scan(&self) -> Result<mpsc::Receiver<Advertisement>, ChannelError> {
        let (tx, rx) = mpsc::channel(16);
        let batch = self.batches.lock().pop_front().unwrap_or_default();
        for advertisement in batch {
            let _ = tx.try_send(advertisement);
        }
        // Keep the stream open until the scanner's window closes.
        tokio::spawn(async move {
            let _tx = tx;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        Ok(rx)
    }

    async fn stop_scan(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn send_frame(&self, address: &DeviceKey, frame: &[u8]) -> Result<(), ChannelError> {
        self.sent_frames
            .lock()
            .push((address.clone(), frame.to_vec()));
        Ok(())
    }
}

fn meter_advertisement() -> Advertisement {
    Advertisement {
        address: device(),
        service_data: vec![b'T', 21, 4, 47, 90],
    }
}

/// Fast timings for tests: 50 ms debounce, no retry spacing, and a
/// confirmatory refresh too far out to interfere.
fn test_config() -> EngineConfig {
    EngineConfig::new()
        .with_debounce_window(Duration::from_millis(50))
        .with_retry(RetryPolicy::new(1, Duration::ZERO))
        .with_confirm_delay(Duration::from_secs(3600))
        .with_scan_window(Duration::from_millis(50))
}

fn api_engine(
    server: &MockServer,
    family: DeviceFamily,
    config: EngineConfig,
) -> SyncEngine<NoBroadcast> {
    let api = ApiConfig::new(server.uri(), "token", "secret")
        .into_client()
        .unwrap();
    SyncEngine::<NoBroadcast>::builder(device(), family)
        .with_api(api)
        .with_config(config)
        .build()
}

fn success_envelope(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "statusCode": 100,
        "body": body
    }))
}

async fn mount_command(server: &MockServer, command: &str, response: ResponseTemplate, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/devices/AABBCCDDEEFF/commands"))
        .and(body_partial_json(serde_json::json!({"command": command})))
        .respond_with(response)
        .expect(expect)
        .mount(server)
        .await;
}

// ============================================================================
// Debounce and push ordering
// ============================================================================

#[tokio::test]
async fn burst_of_intents_collapses_to_one_cycle_with_last_value_wins() {
    let server = MockServer::start().await;
    mount_command(&server, "turnOff", success_envelope(serde_json::json!({})), 1).await;
    mount_command(&server, "turnOn", success_envelope(serde_json::json!({})), 0).await;

    let engine = api_engine(&server, DeviceFamily::Plug, test_config());

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)))
        .unwrap();
    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::Off)))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    server.verify().await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.power(), Some(PowerState::Off));
    assert_eq!(snapshot.source_of(Field::Power), Some(Source::Command));
    engine.shutdown();
}

#[tokio::test]
async fn power_off_intent_skips_level_group_entirely() {
    let server = MockServer::start().await;
    mount_command(&server, "turnOff", success_envelope(serde_json::json!({})), 1).await;
    mount_command(&server, "setBrightness", success_envelope(serde_json::json!({})), 0).await;

    let engine = api_engine(&server, DeviceFamily::Bulb, test_config());

    engine
        .submit_intent(
            Intent::new()
                .with_field(Field::Power, FieldValue::Power(PowerState::Off))
                .with_field(Field::Level, FieldValue::Percent(Percent::new(80).unwrap())),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    server.verify().await;

    // The level command was withheld, so the level field stays unknown
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.power(), Some(PowerState::Off));
    assert!(snapshot.field(Field::Level).is_none());
    engine.shutdown();
}

#[tokio::test]
async fn power_on_is_pushed_before_level() {
    let server = MockServer::start().await;
    mount_command(&server, "turnOn", success_envelope(serde_json::json!({})), 1).await;
    mount_command(&server, "setBrightness", success_envelope(serde_json::json!({})), 1).await;

    let engine = api_engine(&server, DeviceFamily::Bulb, test_config());

    engine
        .submit_intent(
            Intent::new()
                .with_field(Field::Power, FieldValue::Power(PowerState::On))
                .with_field(Field::Level, FieldValue::Percent(Percent::new(80).unwrap())),
        )
        .unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    server.verify().await;

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<String> = requests
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect();
    assert!(bodies[0].contains("turnOn"), "first command was {}", bodies[0]);
    assert!(
        bodies[1].contains("setBrightness"),
        "second command was {}",
        bodies[1]
    );
    engine.shutdown();
}

// ============================================================================
// Retry and failure handling
// ============================================================================

#[tokio::test]
async fn failing_push_is_attempted_exactly_max_times() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices/AABBCCDDEEFF/commands"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let engine = api_engine(
        &server,
        DeviceFamily::Plug,
        test_config().with_retry(RetryPolicy::new(3, Duration::ZERO)),
    );
    let mut events = engine.subscribe();

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)))
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let DeviceEvent::PushFailed { .. } = events.recv().await.unwrap() {
                break;
            }
        }
    })
    .await;
    assert!(event.is_ok(), "expected a PushFailed event");

    server.verify().await;
    engine.shutdown();
}

#[tokio::test]
async fn terminal_rejection_preserves_last_known_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/AABBCCDDEEFF/status"))
        .respond_with(success_envelope(serde_json::json!({"power": "on"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/devices/AABBCCDDEEFF/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 151,
            "message": "command not supported"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = api_engine(
        &server,
        DeviceFamily::Plug,
        test_config().with_retry(RetryPolicy::new(5, Duration::ZERO)),
    );

    engine.refresh().await.unwrap();
    assert_eq!(engine.snapshot().power(), Some(PowerState::On));

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::Off)))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // One attempt only, and the last known value survives with an error source
    server.verify().await;
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.power(), Some(PowerState::On));
    assert_eq!(snapshot.source_of(Field::Power), Some(Source::Error));
    engine.shutdown();
}

#[tokio::test]
async fn offline_status_code_applies_family_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/AABBCCDDEEFF/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "statusCode": 161,
            "message": "device offline"
        })))
        .mount(&server)
        .await;

    let engine = api_engine(&server, DeviceFamily::Plug, test_config());

    engine.refresh().await.unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.power(), Some(PowerState::Off));
    assert_eq!(snapshot.connectivity(), Connectivity::Unreachable);
    assert_eq!(snapshot.source_of(Field::Power), Some(Source::Error));
    engine.shutdown();
}

// ============================================================================
// Cross-channel merge
// ============================================================================

#[tokio::test]
async fn push_update_overlays_polled_state_per_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/AABBCCDDEEFF/status"))
        .respond_with(success_envelope(
            serde_json::json!({"temperature": 21.4, "humidity": 47}),
        ))
        .mount(&server)
        .await;

    let registry: EngineRegistry<NoBroadcast> = EngineRegistry::new();
    let api = ApiConfig::new(server.uri(), "token", "secret")
        .into_client()
        .unwrap();
    let engine = SyncEngine::<NoBroadcast>::builder(device(), DeviceFamily::Meter)
        .with_api(api)
        .with_config(test_config())
        .with_event_bus(registry.event_bus().clone())
        .build();
    registry.register(engine.clone()).await;

    // Poll delivers the full reading first
    engine.refresh().await.unwrap();

    // A push notification then updates only the temperature
    let receiver = PushReceiver::new(registry.clone());
    receiver
        .deliver(&serde_json::json!({
            "context": {"deviceMac": MAC, "temperature": 21.6}
        }))
        .await
        .unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(
        snapshot.field(Field::Temperature),
        Some(FieldValue::Celsius(Celsius::new(21.6)))
    );
    assert_eq!(
        snapshot.field(Field::Humidity),
        Some(FieldValue::Percent(Percent::new(47).unwrap()))
    );
    assert_eq!(snapshot.source_of(Field::Temperature), Some(Source::Push));
    assert_eq!(snapshot.source_of(Field::Humidity), Some(Source::Poll));
    assert_eq!(snapshot.connectivity(), Connectivity::Reachable);

    registry.shutdown_all().await;
}

#[tokio::test]
async fn push_for_unregistered_device_is_rejected() {
    let registry: EngineRegistry<NoBroadcast> = EngineRegistry::new();
    let receiver = PushReceiver::new(registry);

    let result = receiver
        .deliver(&serde_json::json!({
            "context": {"deviceMac": MAC, "temperature": 21.6}
        }))
        .await;
    assert!(matches!(result, Err(Error::DeviceNotFound)));
}

// ============================================================================
// Broadcast scanning and fallback
// ============================================================================

#[tokio::test]
async fn scan_timeout_retains_fields_and_marks_unreachable() {
    // First scan answers, second scan stays silent
    let radio = MockRadio::new(vec![vec![meter_advertisement()], vec![]]);
    let engine = SyncEngine::builder(device(), DeviceFamily::Meter)
        .with_broadcast(Arc::clone(&radio))
        .with_config(
            test_config().with_selector(SelectorConfig::new(Channel::Broadcast)),
        )
        .build();

    engine.refresh().await.unwrap();
    let snapshot = engine.snapshot();
    assert_eq!(
        snapshot.field(Field::Temperature),
        Some(FieldValue::Celsius(Celsius::new(21.4)))
    );
    assert_eq!(snapshot.connectivity(), Connectivity::Reachable);

    let result = engine.refresh().await;
    assert!(matches!(
        result,
        Err(Error::Channel(ChannelError::ScanTimeout(_)))
    ));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.connectivity(), Connectivity::Unreachable);
    // Existing readings are retained, not zeroed
    assert_eq!(
        snapshot.field(Field::Temperature),
        Some(FieldValue::Celsius(Celsius::new(21.4)))
    );
    // The radio was released by both scans
    assert_eq!(radio.stops.load(Ordering::SeqCst), 2);
    engine.shutdown();
}

#[tokio::test]
async fn failed_scan_falls_back_to_poll_within_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices/AABBCCDDEEFF/status"))
        .respond_with(success_envelope(
            serde_json::json!({"temperature": 21.4, "humidity": 47}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let radio = MockRadio::new(vec![vec![]]);
    let api = ApiConfig::new(server.uri(), "token", "secret")
        .into_client()
        .unwrap();
    let engine = SyncEngine::builder(device(), DeviceFamily::Meter)
        .with_broadcast(radio)
        .with_api(api)
        .with_config(test_config().with_selector(
            SelectorConfig::new(Channel::Broadcast).with_fallback(Channel::Poll),
        ))
        .build();
    let mut events = engine.subscribe();

    engine.refresh().await.unwrap();
    server.verify().await;

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.connectivity(), Connectivity::Reachable);
    assert_eq!(
        snapshot.field(Field::Humidity),
        Some(FieldValue::Percent(Percent::new(47).unwrap()))
    );

    // The scan failure was visible before the fallback recovered
    let mut saw_unreachable = false;
    while let Ok(event) = events.try_recv() {
        if matches!(
            event,
            DeviceEvent::ConnectivityChanged {
                connectivity: Connectivity::Unreachable,
                ..
            }
        ) {
            saw_unreachable = true;
        }
    }
    assert!(saw_unreachable);
    engine.shutdown();
}

#[tokio::test]
async fn broadcast_push_sends_command_frames() {
    let radio = MockRadio::new(vec![]);
    let engine = SyncEngine::builder(device(), DeviceFamily::Bulb)
        .with_broadcast(Arc::clone(&radio))
        .with_config(
            test_config().with_selector(SelectorConfig::new(Channel::Broadcast)),
        )
        .build();

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let frames = radio.sent_frames.lock().clone();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, device());
    assert_eq!(frames[0].1, vec![b'u', 0x01, 1]);

    assert_eq!(engine.snapshot().power(), Some(PowerState::On));
    engine.shutdown();
}

// ============================================================================
// Confirmation and shutdown
// ============================================================================

#[tokio::test]
async fn successful_cycle_schedules_confirmatory_refresh() {
    let server = MockServer::start().await;
    mount_command(&server, "turnOn", success_envelope(serde_json::json!({})), 1).await;
    // The device disagrees with the optimistic command state, as a remote
    // that clamps or overrides pushed values would
    Mock::given(method("GET"))
        .and(path("/devices/AABBCCDDEEFF/status"))
        .respond_with(success_envelope(serde_json::json!({"power": "off"})))
        .expect(1)
        .mount(&server)
        .await;

    let engine = api_engine(
        &server,
        DeviceFamily::Plug,
        test_config().with_confirm_delay(Duration::from_millis(100)),
    );

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(800)).await;
    server.verify().await;

    // The confirmatory refresh reconciled the server-side adjustment
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.power(), Some(PowerState::Off));
    assert_eq!(snapshot.source_of(Field::Power), Some(Source::Poll));
    engine.shutdown();
}

#[tokio::test]
async fn shutdown_drops_pending_intent_without_pushing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(success_envelope(serde_json::json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let engine = api_engine(&server, DeviceFamily::Plug, test_config());

    engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)))
        .unwrap();
    engine.shutdown();

    tokio::time::sleep(Duration::from_millis(300)).await;
    server.verify().await;

    // Further submissions are rejected
    let result = engine
        .submit_intent(Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)));
    assert!(result.is_err());
}

#[tokio::test]
async fn intent_outside_family_schema_is_rejected_up_front() {
    let server = MockServer::start().await;
    let engine = api_engine(&server, DeviceFamily::Contact, test_config());

    let result = engine.submit_intent(
        Intent::new().with_field(Field::Level, FieldValue::Percent(Percent::MAX)),
    );
    assert!(matches!(result, Err(Error::Device(_))));
    engine.shutdown();
}
