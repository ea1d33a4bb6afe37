//! Integration tests for Kino Receiver

use std::sync::Arc;
use std::time::Duration;

use kino_receiver::{
    config::DEFAULT_NAMESPACE,
    testing::{RecordingAnalytics, RecordingPlayer},
    AudioTrack, ContentMetadata, ControlOutcome, CustomData, DrmDescriptor, HlsSegmentFormat,
    LoadRequest, LoadStage, PlaybackEvent, PlayerManager, Receiver, ReceiverConfig, RequestInfo,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAY_PATH: &str = "/2.0/R/ENG/WEB_HLS/ALL/CONTENT/PLAY";

struct Harness {
    receiver: Receiver,
    player: Arc<RecordingPlayer>,
    analytics: Arc<RecordingAnalytics>,
}

fn harness(config: ReceiverConfig) -> Harness {
    let player = Arc::new(RecordingPlayer::new());
    let analytics = Arc::new(RecordingAnalytics::new());
    let receiver = Receiver::new(config, player.clone(), analytics.clone()).unwrap();
    receiver.start();
    Harness {
        receiver,
        player,
        analytics,
    }
}

fn config_for(server: &MockServer) -> ReceiverConfig {
    ReceiverConfig::default()
        .with_resolution_origin(Url::parse(&server.uri()).unwrap())
        .with_header("x-device", "chromecast")
}

fn metadata_request(content_id: &str) -> LoadRequest {
    LoadRequest::new("opaque-locator").with_custom_data(CustomData {
        metadata: Some(ContentMetadata {
            content_id: content_id.to_string(),
            request_channel: "WEB_HLS".to_string(),
            channel_id: None,
            auth_token: "auth-token".to_string(),
            entitlement_token: "entitlement-token".to_string(),
        }),
        ..Default::default()
    })
}

fn language_label(label: &str) -> serde_json::Value {
    json!({ "action": "CONTENT_LANGUAGE_LABEL", "audioTrackLabel": label })
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_resolution_replaces_locator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .and(query_param("contentId", "X"))
        .and(header("ascendontoken", "auth-token"))
        .and(header("entitlementtoken", "entitlement-token"))
        .and(header("x-device", "chromecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "200",
            "resultObj": { "url": "https://cdn/X.m3u8" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let delivered = h.receiver.intercept_load(metadata_request("X")).await.unwrap();

    assert_eq!(delivered.locator(), Some("https://cdn/X.m3u8"));
    assert_eq!(delivered.media.hls_segment_format, Some(HlsSegmentFormat::Ts));
    assert!(delivered.drm().is_none());
    assert_eq!(h.receiver.stage().await, LoadStage::Delivered);
}

#[tokio::test]
async fn test_resolution_sends_channel_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .and(query_param("channelId", "1033"))
        .and(query_param("contentId", "X"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "200",
            "resultObj": { "url": "https://cdn/hls/X.m3u8" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let mut request = metadata_request("X");
    if let Some(custom) = request.media.custom_data.as_mut() {
        if let Some(metadata) = custom.metadata.as_mut() {
            metadata.channel_id = Some("1033".to_string());
        }
    }

    let delivered = h.receiver.intercept_load(request).await.unwrap();
    assert_eq!(delivered.locator(), Some("https://cdn/hls/X.m3u8"));
    assert_eq!(delivered.media.hls_segment_format, None);
}

#[tokio::test]
async fn test_failed_status_passes_original_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "404" })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let original = metadata_request("X");
    let delivered = h.receiver.intercept_load(original.clone()).await.unwrap();

    assert_eq!(delivered, original);
    assert_eq!(delivered.locator(), Some("opaque-locator"));
    assert!(delivered.drm().is_none());
    assert_eq!(h.player.effective_playback_config(&delivered).license_url(), None);
}

#[tokio::test]
async fn test_widevine_stream_type_adds_drm() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "200",
            "resultObj": {
                "url": "https://cdn/dash/X.mpd",
                "drmType": "widevine",
                "laURL": "https://license.example.com/wv",
                "streamType": "DASHWV"
            }
        })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let delivered = h.receiver.intercept_load(metadata_request("X")).await.unwrap();

    let drm = delivered.drm().unwrap();
    assert_eq!(drm.protection_system, "widevine");
    assert_eq!(drm.with_credentials, Some(false));
    assert_eq!(h.receiver.stage().await, LoadStage::Delivered);

    let effective = h.player.effective_playback_config(&delivered);
    assert_eq!(effective.license_url(), Some("https://license.example.com/wv"));
    assert_eq!(effective.protection_system(), Some("widevine"));

    let mut license = RequestInfo::new("https://license.example.com/wv");
    effective.prepare_license_request(&mut license);
    assert_eq!(license.headers["ascendontoken"], "auth-token");
    assert_eq!(license.headers["x-device"], "chromecast");
}

#[tokio::test]
async fn test_resolution_timeout_is_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "200", "resultObj": { "url": "https://cdn/late.m3u8" } }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_resolution_timeout(Duration::from_millis(50));
    let h = harness(config);
    let delivered = h.receiver.intercept_load(metadata_request("X")).await.unwrap();

    assert_eq!(delivered.locator(), Some("opaque-locator"));
}

#[tokio::test]
async fn test_undecodable_response_is_recovered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let delivered = h.receiver.intercept_load(metadata_request("X")).await.unwrap();
    assert_eq!(delivered.locator(), Some("opaque-locator"));
}

#[tokio::test]
async fn test_unreachable_service_is_recovered() {
    let config = ReceiverConfig::default()
        .with_resolution_origin(Url::parse("http://127.0.0.1:1").unwrap())
        .with_resolution_timeout(Duration::from_secs(2));
    let h = harness(config);

    let delivered = h.receiver.intercept_load(metadata_request("X")).await.unwrap();
    assert_eq!(delivered.locator(), Some("opaque-locator"));
}

// =============================================================================
// Credential Policy Tests
// =============================================================================

#[tokio::test]
async fn test_credentials_idempotent_across_loads() {
    let h = harness(ReceiverConfig::default());

    for _ in 0..3 {
        h.receiver
            .intercept_load(LoadRequest::new("https://cdn.example.com/hls/master.m3u8"))
            .await
            .unwrap();
    }

    assert_eq!(h.player.config_installs(), 3);
    let config = h.player.playback_config();
    for url in ["manifest", "segment", "caption"] {
        let mut request = RequestInfo::new(format!("https://cdn.example.com/{url}"));
        match url {
            "manifest" => config.prepare_manifest_request(&mut request),
            "segment" => config.prepare_segment_request(&mut request),
            _ => config.prepare_caption_request(&mut request),
        }
        assert!(request.with_credentials, "{url}");
    }
}

#[tokio::test]
async fn test_inline_drm_with_credentials_overrides_headers() {
    let h = harness(ReceiverConfig::default());
    let mut drm = DrmDescriptor::new("widevine", "https://lic").with_header("x-token", "t");
    drm.with_credentials = Some(true);

    let request = LoadRequest::new("https://cdn.example.com/dash/a.mpd").with_custom_data(CustomData {
        drm: Some(drm),
        ..Default::default()
    });
    let delivered = h.receiver.intercept_load(request).await.unwrap();

    let mut license = RequestInfo::new("https://lic");
    h.player
        .effective_playback_config(&delivered)
        .prepare_license_request(&mut license);
    assert!(license.with_credentials);
    assert!(license.headers.is_empty());
}

#[tokio::test]
async fn test_inline_drm_without_credentials_strips_cookies() {
    let h = harness(ReceiverConfig::default());
    let mut drm = DrmDescriptor::new("widevine", "https://lic");
    drm.with_credentials = Some(false);

    let request = LoadRequest::new("https://cdn.example.com/dash/a.mpd").with_custom_data(CustomData {
        drm: Some(drm),
        ..Default::default()
    });
    let delivered = h.receiver.intercept_load(request).await.unwrap();

    let mut license = RequestInfo::new("https://lic");
    h.player
        .effective_playback_config(&delivered)
        .prepare_license_request(&mut license);
    assert!(!license.with_credentials);
}

#[tokio::test]
async fn test_drm_cleared_for_following_loads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "404" })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let drm_load = LoadRequest::new("https://cdn.example.com/dash/a.mpd").with_custom_data(CustomData {
        drm: Some(DrmDescriptor::new("widevine", "https://lic/old").with_header("x-drm-token", "secret")),
        ..Default::default()
    });

    h.receiver.intercept_load(drm_load.clone()).await.unwrap();
    let plain = h
        .receiver
        .intercept_load(LoadRequest::new("https://cdn.example.com/hls/plain.m3u8"))
        .await
        .unwrap();
    let effective = h.player.effective_playback_config(&plain);
    assert_eq!(effective.protection_system(), None);
    assert_eq!(effective.license_url(), None);

    h.receiver.intercept_load(drm_load).await.unwrap();
    let failed = h.receiver.intercept_load(metadata_request("X")).await.unwrap();
    let effective = h.player.effective_playback_config(&failed);
    assert_eq!(effective.protection_system(), None);

    let mut license = RequestInfo::new("https://lic/old");
    effective.prepare_license_request(&mut license);
    assert!(!license.headers.contains_key("x-drm-token"));
}

// =============================================================================
// Control Channel Tests
// =============================================================================

#[tokio::test]
async fn test_language_preference_applied_on_load_complete() {
    let h = harness(ReceiverConfig::default());
    h.receiver
        .on_custom_message(DEFAULT_NAMESPACE, &language_label("fr"))
        .await
        .unwrap();

    h.receiver
        .intercept_load(LoadRequest::new("https://cdn.example.com/hls/master.m3u8"))
        .await
        .unwrap();
    h.player
        .load_tracks(vec![AudioTrack::new(1, "en"), AudioTrack::new(2, "fr")]);

    let applied = h.receiver.on_playback_event(&PlaybackEvent::LoadComplete).await;
    assert_eq!(applied.map(|t| t.track_id), Some(2));
    assert_eq!(h.player.active_audio_track().unwrap().name.as_deref(), Some("fr"));
}

#[tokio::test]
async fn test_language_preference_miss_keeps_default() {
    let h = harness(ReceiverConfig::default());
    h.receiver
        .on_custom_message(DEFAULT_NAMESPACE, &language_label("fr"))
        .await
        .unwrap();

    h.player
        .load_tracks(vec![AudioTrack::new(1, "en"), AudioTrack::new(2, "de")]);
    let applied = h.receiver.on_playback_event(&PlaybackEvent::LoadComplete).await;

    assert!(applied.is_none());
    assert_eq!(h.player.active_audio_track().unwrap().track_id, 1);
}

#[tokio::test]
async fn test_preference_survives_reloads() {
    let h = harness(ReceiverConfig::default());
    h.receiver
        .on_custom_message(DEFAULT_NAMESPACE, &json!({ "data": language_label("fr") }))
        .await
        .unwrap();

    for _ in 0..2 {
        h.receiver
            .intercept_load(LoadRequest::new("https://cdn.example.com/hls/master.m3u8"))
            .await
            .unwrap();
        h.player
            .load_tracks(vec![AudioTrack::new(1, "en"), AudioTrack::new(2, "fr")]);
        assert!(h
            .receiver
            .on_playback_event(&PlaybackEvent::LoadComplete)
            .await
            .is_some());
    }
    assert_eq!(h.player.track_switches(), vec![2, 2]);
}

#[tokio::test]
async fn test_message_during_resolution_is_visible_on_load_complete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PLAY_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "200", "resultObj": { "url": "https://cdn/hls/X.m3u8" } }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let (delivered, outcome) = tokio::join!(
        h.receiver.intercept_load(metadata_request("X")),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            h.receiver
                .on_custom_message(DEFAULT_NAMESPACE, &language_label("fr"))
                .await
        }
    );

    assert_eq!(delivered.unwrap().locator(), Some("https://cdn/hls/X.m3u8"));
    assert_eq!(outcome.unwrap(), ControlOutcome::PreferenceUpdated("fr".into()));

    h.player
        .load_tracks(vec![AudioTrack::new(1, "en"), AudioTrack::new(2, "fr")]);
    let applied = h.receiver.on_playback_event(&PlaybackEvent::LoadComplete).await;
    assert_eq!(applied.map(|t| t.track_id), Some(2));
}

#[tokio::test]
async fn test_analytics_config_delivered_twice() {
    let h = harness(ReceiverConfig::default());
    let message = json!({
        "action": "ANALYTICS_CONFIG_RECEIVED",
        "config": { "key": "analytics-key", "title": "Race" }
    });

    for _ in 0..2 {
        let outcome = h
            .receiver
            .on_custom_message(DEFAULT_NAMESPACE, &message)
            .await
            .unwrap();
        assert_eq!(outcome, ControlOutcome::AnalyticsConfigured);
    }

    let configurations = h.analytics.configurations();
    assert_eq!(configurations.len(), 2);
    assert_eq!(configurations[1]["key"], "analytics-key");
    assert_eq!(h.analytics.contexts()[0].session_id, h.receiver.id());
}

#[tokio::test]
async fn test_unknown_action_ignored() {
    let h = harness(ReceiverConfig::default());
    let outcome = h
        .receiver
        .on_custom_message(DEFAULT_NAMESPACE, &json!({ "action": "SEEK_TO_LIVE" }))
        .await
        .unwrap();

    assert_eq!(outcome, ControlOutcome::Ignored);
    assert!(h.analytics.configurations().is_empty());
    assert_eq!(h.receiver.audio_track_preference().get().await, None);
}

#[tokio::test]
async fn test_invalid_message_rejected() {
    let h = harness(ReceiverConfig::default());
    let err = h
        .receiver
        .on_custom_message(DEFAULT_NAMESPACE, &json!({ "audioTrackLabel": "fr" }))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_MESSAGE");
}
