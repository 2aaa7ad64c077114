use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tunepick_bridge::{
    AuthorizationStatus, BridgeSettings, EncodedArtwork, ErrorCode, LocalizedStrings, MethodCall,
    MethodResponse, NativeMediaItem, PickerBridge, PlatformEvent, ReplyError, Script,
    ScriptedPlatform, UiExecutor, UiThread, UserAction,
};
use tunepick_core::config::NoUiHostPolicy;

struct Harness {
    ui: Arc<UiThread>,
    platform: ScriptedPlatform,
    bridge: PickerBridge,
}

impl Harness {
    fn new(script: Script) -> Self {
        Self::with_settings(script, BridgeSettings::default())
    }

    fn with_settings(script: Script, settings: BridgeSettings) -> Self {
        let ui = UiThread::spawn("ui-test").expect("spawn ui thread");
        let platform = ScriptedPlatform::new(script, ui.clone());
        let bridge = platform.bridge(ui.clone(), settings);
        Self {
            ui,
            platform,
            bridge,
        }
    }

    async fn pick(&self, id: u64) -> MethodResponse {
        self.bridge
            .call(&MethodCall::new(id, "pick"))
            .await
            .expect("pick should be answered")
    }

    /// Wait until every job queued on the UI thread so far has run.
    async fn flush_ui(&self) {
        let (tx, rx) = oneshot::channel();
        self.ui.dispatch(Box::new(move || {
            let _ = tx.send(());
        }));
        rx.await.expect("ui thread alive");
    }
}

fn jpeg_300() -> Vec<u8> {
    let img = RgbImage::from_fn(300, 300, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn song_a() -> NativeMediaItem {
    NativeMediaItem::new("Song A")
        .with_artist("X")
        .with_album("Y")
        .with_duration(210.5)
        .with_asset_url("file:///a.m4a")
        .with_artwork(EncodedArtwork::new(jpeg_300()))
}

fn song_b_stream_only() -> NativeMediaItem {
    NativeMediaItem::new("Song B")
}

#[tokio::test]
async fn unsupported_methods_never_prompt_for_consent() {
    let harness = Harness::new(Script::authorized(UserAction::Cancel));

    for (id, method) in ["browse", "Pick", "", "pick ", "play"].iter().enumerate() {
        let response = harness
            .bridge
            .call(&MethodCall::new(id as u64, *method))
            .await
            .unwrap();
        assert_eq!(response, MethodResponse::NotImplemented, "{method:?}");
    }

    harness.flush_ui().await;
    assert_eq!(harness.platform.log.authorization_requests(), 0);
    assert!(harness.platform.log.events().is_empty());
}

#[tokio::test]
async fn denied_consent_is_a_no_permission_error() {
    let harness = Harness::new(Script::denied());

    let response = harness.pick(1).await;

    match response {
        MethodResponse::Error(err) => {
            assert_eq!(err.code, ErrorCode::NoPermission);
            assert_eq!(err.message, "Apple Music access denied");
        }
        other => panic!("expected no_permission, got {other:?}"),
    }
    harness.flush_ui().await;
    assert_eq!(harness.platform.log.authorization_requests(), 1);
    assert_eq!(harness.platform.log.presentations(), 0);
    assert_eq!(harness.bridge.active_sessions(), 0);
}

#[tokio::test]
async fn every_non_authorized_status_is_refused() {
    let harness = Harness::new(Script::denied());

    for status in [
        AuthorizationStatus::NotDetermined,
        AuthorizationStatus::Restricted,
        AuthorizationStatus::Denied,
    ] {
        harness.platform.set_authorization(status);
        let response = harness.pick(1).await;
        assert!(response.is_error(), "{status:?} should be refused");
    }
    assert_eq!(harness.platform.log.presentations(), 0);
}

#[tokio::test]
async fn cancelling_the_picker_returns_an_empty_list() {
    let harness = Harness::new(Script::authorized(UserAction::Cancel));

    let response = harness.pick(1).await;

    assert_eq!(response, MethodResponse::Success(vec![]));
    harness.flush_ui().await;
    assert_eq!(harness.platform.log.dismissals(), 1);
    assert_eq!(harness.bridge.active_sessions(), 0);
}

#[tokio::test]
async fn stream_only_tracks_are_dropped_and_artwork_is_encoded() {
    let harness = Harness::new(Script::authorized(UserAction::Pick(vec![
        song_a(),
        song_b_stream_only(),
    ])));

    let response = harness.pick(1).await;

    let MethodResponse::Success(items) = response else {
        panic!("expected success");
    };
    assert_eq!(items.len(), 1);
    let song = &items[0];
    assert_eq!(song.title, "Song A");
    assert_eq!(song.artist, "X");
    assert_eq!(song.album, "Y");
    assert_eq!(song.duration, 210.5);
    assert_eq!(song.url, "file:///a.m4a");

    let art = BASE64_STANDARD
        .decode(song.artwork.as_ref().expect("artwork"))
        .expect("valid base64");
    let decoded = image::load_from_memory(&art).expect("valid image");
    assert_eq!((decoded.width(), decoded.height()), (300, 300));

    let json = serde_json::to_value(&items).unwrap();
    assert_eq!(json[0]["title"], "Song A");
    assert!(json[0]["artwork"].is_string());
}

#[tokio::test]
async fn item_without_artwork_has_no_artwork_field() {
    let item = NativeMediaItem::new("Plain").with_asset_url("file:///plain.m4a");
    let harness = Harness::new(Script::authorized(UserAction::Pick(vec![item])));

    let response = harness.pick(1).await;

    let json = serde_json::to_value(&response).unwrap();
    let first = json["result"][0].as_object().unwrap();
    assert!(!first.contains_key("artwork"));
    assert_eq!(first["artist"], "");
}

#[tokio::test]
async fn ui_work_happens_on_the_ui_thread_in_order() {
    let harness = Harness::new(Script::authorized(UserAction::Pick(vec![song_a()])));

    harness.pick(1).await;
    harness.flush_ui().await;

    assert!(harness.platform.log.off_ui_thread().is_empty());
    let events = harness.platform.log.events();
    let position = |wanted: fn(&PlatformEvent) -> bool| {
        events
            .iter()
            .position(wanted)
            .unwrap_or_else(|| panic!("missing event in {events:?}"))
    };
    let resolved = position(|e| matches!(e, PlatformEvent::RootResolved { found: true }));
    let authorized = position(|e| matches!(e, PlatformEvent::AuthorizationRequested));
    let created = position(|e| matches!(e, PlatformEvent::PickerCreated(_)));
    let presented = position(|e| matches!(e, PlatformEvent::Presented { animated: true }));
    let invoked = position(|e| matches!(e, PlatformEvent::DelegateInvoked));
    let dismissed = position(|e| matches!(e, PlatformEvent::Dismissed { animated: true }));
    assert!(resolved < authorized);
    assert!(authorized < created);
    assert!(created < presented);
    assert!(presented < invoked);
    assert!(invoked < dismissed);
}

#[tokio::test]
async fn picker_is_configured_for_multiple_music_items() {
    let settings = BridgeSettings {
        strings: LocalizedStrings::for_locale("vi"),
        ..BridgeSettings::default()
    };
    let harness = Harness::with_settings(Script::authorized(UserAction::Cancel), settings);

    harness.pick(1).await;

    let options = harness
        .platform
        .log
        .events()
        .into_iter()
        .find_map(|e| match e {
            PlatformEvent::PickerCreated(options) => Some(options),
            _ => None,
        })
        .expect("picker created");
    assert!(options.allows_multiple);
    assert_eq!(options.media_types, tunepick_bridge::MediaTypes::Music);
    assert_eq!(options.prompt, "Chọn nhạc từ Apple Music");
}

#[tokio::test]
async fn sequential_picks_are_independent_sessions() {
    let harness = Harness::new(Script::authorized(UserAction::Pick(vec![song_a()])));

    let first = harness.pick(1).await;
    harness.flush_ui().await;
    harness.platform.set_action(UserAction::Cancel);
    let second = harness.pick(2).await;
    harness.flush_ui().await;

    match first {
        MethodResponse::Success(items) => assert_eq!(items.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(second, MethodResponse::Success(vec![]));
    assert_eq!(harness.platform.log.authorization_requests(), 2);
    assert_eq!(harness.platform.log.presentations(), 2);
    assert_eq!(harness.platform.log.dismissals(), 2);
    assert_eq!(harness.bridge.active_sessions(), 0);
}

#[tokio::test]
async fn collector_outlives_presentation_until_the_user_acts() {
    let harness = Harness::new(Script::authorized(UserAction::Ignore));

    let mut rx = harness.bridge.handle(&MethodCall::new(1, "pick"));
    // Let authorization finish and the presentation job run.
    for _ in 0..50 {
        harness.flush_ui().await;
        if harness.platform.log.presentations() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    harness.flush_ui().await;

    assert_eq!(harness.platform.log.presentations(), 1);
    assert_eq!(harness.bridge.active_sessions(), 1);
    assert!(rx.try_recv().is_none());
    assert_eq!(
        harness
            .platform
            .log
            .count(|e| matches!(e, PlatformEvent::DelegateReleased | PlatformEvent::SurfaceReleased)),
        0
    );
}

#[tokio::test]
async fn missing_ui_root_is_reported_by_default() {
    let script = Script {
        ui_root: false,
        ..Script::authorized(UserAction::Cancel)
    };
    let harness = Harness::new(script);

    match harness.pick(1).await {
        MethodResponse::Error(err) => assert_eq!(err.code, ErrorCode::NoUiHost),
        other => panic!("expected no_ui_host, got {other:?}"),
    }
    harness.flush_ui().await;
    assert_eq!(harness.platform.log.authorization_requests(), 0);
    assert_eq!(harness.platform.log.presentations(), 0);
    assert!(harness.platform.log.off_ui_thread().is_empty());
}

#[tokio::test]
async fn missing_ui_root_can_be_silent() {
    let script = Script {
        ui_root: false,
        ..Script::authorized(UserAction::Cancel)
    };
    let settings = BridgeSettings {
        no_ui_host: NoUiHostPolicy::Silent,
        ..BridgeSettings::default()
    };
    let harness = Harness::with_settings(script, settings);

    let result = harness.bridge.call(&MethodCall::new(1, "pick")).await;

    assert_eq!(result, Err(ReplyError::Abandoned));
    assert_eq!(harness.platform.log.authorization_requests(), 0);
    assert_eq!(
        harness.platform.log.events(),
        vec![PlatformEvent::RootResolved { found: false }]
    );
}
