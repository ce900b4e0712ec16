mod common;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use common::{bridge, numbered_songs, track, FakeCatalog};
use yt_music_bridge::{MusicBridge, StreamEvent, StreamKind, StreamState, Subscription};

const WAIT: Duration = Duration::from_secs(5);

async fn drain(subscription: &mut Subscription) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = timeout(WAIT, subscription.recv()).await.expect("stream stalled") {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn search_stream_emits_up_to_limit_then_ends() {
    let catalog = Arc::new(FakeCatalog::with_songs(numbered_songs(10)));
    let bridge = bridge(catalog);
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 3}))
        .await
        .unwrap();
    let events = drain(&mut subscription).await;

    assert_eq!(events.len(), 4);
    assert!(events[..3].iter().all(|e| matches!(e, StreamEvent::Item(_))));
    assert_eq!(events[3], StreamEvent::EndOfStream);
    if let StreamEvent::Item(first) = &events[0] {
        assert_eq!(first["videoId"], "vid000");
    }
    assert_eq!(subscription.finished().await, StreamState::Completed);
}

#[tokio::test]
async fn exhausted_upstream_ends_the_stream_early() {
    let mut catalog = FakeCatalog::with_songs(numbered_songs(3));
    catalog.silent.insert("vid001".to_string());
    let bridge = bridge(Arc::new(catalog));
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 10}))
        .await
        .unwrap();
    let events = drain(&mut subscription).await;

    let items = events.iter().filter(|e| matches!(e, StreamEvent::Item(_))).count();
    assert_eq!(items, 2);
    assert_eq!(events.last(), Some(&StreamEvent::EndOfStream));
}

#[tokio::test]
async fn uninitialized_stream_reports_stream_error() {
    let bridge = bridge(Arc::new(FakeCatalog::default()));

    let mut subscription = bridge
        .listen(StreamKind::Artist, json!({"artistName": "Band"}))
        .await
        .unwrap();
    let events = drain(&mut subscription).await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        StreamEvent::Error(error) => {
            assert_eq!(error.code, "STREAM_ERROR");
            assert_eq!(error.details.as_ref().unwrap()["kind"], "not_initialized");
        }
        other => panic!("expected an error event, got {:?}", other),
    }
    assert_eq!(subscription.finished().await, StreamState::Errored);
    assert_eq!(events[0].to_json()["event"], "error");
}

#[tokio::test]
async fn invalid_stream_arguments_report_stream_error() {
    let catalog = Arc::new(FakeCatalog::with_songs(numbered_songs(3)));
    let bridge = bridge(catalog.clone());
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(StreamKind::Related, json!({"songName": "Clocks"}))
        .await
        .unwrap();
    let events = drain(&mut subscription).await;

    match &events[..] {
        [StreamEvent::Error(error)] => {
            assert_eq!(error.code, "STREAM_ERROR");
            assert_eq!(error.details.as_ref().unwrap()["field"], "artistName");
        }
        other => panic!("unexpected events {:?}", other),
    }
    assert_eq!(catalog.calls(), 0);
}

#[tokio::test]
async fn cancel_stops_emission_within_one_pacing_interval() {
    let catalog = Arc::new(FakeCatalog::with_songs(numbered_songs(100)));
    let bridge = bridge(catalog);
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 100}))
        .await
        .unwrap();

    for _ in 0..2 {
        let event = timeout(WAIT, subscription.recv()).await.unwrap();
        assert!(matches!(event, Some(StreamEvent::Item(_))));
    }

    bridge.channel(StreamKind::Search).unwrap().cancel().await;

    assert_eq!(subscription.recv().await, None);
    let state = timeout(Duration::from_millis(100), subscription.finished())
        .await
        .expect("producer did not stop within one pacing interval");
    assert_eq!(state, StreamState::Cancelled);
    assert_eq!(subscription.recv().await, None);
}

#[tokio::test]
async fn new_listener_cancels_previous_subscription() {
    let catalog = Arc::new(FakeCatalog::with_songs(numbered_songs(50)));
    let bridge = bridge(catalog);
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut first = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 50}))
        .await
        .unwrap();
    let event = timeout(WAIT, first.recv()).await.unwrap();
    assert!(matches!(event, Some(StreamEvent::Item(_))));

    let mut second = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 2}))
        .await
        .unwrap();
    assert_ne!(first.id(), second.id());

    assert_eq!(first.recv().await, None);
    assert_eq!(timeout(WAIT, first.finished()).await.unwrap(), StreamState::Cancelled);

    let events = drain(&mut second).await;
    assert_eq!(events.len(), 3);
    assert_eq!(second.finished().await, StreamState::Completed);
}

#[tokio::test]
async fn dropping_the_receiver_cancels_the_producer() {
    let catalog = Arc::new(FakeCatalog::with_songs(numbered_songs(50)));
    let bridge = bridge(catalog);
    bridge.invoke("initialize", json!({})).await.unwrap();

    let subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 50}))
        .await
        .unwrap();
    drop(subscription);

    let channel = bridge.channel(StreamKind::Search).unwrap();
    let stopped = timeout(WAIT, async {
        while channel.state().await != StreamState::Cancelled {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(stopped.is_ok());
}

async fn wait_for_channel_state(bridge: &MusicBridge, kind: StreamKind, wanted: StreamState, within: Duration) -> bool {
    let channel = bridge.channel(kind).unwrap();
    timeout(within, async {
        while channel.state().await != wanted {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test]
async fn dropping_the_receiver_stops_upstream_pulls_while_records_are_skipped() {
    let songs = numbered_songs(100);
    let mut catalog = FakeCatalog::with_songs(songs.clone());
    catalog.silent = songs.iter().filter_map(|s| s.video_id.clone()).collect();
    let catalog = Arc::new(catalog);
    let bridge = bridge(catalog.clone());
    bridge.invoke("initialize", json!({})).await.unwrap();

    let subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 50}))
        .await
        .unwrap();
    drop(subscription);

    assert!(wait_for_channel_state(&bridge, StreamKind::Search, StreamState::Cancelled, WAIT).await);
    let at_cancel = catalog.calls();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(catalog.calls(), at_cancel);
    assert!(at_cancel < 10, "upstream was called {} times after detach", at_cancel);
}

#[tokio::test]
async fn cancel_while_waiting_on_upstream_stops_within_one_pacing_interval() {
    let catalog = FakeCatalog {
        stalled: true,
        ..FakeCatalog::default()
    };
    let bridge = bridge(Arc::new(catalog));
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 5}))
        .await
        .unwrap();
    assert!(wait_for_channel_state(&bridge, StreamKind::Search, StreamState::Emitting, WAIT).await);

    subscription.cancel();

    let state = timeout(Duration::from_millis(100), subscription.finished())
        .await
        .expect("producer stayed blocked on upstream");
    assert_eq!(state, StreamState::Cancelled);
    assert_eq!(subscription.recv().await, None);
}

#[tokio::test]
async fn dropping_the_receiver_while_waiting_on_upstream_cancels() {
    let catalog = FakeCatalog {
        stalled: true,
        ..FakeCatalog::default()
    };
    let bridge = bridge(Arc::new(catalog));
    bridge.invoke("initialize", json!({})).await.unwrap();

    let subscription = bridge
        .listen(StreamKind::Search, json!({"query": "song", "limit": 5}))
        .await
        .unwrap();
    assert!(wait_for_channel_state(&bridge, StreamKind::Search, StreamState::Emitting, WAIT).await);

    drop(subscription);

    assert!(
        wait_for_channel_state(&bridge, StreamKind::Search, StreamState::Cancelled, Duration::from_millis(100)).await,
        "producer stayed blocked on upstream after the receiver was dropped"
    );
}

#[tokio::test]
async fn dispose_cancels_active_streams() {
    let seed = track("seed", "Viva La Vida", "Coldplay");
    let mut catalog = FakeCatalog::with_songs(vec![seed.clone()]);
    catalog.radio = std::iter::once(seed).chain(numbered_songs(40)).collect();
    let bridge = bridge(Arc::new(catalog));
    bridge.invoke("initialize", json!({})).await.unwrap();

    let mut subscription = bridge
        .listen(
            StreamKind::Related,
            json!({"songName": "Viva La Vida", "artistName": "Coldplay", "limit": 40, "includeOriginal": true}),
        )
        .await
        .unwrap();
    match timeout(WAIT, subscription.recv()).await.unwrap() {
        Some(StreamEvent::Item(item)) => assert_eq!(item["isOriginal"], true),
        other => panic!("unexpected event {:?}", other),
    }

    bridge.invoke("dispose", json!({})).await.unwrap();

    assert_eq!(subscription.recv().await, None);
    assert_eq!(timeout(WAIT, subscription.finished()).await.unwrap(), StreamState::Cancelled);
}

#[test]
fn channel_names_round_trip() {
    for kind in StreamKind::ALL {
        assert_eq!(StreamKind::parse(kind.channel_name()), Some(kind));
    }
    assert_eq!(StreamKind::parse("artist"), Some(StreamKind::Artist));
    assert_eq!(StreamKind::parse("lyrics"), None);
}
