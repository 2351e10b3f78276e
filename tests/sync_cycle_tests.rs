//! Engine and coordinator behavior against mock catalogs.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{track, MockCatalog, RecordingNotifier};
use likesync::{
    CatalogAdapter, CatalogId, CycleCoordinator, CycleRequest, CycleStats, Direction, Notifier,
    SuppressionStore, SyncEngine, SyncSettings,
};

struct Harness {
    yandex: Arc<MockCatalog>,
    spotify: Arc<MockCatalog>,
    notifier: Arc<RecordingNotifier>,
    stats: Arc<CycleStats>,
    engine: SyncEngine,
}

fn fast_settings() -> SyncSettings {
    SyncSettings {
        item_delay: Duration::ZERO,
        ..SyncSettings::default()
    }
}

fn harness_with(settings: SyncSettings, max_retries: u32) -> Harness {
    let yandex = Arc::new(MockCatalog::new(CatalogId::Yandex));
    let spotify = Arc::new(MockCatalog::new(CatalogId::Spotify));
    let notifier = Arc::new(RecordingNotifier::new());
    let stats = Arc::new(CycleStats::new());

    let engine = SyncEngine::new(
        yandex.clone() as Arc<dyn CatalogAdapter>,
        spotify.clone() as Arc<dyn CatalogAdapter>,
        SuppressionStore::in_memory(max_retries),
        notifier.clone() as Arc<dyn Notifier>,
        stats.clone(),
        settings,
    );

    Harness {
        yandex,
        spotify,
        notifier,
        stats,
        engine,
    }
}

fn harness() -> Harness {
    harness_with(fast_settings(), 5)
}

#[tokio::test]
async fn matching_track_is_added_and_announced() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", Some(210_000)));
    h.spotify.set_search_result(
        "Artist X",
        "Song Y",
        track(CatalogId::Spotify, "t1", "Artist X", "Song Y", Some(205_000)),
    );

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 1);
    assert!(h.spotify.liked_ids().contains(&"t1".to_string()));
    assert_eq!(h.stats.added_to(CatalogId::Spotify), 1);
    assert_eq!(h.stats.added_to(CatalogId::Yandex), 0);

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Artist X"));
    assert!(messages[0].contains("Song Y"));
}

#[tokio::test]
async fn repeated_pass_adds_nothing_new() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", Some(210_000)));
    h.spotify.set_search_result(
        "Artist X",
        "Song Y",
        track(CatalogId::Spotify, "t1", "Artist X", "Song Y", Some(210_000)),
    );

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();
    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 1);
    assert_eq!(h.stats.added_to(CatalogId::Spotify), 1);
    assert_eq!(h.notifier.messages().len(), 1);
}

#[tokio::test]
async fn two_sources_resolving_to_one_target_add_once() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", None));
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y2", "Artist X", "Song Y!", None));
    let candidate = track(CatalogId::Spotify, "t1", "Artist X", "Song Y", None);
    h.spotify
        .set_search_result("Artist X", "Song Y", candidate.clone());
    h.spotify
        .set_search_result("Artist X", "Song Y!", candidate);

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 1);
}

#[tokio::test]
async fn missing_search_result_registers_failures_until_suppressed() {
    let h = harness_with(fast_settings(), 3);
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Obscure", "B-Side", None));

    let key = "yandex->spotify:Obscure - B-Side";
    for expected in 1..=3u32 {
        h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();
        assert_eq!(h.engine.suppression_count(key), expected);
    }

    // Suppressed now: further passes must not touch the search API
    let searches_before = h.spotify.search_calls();
    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();
    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.search_calls(), searches_before);
    assert_eq!(h.engine.suppression_count(key), 3);
    assert_eq!(h.spotify.add_calls(), 0);
}

#[tokio::test]
async fn dissimilar_candidate_is_rejected_and_counted() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Aphex Twin", "Windowlicker", None));
    h.spotify.set_search_result(
        "Aphex Twin",
        "Windowlicker",
        track(CatalogId::Spotify, "t9", "Rick Astley", "Never Gonna Give You Up", None),
    );

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 0);
    assert_eq!(
        h.engine.suppression_count("yandex->spotify:Aphex Twin - Windowlicker"),
        1
    );
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn duration_mismatch_is_rejected_and_counted() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", Some(210_000)));
    // Same text, 15s apart: a live version, not the track we liked
    h.spotify.set_search_result(
        "Artist X",
        "Song Y",
        track(CatalogId::Spotify, "t1", "Artist X", "Song Y", Some(225_000)),
    );

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 0);
    assert_eq!(
        h.engine.suppression_count("yandex->spotify:Artist X - Song Y"),
        1
    );
}

#[tokio::test]
async fn unknown_duration_fails_open() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", Some(210_000)));
    // No duration reported; the textual match alone must suffice
    h.spotify.set_search_result(
        "Artist X",
        "Song Y",
        track(CatalogId::Spotify, "t1", "Artist X", "Song Y", None),
    );

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    assert_eq!(h.spotify.add_calls(), 1);
}

#[tokio::test]
async fn broken_item_does_not_abort_the_batch() {
    let h = harness();
    for i in 1..=5 {
        let id = format!("y{}", i);
        let title = format!("Song {}", i);
        h.yandex
            .add_liked_track(track(CatalogId::Yandex, &id, "Artist", &title, None));
        h.spotify.set_search_result(
            "Artist",
            &title,
            track(CatalogId::Spotify, &format!("t{}", i), "Artist", &title, None),
        );
    }
    h.yandex.fail_resolution_of("y3");

    h.engine.run_pass(Direction::YandexToSpotify).await.unwrap();

    // Items 1, 2, 4, 5 still went through; item-level failures are not
    // pass-level errors
    assert_eq!(h.spotify.add_calls(), 4);
    assert_eq!(h.stats.error_count(), 0);
    assert_eq!(
        h.engine.suppression_count("yandex->spotify:Artist - Song 3"),
        0
    );
}

#[tokio::test]
async fn failing_like_list_aborts_only_that_direction() {
    let h = harness();
    h.yandex.fail_like_list();
    h.spotify
        .add_liked_track(track(CatalogId::Spotify, "s1", "Artist X", "Song Y", None));

    // Yandex->Spotify cannot even enumerate its source; Spotify->Yandex
    // cannot snapshot its target. Both passes fail, the cycle completes.
    let coordinator = Arc::new(CycleCoordinator::new(h.engine, h.stats.clone()));
    let result = coordinator.run_cycle().await;

    assert_eq!(result, CycleRequest::Accepted);
    assert_eq!(h.stats.error_count(), 2);
    assert!(!coordinator.is_running());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_cycle_request_is_rejected_while_running() {
    let h = harness();
    // Hold the cycle open long enough to race against it
    h.yandex.set_like_list_delay(Duration::from_millis(300));

    let coordinator = Arc::new(CycleCoordinator::new(h.engine, h.stats.clone()));

    assert_eq!(coordinator.request_cycle(), CycleRequest::Accepted);
    assert_eq!(coordinator.request_cycle(), CycleRequest::RejectedBusy);
    assert_eq!(coordinator.status().state, likesync::sync::SyncState::Running);

    // Wait for the background cycle to finish
    let mut waited = Duration::ZERO;
    while coordinator.is_running() && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert!(!coordinator.is_running());

    // Back to IDLE, requests are welcome again
    assert_eq!(coordinator.run_cycle().await, CycleRequest::Accepted);
}

#[tokio::test]
async fn status_snapshot_tracks_runs() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist X", "Song Y", None));
    h.spotify.set_search_result(
        "Artist X",
        "Song Y",
        track(CatalogId::Spotify, "t1", "Artist X", "Song Y", None),
    );

    let coordinator = Arc::new(CycleCoordinator::new(h.engine, h.stats.clone()));

    let before = coordinator.status();
    assert_eq!(before.state, likesync::sync::SyncState::Idle);
    assert!(before.last_run_started_at.is_none());
    assert_eq!(before.added_to_spotify, 0);

    coordinator.run_cycle().await;

    let after = coordinator.status();
    assert_eq!(after.state, likesync::sync::SyncState::Idle);
    assert!(after.last_run_started_at.is_some());
    assert_eq!(after.added_to_spotify, 1);
    assert_eq!(after.error_count, 0);
}

#[tokio::test]
async fn full_cycle_runs_both_directions() {
    let h = harness();
    h.yandex
        .add_liked_track(track(CatalogId::Yandex, "y1", "Artist A", "Forward", None));
    h.spotify.set_search_result(
        "Artist A",
        "Forward",
        track(CatalogId::Spotify, "sf", "Artist A", "Forward", None),
    );
    h.spotify
        .add_liked_track(track(CatalogId::Spotify, "s1", "Artist B", "Backward", None));
    h.yandex.set_search_result(
        "Artist B",
        "Backward",
        track(CatalogId::Yandex, "yb", "Artist B", "Backward", None),
    );

    let coordinator = Arc::new(CycleCoordinator::new(h.engine, h.stats.clone()));
    coordinator.run_cycle().await;

    assert!(h.spotify.liked_ids().contains(&"sf".to_string()));
    assert!(h.yandex.liked_ids().contains(&"yb".to_string()));
    assert_eq!(h.stats.added_to(CatalogId::Spotify), 1);
    assert_eq!(h.stats.added_to(CatalogId::Yandex), 1);
}
