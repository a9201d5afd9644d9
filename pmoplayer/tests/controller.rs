//! State machine tests for the playback controller
//!
//! A fake metadata source serves canned search results and manifests (with
//! optional gates to hold a manifest back), and a recording output keeps
//! track of every transport call.

use async_trait::async_trait;
use pmogateway::{AudioVariant, ItemKind, QueueItem};
use pmoplayer::{
    BindingId, MediaOutput, MetadataSource, PlaybackState, PlayerError, PlayerHandle, PlayerSettings,
    PlayerStatus, SearchStatus, spawn_player,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeSource {
    results: Mutex<HashMap<String, Result<Vec<QueueItem>, String>>>,
    manifests: Mutex<HashMap<String, Vec<AudioVariant>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    manifest_requests: Mutex<Vec<String>>,
}

impl FakeSource {
    fn with_results(self, query: &str, items: Vec<QueueItem>) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(items));
        self
    }

    fn with_failing_search(self, query: &str) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), Err("upstream down".to_string()));
        self
    }

    /// Item with one playable mp4 variant
    fn with_good(self, id: &str) -> Self {
        self.manifests.lock().unwrap().insert(
            id.to_string(),
            vec![AudioVariant::new(
                "audio/mp4",
                128_000,
                format!("https://cdn/{}", id),
            )],
        );
        self
    }

    /// Item without any acceptable variant
    fn with_bad(self, id: &str) -> Self {
        self.manifests.lock().unwrap().insert(
            id.to_string(),
            vec![AudioVariant::new("audio/webm", 160_000, "https://cdn/webm")],
        );
        self
    }

    fn gate(&self, id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(id.to_string(), gate.clone());
        gate
    }

    fn manifest_requests(&self) -> Vec<String> {
        self.manifest_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataSource for FakeSource {
    async fn search(&self, query: &str) -> pmoplayer::Result<Vec<QueueItem>> {
        let result = self.results.lock().unwrap().get(query).cloned();
        match result {
            Some(Ok(items)) => Ok(items),
            Some(Err(message)) => Err(PlayerError::Status {
                status: 502,
                message,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn stream_manifest(&self, id: &str) -> pmoplayer::Result<Vec<AudioVariant>> {
        self.manifest_requests.lock().unwrap().push(id.to_string());

        let gate = self.gates.lock().unwrap().get(id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let manifest = self.manifests.lock().unwrap().get(id).cloned();
        manifest.ok_or_else(|| PlayerError::Status {
            status: 404,
            message: format!("no manifest for {}", id),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Bind(String),
    Play,
    Pause,
    Stop,
    Seek(f64),
}

#[derive(Clone, Default)]
struct RecordingOutput {
    calls: Arc<Mutex<Vec<Call>>>,
    /// Dernière liaison reçue
    binding: Arc<Mutex<BindingId>>,
    /// URL refusée par `bind`
    rejected_url: Option<String>,
}

impl RecordingOutput {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn binding(&self) -> BindingId {
        *self.binding.lock().unwrap()
    }
}

impl MediaOutput for RecordingOutput {
    fn bind(&mut self, url: &str, binding: BindingId) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Bind(url.to_string()));
        *self.binding.lock().unwrap() = binding;
        if self.rejected_url.as_deref() == Some(url) {
            anyhow::bail!("unsupported stream");
        }
        Ok(())
    }

    fn play(&mut self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Pause);
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Stop);
        Ok(())
    }

    fn seek(&mut self, position_secs: f64) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(Call::Seek(position_secs));
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn track(id: &str) -> QueueItem {
    QueueItem::playable(id, format!("Title {}", id), "Artist", "")
}

fn channel(id: &str) -> QueueItem {
    QueueItem {
        kind: ItemKind::Other,
        ..QueueItem::playable(id, id, "", "")
    }
}

fn start(source: FakeSource, settings: PlayerSettings) -> (PlayerHandle, Arc<FakeSource>, RecordingOutput) {
    start_with_output(source, settings, RecordingOutput::default())
}

fn start_with_output(
    source: FakeSource,
    settings: PlayerSettings,
    output: RecordingOutput,
) -> (PlayerHandle, Arc<FakeSource>, RecordingOutput) {
    let source = Arc::new(source);
    let player = spawn_player(source.clone(), Box::new(output.clone()), settings);
    (player, source, output)
}

async fn wait_until(player: &PlayerHandle, predicate: impl Fn(&PlaybackState) -> bool) -> PlaybackState {
    let mut rx = player.subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for player state")
        .expect("controller stopped");
    state.clone()
}

/// Search `query` and wait for the queue to be replaced
async fn load(player: &PlayerHandle, query: &str) -> PlaybackState {
    player.search(query).unwrap();
    wait_until(player, |s| {
        matches!(s.search, SearchStatus::Ready { .. } | SearchStatus::Empty)
    })
    .await
}

async fn play_index(player: &PlayerHandle, index: usize) -> PlaybackState {
    player.select_track(index).unwrap();
    wait_until(player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(index)
    })
    .await
}

/// Lets queued messages drain through the actor
async fn settle(player: &PlayerHandle) -> PlaybackState {
    tokio::time::sleep(Duration::from_millis(50)).await;
    player.state()
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_keeps_only_playable_items_in_order() {
    let source = FakeSource::default().with_results(
        "lofi",
        vec![track("a"), channel("ch"), track("b")],
    );
    let (player, _, _) = start(source, PlayerSettings::default());

    let state = load(&player, "lofi").await;

    let ids: Vec<&str> = state.queue.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(state.search, SearchStatus::Ready { count: 2 });
    assert_eq!(state.status, PlayerStatus::Idle);
}

#[tokio::test]
async fn test_blank_search_is_a_noop() {
    let (player, _, _) = start(FakeSource::default(), PlayerSettings::default());
    player.search("   ").unwrap();

    let state = settle(&player).await;
    assert_eq!(state.search, SearchStatus::Idle);
}

#[tokio::test]
async fn test_search_without_playable_items_is_empty() {
    let source = FakeSource::default().with_results("nothing", vec![channel("ch")]);
    let (player, _, _) = start(source, PlayerSettings::default());

    let state = load(&player, "nothing").await;
    assert_eq!(state.search, SearchStatus::Empty);
    assert!(state.queue.is_empty());
}

#[tokio::test]
async fn test_failed_search_keeps_queue_and_playback() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_failing_search("jazz")
        .with_good("a");
    let (player, _, _) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    player.search("jazz").unwrap();
    let state = wait_until(&player, |s| matches!(s.search, SearchStatus::Failed { .. })).await;

    assert_eq!(state.queue.len(), 2);
    assert_eq!(state.status, PlayerStatus::Playing);
    assert_eq!(state.current_index, Some(0));
}

#[tokio::test]
async fn test_new_search_while_playing_keeps_bound_track() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_results("jazz", vec![track("x"), track("y"), track("z")])
        .with_good("a")
        .with_good("x");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    player.search("jazz").unwrap();
    let state = wait_until(&player, |s| s.queue.len() == 3).await;
    assert_eq!(state.status, PlayerStatus::Playing);
    assert_eq!(state.current_index, None);
    assert_eq!(state.now_playing.as_ref().map(|i| i.id.as_str()), Some("a"));
    assert!(!output.calls().contains(&Call::Stop));

    // next part de l'index 0 de la nouvelle file
    player.next().unwrap();
    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(0)
    })
    .await;
    assert_eq!(state.now_playing.unwrap().id, "x");
}

#[tokio::test]
async fn test_search_supersedes_in_flight_resolution() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_results("jazz", vec![track("x")])
        .with_good("a");
    let gate = source.gate("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    player.select_track(0).unwrap();
    wait_until(&player, |s| s.status == PlayerStatus::Resolving).await;

    player.search("jazz").unwrap();
    let state = wait_until(&player, |s| {
        s.queue.iter().any(|i| i.id == "x")
    })
    .await;
    assert_eq!(state.status, PlayerStatus::Idle);
    assert_eq!(state.current_index, None);

    // La résolution obsolète arrive après coup et doit être ignorée
    gate.notify_one();
    let state = settle(&player).await;
    assert_eq!(state.status, PlayerStatus::Idle);
    assert!(output.calls().is_empty());
}

// ============================================================================
// Selection and resolution
// ============================================================================

#[tokio::test]
async fn test_select_track_binds_and_plays() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    let state = play_index(&player, 1).await;

    assert_eq!(state.now_playing.unwrap().id, "b");
    assert_eq!(state.current_time_secs, 0.0);
    assert_eq!(
        output.calls(),
        vec![Call::Bind("https://cdn/b".into()), Call::Play]
    );

    // Changer de piste libère d'abord la sortie
    play_index(&player, 0).await;
    assert_eq!(
        output.calls(),
        vec![
            Call::Bind("https://cdn/b".into()),
            Call::Play,
            Call::Stop,
            Call::Bind("https://cdn/a".into()),
            Call::Play,
        ]
    );
}

#[tokio::test]
async fn test_out_of_range_selection_leaves_output_untouched() {
    let source = FakeSource::default().with_results("lofi", vec![track("a")]);
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    player.select_track(5).unwrap();

    let state = settle(&player).await;
    assert_eq!(state.status, PlayerStatus::Idle);
    assert_eq!(state.current_index, None);
    assert!(output.calls().is_empty());
}

#[tokio::test]
async fn test_out_of_range_selection_releases_binding() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;
    player.next().unwrap();

    let state = wait_until(&player, |s| s.status == PlayerStatus::Idle).await;
    assert_eq!(state.current_index, None);
    assert_eq!(state.now_playing, None);
    assert_eq!(output.calls().last(), Some(&Call::Stop));
}

#[tokio::test]
async fn test_failures_skip_forward() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b"), track("c"), track("d")])
        .with_bad("a")
        .with_bad("b")
        .with_good("c")
        .with_good("d");
    let (player, source, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    player.select_track(0).unwrap();

    let state = wait_until(&player, |s| s.status == PlayerStatus::Playing).await;
    assert_eq!(state.current_index, Some(2));
    assert_eq!(source.manifest_requests(), vec!["a", "b", "c"]);
    assert_eq!(
        output.calls(),
        vec![Call::Bind("https://cdn/c".into()), Call::Play]
    );
}

#[tokio::test]
async fn test_failures_past_the_end_settle_idle() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b"), track("c")])
        .with_good("a")
        .with_bad("b");
    // "c" n'a pas de manifeste du tout
    let (player, source, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    player.select_track(1).unwrap();

    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Idle && source.manifest_requests().len() == 2
    })
    .await;
    assert_eq!(state.current_index, None);
    assert!(output.calls().is_empty());
}

#[tokio::test]
async fn test_max_consecutive_skips_bounds_the_chain() {
    let ids = ["a", "b", "c", "d", "e"];
    let mut source = FakeSource::default()
        .with_results("lofi", ids.iter().map(|id| track(id)).collect());
    for id in ids {
        source = source.with_bad(id);
    }
    let settings = PlayerSettings {
        max_consecutive_skips: 2,
        ..PlayerSettings::default()
    };
    let (player, source, _) = start(source, settings);

    load(&player, "lofi").await;
    player.select_track(0).unwrap();

    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Idle && !source.manifest_requests().is_empty()
    })
    .await;
    assert_eq!(state.current_index, None);

    // Deux sauts autorisés : a -> b -> c, puis abandon
    let state = settle(&player).await;
    assert_eq!(state.status, PlayerStatus::Idle);
    assert_eq!(source.manifest_requests(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_success_resets_the_skip_chain() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b"), track("c"), track("d")])
        .with_bad("a")
        .with_good("b")
        .with_bad("c")
        .with_good("d");
    let settings = PlayerSettings {
        max_consecutive_skips: 1,
        ..PlayerSettings::default()
    };
    let (player, _, output) = start(source, settings);

    load(&player, "lofi").await;
    player.select_track(0).unwrap();
    wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(1)
    })
    .await;

    player.media_ended(output.binding()).unwrap();
    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(3)
    })
    .await;
    assert_eq!(state.now_playing.unwrap().id, "d");
}

#[tokio::test]
async fn test_rejected_bind_skips_forward() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let output = RecordingOutput {
        rejected_url: Some("https://cdn/a".to_string()),
        ..RecordingOutput::default()
    };
    let (player, _, output) = start_with_output(source, PlayerSettings::default(), output);

    load(&player, "lofi").await;
    player.select_track(0).unwrap();

    let state = wait_until(&player, |s| s.status == PlayerStatus::Playing).await;
    assert_eq!(state.current_index, Some(1));
    assert_eq!(
        output.calls(),
        vec![
            Call::Bind("https://cdn/a".into()),
            Call::Bind("https://cdn/b".into()),
            Call::Play,
        ]
    );
}

#[tokio::test]
async fn test_stale_resolution_is_discarded() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let gate = source.gate("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    player.select_track(0).unwrap();
    wait_until(&player, |s| s.status == PlayerStatus::Resolving).await;

    play_index(&player, 1).await;
    gate.notify_one();

    let state = settle(&player).await;
    assert_eq!(state.current_index, Some(1));
    assert_eq!(state.now_playing.unwrap().id, "b");
    assert_eq!(
        output.calls(),
        vec![Call::Bind("https://cdn/b".into()), Call::Play]
    );
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_toggle_play_pause() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    // Sans piste, rien ne se passe
    player.toggle_play_pause().unwrap();
    assert_eq!(settle(&player).await.status, PlayerStatus::Idle);

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    player.toggle_play_pause().unwrap();
    wait_until(&player, |s| s.status == PlayerStatus::Paused).await;
    player.toggle_play_pause().unwrap();
    wait_until(&player, |s| s.status == PlayerStatus::Playing).await;

    assert_eq!(
        output.calls(),
        vec![
            Call::Bind("https://cdn/a".into()),
            Call::Play,
            Call::Pause,
            Call::Play,
        ]
    );
}

#[tokio::test]
async fn test_next_and_previous() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let (player, _, _) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;

    // previous sans index : no-op
    player.previous().unwrap();
    assert_eq!(settle(&player).await.status, PlayerStatus::Idle);

    // next sans index : première piste
    player.next().unwrap();
    wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(0)
    })
    .await;

    player.next().unwrap();
    wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(1)
    })
    .await;

    player.previous().unwrap();
    wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(0)
    })
    .await;

    player.previous().unwrap();
    let state = wait_until(&player, |s| s.status == PlayerStatus::Idle).await;
    assert_eq!(state.current_index, None);
}

#[tokio::test]
async fn test_previous_releases_track_of_replaced_queue() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_results("jazz", vec![track("x")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;
    player.search("jazz").unwrap();
    wait_until(&player, |s| s.queue.iter().any(|i| i.id == "x")).await;

    player.previous().unwrap();
    let state = wait_until(&player, |s| s.status == PlayerStatus::Idle).await;
    assert_eq!(state.current_index, None);
    assert_eq!(state.now_playing, None);
    assert_eq!(output.calls().last(), Some(&Call::Stop));

    // La file de remplacement reste intacte
    assert_eq!(state.queue.len(), 1);
}

#[tokio::test]
async fn test_media_ended_advances() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    player.media_ended(output.binding()).unwrap();
    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(1)
    })
    .await;
    assert_eq!(state.now_playing.unwrap().id, "b");
}

#[tokio::test]
async fn test_media_ended_ignored_when_paused() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;
    player.toggle_play_pause().unwrap();
    player.media_ended(output.binding()).unwrap();

    let state = settle(&player).await;
    assert_eq!(state.status, PlayerStatus::Paused);
    assert_eq!(state.current_index, Some(0));
}

#[tokio::test]
async fn test_events_of_released_binding_are_ignored() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b"), track("c")])
        .with_good("a")
        .with_good("c");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;
    let released = output.binding();

    play_index(&player, 2).await;
    assert_ne!(output.binding(), released);
    let calls = output.calls().len();

    // Fin de "a" signalée en retard par la sortie
    player.time_update(released, 170.0, 180.0).unwrap();
    player.media_ended(released).unwrap();
    player.media_error(released, "decoder gone").unwrap();

    let state = settle(&player).await;
    assert_eq!(state.status, PlayerStatus::Playing);
    assert_eq!(state.current_index, Some(2));
    assert_eq!(state.now_playing.unwrap().id, "c");
    assert_eq!(state.current_time_secs, 0.0);
    assert_eq!(state.duration_secs, 0.0);
    assert_eq!(output.calls().len(), calls);

    player.time_update(output.binding(), 5.0, 60.0).unwrap();
    let state = wait_until(&player, |s| s.current_time_secs == 5.0).await;
    assert_eq!(state.duration_secs, 60.0);
}

#[tokio::test]
async fn test_media_error_skips_forward() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a"), track("b")])
        .with_good("a")
        .with_good("b");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    player.media_error(output.binding(), "403 from CDN").unwrap();
    let state = wait_until(&player, |s| {
        s.status == PlayerStatus::Playing && s.current_index == Some(1)
    })
    .await;
    assert_eq!(state.now_playing.unwrap().id, "b");
    assert_eq!(
        output.calls(),
        vec![
            Call::Bind("https://cdn/a".into()),
            Call::Play,
            Call::Stop,
            Call::Bind("https://cdn/b".into()),
            Call::Play,
        ]
    );

    // Erreur sur la dernière piste : fin de file
    player.media_error(output.binding(), "decode error").unwrap();
    let state = wait_until(&player, |s| s.status == PlayerStatus::Idle).await;
    assert_eq!(state.current_index, None);
    assert_eq!(output.calls().last(), Some(&Call::Stop));
}

#[tokio::test]
async fn test_seek_uses_percentage_of_duration() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;

    // Durée inconnue : ignoré
    player.seek(50.0).unwrap();
    assert_eq!(settle(&player).await.current_time_secs, 0.0);

    player.time_update(output.binding(), 10.0, 200.0).unwrap();
    player.seek(50.0).unwrap();
    let state = wait_until(&player, |s| s.current_time_secs == 100.0).await;
    assert_eq!(state.progress_percent(), 50.0);
    assert_eq!(state.time_display(), "1:40 / 3:20");

    player.seek(150.0).unwrap();
    wait_until(&player, |s| s.current_time_secs == 200.0).await;

    assert_eq!(
        output.calls()[2..].to_vec(),
        vec![Call::Seek(100.0), Call::Seek(200.0)]
    );
}

#[tokio::test]
async fn test_time_update_ignored_when_idle() {
    let (player, _, _) = start(FakeSource::default(), PlayerSettings::default());
    player.time_update(1, 30.0, 120.0).unwrap();

    let state = settle(&player).await;
    assert_eq!(state.current_time_secs, 0.0);
    assert_eq!(state.duration_secs, 0.0);
}

#[tokio::test]
async fn test_shutdown_releases_output() {
    let source = FakeSource::default()
        .with_results("lofi", vec![track("a")])
        .with_good("a");
    let (player, _, output) = start(source, PlayerSettings::default());

    load(&player, "lofi").await;
    play_index(&player, 0).await;
    player.shutdown().unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(output.calls().last(), Some(&Call::Stop));
    assert!(matches!(player.next(), Err(PlayerError::ControllerStopped)));
}
