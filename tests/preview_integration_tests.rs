//! Preview integration tests
//! Drive a full preview (session actor, recompile coordinator, bridge) through
//! its public API and observe what reaches the display surface.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{sleep, timeout};
use utsushi::bridge::{ChannelSurface, OutboundMessage};
use utsushi::compiler::{Compiler, MemoryIncludeResolver, ScriptCompiler};
use utsushi::error::{PreviewError, ProtocolError, SessionError};
use utsushi::runtime::RuntimeAdapter;
use utsushi::{Action, CompileErrors, ErrorKind, Preview, State};

const SOURCE_A: &str = r#"
intro
[BRANCH choice="go left" label=left choice="go right" label=right]

[LABEL name=left]
left-branch-text
[BRANCH choice=flee label=flee choice="open door" label=door]

[LABEL name=door]
open-door-text
[JUMP label=end]

[LABEL name=flee]
flee-text
[JUMP label=end]

[LABEL name=right]
right-branch-text

[LABEL name=end]
"#;

const SOURCE_A_NO_DOOR: &str = r#"
intro
[BRANCH choice="go left" label=left choice="go right" label=right]

[LABEL name=left]
left-branch-text
[BRANCH choice=flee label=flee]

[LABEL name=flee]
flee-text
[JUMP label=end]

[LABEL name=right]
right-branch-text

[LABEL name=end]
"#;

const QUIET: Duration = Duration::from_millis(100);

type Updates = mpsc::UnboundedReceiver<OutboundMessage>;

/// Compiler whose compiles can be held open by locking `hold`
struct HeldCompiler {
    inner: ScriptCompiler,
    hold: Mutex<()>,
    started: mpsc::UnboundedSender<()>,
}

#[async_trait]
impl Compiler for HeldCompiler {
    async fn compile(&self, source: &str) -> Result<Box<dyn RuntimeAdapter>, CompileErrors> {
        let _ = self.started.send(());
        let _held = self.hold.lock().await;
        self.inner.compile(source).await
    }
}

fn script_compiler() -> ScriptCompiler {
    ScriptCompiler::new(Arc::new(MemoryIncludeResolver::new()))
}

fn preview() -> (Arc<Preview>, Updates) {
    let (surface, updates) = ChannelSurface::new();
    let preview = Preview::spawn(Arc::new(script_compiler()), Arc::new(surface), true);
    (Arc::new(preview), updates)
}

async fn next_message(updates: &mut Updates) -> OutboundMessage {
    timeout(Duration::from_secs(2), updates.recv())
        .await
        .expect("Timed out waiting for the display surface")
        .expect("Surface channel closed")
}

async fn next_state(updates: &mut Updates) -> State {
    loop {
        if let OutboundMessage::UpdateState { state } = next_message(updates).await {
            return state;
        }
    }
}

async fn assert_quiet(updates: &mut Updates) {
    sleep(QUIET).await;
    assert!(updates.try_recv().is_err(), "Unexpected message on the surface");
}

async fn started(source: &str) -> (Arc<Preview>, Updates) {
    let (preview, mut updates) = preview();
    preview.initialize_story(source);
    preview.handle_message(r#"{"type":"ready"}"#).await.unwrap();
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro"]);
    (preview, updates)
}

async fn choose(preview: &Preview, index: usize) {
    preview
        .dispatch(Action::SelectChoice { index })
        .await
        .unwrap();
}

#[tokio::test]
async fn start_waits_for_ready_and_repeated_ready_is_ignored() {
    let (preview, mut updates) = preview();

    preview.initialize_story(SOURCE_A);
    assert_quiet(&mut updates).await;
    assert!(!preview.is_ready());

    preview.handle_message(r#"{"type":"ready"}"#).await.unwrap();
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro"]);

    preview.handle_message(r#"{"type":"ready"}"#).await.unwrap();
    assert_quiet(&mut updates).await;

    choose(&preview, 0).await;
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
}

#[tokio::test]
async fn actions_sent_before_ready_run_after_start() {
    let (preview, mut updates) = preview();
    preview.initialize_story(SOURCE_A);
    // Let the coordinator pick up the source and hold the session
    sleep(QUIET).await;

    let pending = tokio::spawn({
        let preview = Arc::clone(&preview);
        async move { preview.dispatch(Action::SelectChoice { index: 0 }).await }
    });
    sleep(QUIET).await;
    assert!(!pending.is_finished());

    assert!(preview.ready());
    pending.await.unwrap().unwrap();

    let first = next_state(&mut updates).await;
    let second = next_state(&mut updates).await;
    assert_eq!(first.transcript_text(), vec!["intro"]);
    assert_eq!(second.transcript_text(), vec!["intro", "left-branch-text"]);
}

#[tokio::test]
async fn recompile_replays_up_to_the_divergence() {
    let (preview, mut updates) = started(SOURCE_A).await;
    choose(&preview, 0).await;
    choose(&preview, 1).await;
    next_state(&mut updates).await;
    let state = next_state(&mut updates).await;
    assert_eq!(
        state.transcript_text(),
        vec!["intro", "left-branch-text", "open-door-text"]
    );

    preview.on_source_changed(SOURCE_A_NO_DOOR);

    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
    assert_eq!(state.choice_texts(), vec!["flee"]);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].kind, ErrorKind::InvalidChoice);
}

#[tokio::test]
async fn failed_compile_keeps_the_story_and_records_errors() {
    let (preview, mut updates) = started(SOURCE_A).await;

    preview.on_source_changed("intro\n[BOGUS]\n[JUMP]\n");

    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro"]);
    assert_eq!(state.choice_texts(), vec!["go left", "go right"]);
    assert_eq!(state.errors.len(), 2);
    assert!(state.errors.iter().all(|e| e.kind == ErrorKind::Compile));
    assert_eq!(state.errors[0].line, Some(2));

    // The story still answers choices
    choose(&preview, 1).await;
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "right-branch-text"]);
}

#[tokio::test]
async fn fixing_a_script_clears_its_compile_errors() {
    let (preview, mut updates) = started(SOURCE_A).await;
    choose(&preview, 0).await;
    next_state(&mut updates).await;

    preview.on_source_changed("intro\n[BOGUS]\n");
    let state = next_state(&mut updates).await;
    assert_eq!(state.errors.len(), 1);

    preview.on_source_changed(SOURCE_A);

    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn broken_new_story_then_fixed_starts_with_a_fresh_log() {
    let (preview, mut updates) = started(SOURCE_A).await;
    choose(&preview, 0).await;
    next_state(&mut updates).await;

    preview.initialize_story("[NOPE]");
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
    assert_eq!(state.errors[0].kind, ErrorKind::Compile);

    preview.on_source_changed(
        "harbor-intro\n[BRANCH choice=sail label=sea choice=stay label=sea]\n[LABEL name=sea]\nsea-text\n",
    );

    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["harbor-intro"]);
    assert_eq!(state.choice_texts(), vec!["sail", "stay"]);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn unchanged_source_is_not_recompiled() {
    let (preview, mut updates) = started(SOURCE_A).await;

    preview.on_source_changed(SOURCE_A);

    assert_quiet(&mut updates).await;
}

#[tokio::test]
async fn dispatches_during_a_recompile_wait_for_it() {
    let (started_tx, mut started_rx) = mpsc::unbounded_channel();
    let compiler = Arc::new(HeldCompiler {
        inner: script_compiler(),
        hold: Mutex::new(()),
        started: started_tx,
    });
    let (surface, mut updates) = ChannelSurface::new();
    let preview = Arc::new(Preview::spawn(
        Arc::clone(&compiler) as Arc<dyn Compiler>,
        Arc::new(surface),
        true,
    ));
    preview.initialize_story(SOURCE_A);
    preview.ready();
    next_state(&mut updates).await;
    started_rx.recv().await.unwrap();

    let held = compiler.hold.lock().await;
    let edited = SOURCE_A.replace("intro", "a new intro");
    preview.on_source_changed(edited);
    timeout(Duration::from_secs(2), started_rx.recv())
        .await
        .unwrap()
        .unwrap();

    let pending = tokio::spawn({
        let preview = Arc::clone(&preview);
        async move { preview.dispatch(Action::SelectChoice { index: 0 }).await }
    });
    assert_quiet(&mut updates).await;
    assert!(!pending.is_finished());

    drop(held);
    pending.await.unwrap().unwrap();

    // Replay against the new story first, then the queued choice
    let replayed = next_state(&mut updates).await;
    assert_eq!(replayed.transcript_text(), vec!["a new intro"]);
    let chosen = next_state(&mut updates).await;
    assert_eq!(
        chosen.transcript_text(),
        vec!["a new intro", "left-branch-text"]
    );
}

#[tokio::test]
async fn live_update_off_holds_the_latest_source() {
    let (preview, mut updates) = started(SOURCE_A).await;
    preview
        .dispatch(Action::ToggleLiveUpdate { enabled: false })
        .await
        .unwrap();
    assert!(!next_state(&mut updates).await.live_update);

    preview.on_source_changed(SOURCE_A.replace("intro", "first edit"));
    preview.on_source_changed(SOURCE_A.replace("intro", "second edit"));
    assert_quiet(&mut updates).await;

    preview
        .dispatch(Action::ToggleLiveUpdate { enabled: true })
        .await
        .unwrap();
    let toggled = next_state(&mut updates).await;
    assert!(toggled.live_update);
    assert_eq!(toggled.transcript_text(), vec!["intro"]);

    let recompiled = next_state(&mut updates).await;
    assert_eq!(recompiled.transcript_text(), vec!["second edit"]);
    assert!(recompiled.live_update);
}

#[tokio::test]
async fn unknown_actions_are_recorded_not_fatal() {
    let (preview, mut updates) = started(SOURCE_A).await;

    preview
        .handle_message(r#"{"type":"action","action":{"kind":"teleport","to":"end"}}"#)
        .await
        .unwrap();

    let state = next_state(&mut updates).await;
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].kind, ErrorKind::UnknownAction);
    assert!(state.errors[0].message.contains("teleport"));

    let result = preview.handle_message("{not json").await;
    assert!(matches!(
        result,
        Err(PreviewError::Protocol(ProtocolError::Malformed(_)))
    ));

    preview
        .handle_message(r#"{"type":"action","action":{"kind":"selectChoice","index":0}}"#)
        .await
        .unwrap();
    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
}

#[tokio::test]
async fn jump_requests_are_answered_on_the_surface() {
    let (preview, mut updates) = preview();
    preview.initialize_story(SOURCE_A);

    preview
        .handle_message(r#"{"type":"jumpTo","target":{"text":"open-door-text"}}"#)
        .await
        .unwrap();
    match next_message(&mut updates).await {
        OutboundMessage::RevealPosition { position } => {
            assert_eq!(position.line, 10);
            assert_eq!(position.column, 1);
        }
        other => panic!("Expected revealPosition, got {:?}", other),
    }

    preview
        .handle_message(r#"{"type":"jumpTo","target":{"line":500}}"#)
        .await
        .unwrap();
    assert!(matches!(
        next_message(&mut updates).await,
        OutboundMessage::NavigationFailed { .. }
    ));
}

#[tokio::test]
async fn initialize_story_again_starts_over() {
    let (preview, mut updates) = started(SOURCE_A).await;
    choose(&preview, 0).await;
    next_state(&mut updates).await;

    preview.initialize_story(SOURCE_A);

    let state = next_state(&mut updates).await;
    assert_eq!(state.transcript_text(), vec!["intro"]);
    assert_eq!(state.choice_texts(), vec!["go left", "go right"]);
}

#[tokio::test]
async fn dispose_turns_everything_into_no_ops() {
    let (preview, mut updates) = started(SOURCE_A).await;

    preview.dispose().await;

    choose(&preview, 0).await;
    preview.on_source_changed(SOURCE_A_NO_DOOR);
    assert!(preview.state().await.is_none());
    assert_quiet(&mut updates).await;
}

#[tokio::test]
async fn runtime_failure_disposes_the_session() {
    let looping = "start\n[BRANCH choice=loop label=top]\n[LABEL name=top]\n[JUMP label=top]\n";
    let (preview, mut updates) = preview();
    preview.initialize_story(looping);
    preview.ready();
    next_state(&mut updates).await;

    let result = preview.dispatch(Action::SelectChoice { index: 0 }).await;

    assert!(matches!(
        result,
        Err(PreviewError::Session(SessionError::Runtime(_)))
    ));
    assert!(preview.state().await.is_none());
}
