//! Replay scenario tests
//! Compile scripts from disk, play them through a session and recompile
//! edited versions against the same action log.

use std::path::Path;
use std::sync::Arc;
use utsushi::compiler::{Compiler, FileIncludeResolver, ScriptCompiler};
use utsushi::runtime::RuntimeAdapter;
use utsushi::{Action, ErrorKind, Session};

const MAIN: &str = r#"
[PLAY_BGM name=morning]
intro
[BRANCH choice="go left" label=left choice="go right" label=right]

[LABEL name=left]
[INCLUDE name=left_path]

[LABEL name=right]
right-branch-text

[LABEL name=end]
"#;

const LEFT_PATH: &str = r#"
left-branch-text
[BRANCH choice=flee label=flee choice="open door" label=door]

[LABEL name=door]
[SAY speaker=Door]
open-door-text
[CALL name=door_opened arg=north]
[JUMP label=end]

[LABEL name=flee]
flee-text
[JUMP label=end]
"#;

const LEFT_PATH_NO_DOOR: &str = r#"
left-branch-text
[BRANCH choice=flee label=flee]

[LABEL name=flee]
flee-text
[JUMP label=end]
"#;

async fn compile(root: &Path, source: &str) -> Box<dyn RuntimeAdapter> {
    let compiler = ScriptCompiler::new(Arc::new(FileIncludeResolver::new(root)));
    compiler.compile(source).await.expect("script should compile")
}

#[tokio::test]
async fn scenario_replays_then_diverges_when_a_choice_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("left_path.md"), LEFT_PATH).unwrap();

    let mut session = Session::new(true);
    session.begin(compile(dir.path(), MAIN).await).unwrap();
    session
        .dispatch(Action::SelectChoice { index: 0 })
        .unwrap();
    session
        .dispatch(Action::SelectChoice { index: 1 })
        .unwrap();

    assert_eq!(
        session.log().as_slice(),
        &[
            Action::Start,
            Action::SelectChoice { index: 0 },
            Action::SelectChoice { index: 1 },
        ]
    );
    let state = session.state();
    assert_eq!(
        state.transcript_text(),
        vec!["intro", "left-branch-text", "open-door-text"]
    );
    assert_eq!(state.events.len(), 1);
    assert_eq!(state.events[0].name, "door_opened");
    assert!(state.at_end);

    std::fs::write(dir.path().join("left_path.md"), LEFT_PATH_NO_DOOR).unwrap();
    session.replace(compile(dir.path(), MAIN).await).unwrap();

    let state = session.state();
    assert_eq!(state.transcript_text(), vec!["intro", "left-branch-text"]);
    assert_eq!(state.choice_texts(), vec!["flee"]);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].kind, ErrorKind::InvalidChoice);
    assert!(state.events.is_empty());
}

#[tokio::test]
async fn tags_are_replayed_with_the_text() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("left_path.md"), LEFT_PATH).unwrap();

    let mut session = Session::new(true);
    session.begin(compile(dir.path(), MAIN).await).unwrap();
    let before = session.state().transcript.clone();

    let edited = MAIN.replace("[PLAY_BGM name=morning]", "[PLAY_BGM name=evening]");
    session.replace(compile(dir.path(), &edited).await).unwrap();

    assert_eq!(before.len(), 2);
    assert_ne!(session.state().transcript[0], before[0]);
    assert_eq!(session.state().transcript[1], before[1]);
}

#[tokio::test]
async fn missing_include_fails_the_whole_compile() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = ScriptCompiler::new(Arc::new(FileIncludeResolver::new(dir.path())));

    let errors = match compiler.compile(MAIN).await {
        Ok(_) => panic!("compile should fail without left_path.md"),
        Err(errors) => errors,
    };

    let infos = errors.to_error_infos();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].kind, ErrorKind::IncludeLoad);
    assert!(infos[0].message.contains("left_path"));
}

#[tokio::test]
async fn rewind_matches_a_session_that_never_took_the_choice() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("left_path.md"), LEFT_PATH).unwrap();

    let mut session = Session::new(true);
    session.begin(compile(dir.path(), MAIN).await).unwrap();
    session
        .dispatch(Action::SelectChoice { index: 0 })
        .unwrap();
    session
        .dispatch(Action::SelectChoice { index: 0 })
        .unwrap();
    assert!(session.rewind().unwrap());

    let mut reference = Session::new(true);
    reference.begin(compile(dir.path(), MAIN).await).unwrap();
    reference
        .dispatch(Action::SelectChoice { index: 0 })
        .unwrap();

    assert_eq!(session.log(), reference.log());
    assert_eq!(session.state(), reference.state());
}
