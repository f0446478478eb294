use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use pylings::config::{
    CONFIG_FILE_NAME, ConfigFile, RawConfigFile, find_config, load_and_validate,
};
use pylings::errors::PylingsError;
use pylings::fs::RealFileSystem;
use pylings::workspace::{
    HintStore, SelectionStore, SolutionStore, TomlHintStore, TomlSelectionStore, Workspace,
};
use pylings_test_utils::builders::WorkspaceBuilder;

#[test]
fn empty_config_uses_defaults() {
    let cfg: RawConfigFile = toml::from_str("").unwrap();
    let cfg = ConfigFile::try_from(cfg).unwrap();

    assert_eq!(cfg.runner.interpreter, "python");
    assert_eq!(cfg.timeout(), Duration::from_secs(10));
    assert_eq!(cfg.debounce(), Duration::from_millis(300));
    assert_eq!(cfg.paths.pattern, "**/*.py");
    assert!(cfg.max_workers() >= 1);
    assert!(!cfg.workspace.firsttime);
}

#[test]
fn invalid_values_are_rejected() {
    for toml_src in [
        "[runner]\ntimeout_secs = 0\n",
        "[runner]\ninterpreter = \"  \"\n",
        "[watch]\ndebounce_ms = 0\n",
        "[paths]\npattern = \"\"\n",
        "[paths]\npattern = \"[unclosed\"\n",
    ] {
        let raw: RawConfigFile = toml::from_str(toml_src).unwrap();
        assert!(
            ConfigFile::try_from(raw).is_err(),
            "expected {toml_src:?} to be rejected"
        );
    }
}

#[test]
fn config_is_found_from_a_subdirectory() {
    let ws = WorkspaceBuilder::new().exercise("00_intro/a.sh", "echo\n").build();
    let nested = ws.exercises_dir().join("00_intro");

    let found = find_config(&nested).unwrap();
    assert_eq!(found, ws.root().join(CONFIG_FILE_NAME));

    let workspace = Workspace::locate(None, &nested).unwrap();
    assert_eq!(workspace.root, ws.root());
    assert_eq!(workspace.exercises_dir(), ws.exercises_dir());
    assert_eq!(workspace.config.runner.interpreter, "sh");
}

#[test]
fn missing_config_is_a_config_error() {
    let dir = tempdir().unwrap();
    match find_config(dir.path()) {
        Err(PylingsError::ConfigError(msg)) => assert!(msg.contains(CONFIG_FILE_NAME)),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn hints_are_keyed_by_exercise_stem() {
    let hints = TomlHintStore::from_toml_str(
        r#"
[exercise_1]
name = "intro1"
hint = "Remove the FIXME."

[exercise_2]
name = "variables1"
hint = "Assign before use."

[unrelated]
key = "ignored"
"#,
    )
    .unwrap();

    assert_eq!(hints.len(), 2);
    assert_eq!(hints.hint_for("intro1").as_deref(), Some("Remove the FIXME."));
    assert_eq!(hints.hint_for("nope"), None);
}

#[test]
fn missing_hints_file_is_empty() {
    let dir = tempdir().unwrap();
    let hints = TomlHintStore::load(&dir.path().join("hints.toml")).unwrap();
    assert!(hints.is_empty());
}

#[test]
fn selection_round_trips_and_keeps_other_keys() {
    let ws = WorkspaceBuilder::new()
        .first_time()
        .exercise("00_intro/a.sh", "echo\n")
        .build();
    let store = TomlSelectionStore::new(ws.config_path());

    assert_eq!(store.load().unwrap(), None);
    store.save("00_intro/a.sh").unwrap();
    assert_eq!(store.load().unwrap().as_deref(), Some("00_intro/a.sh"));

    assert!(store.take_first_time().unwrap());
    assert!(!store.take_first_time().unwrap());

    let cfg = load_and_validate(ws.config_path()).unwrap();
    assert_eq!(cfg.runner.interpreter, "sh");
    assert_eq!(cfg.paths.pattern, "**/*.sh");
    assert_eq!(
        cfg.workspace.current_exercise.as_deref(),
        Some("00_intro/a.sh")
    );
}

#[test]
fn solutions_mirror_the_exercise_layout() {
    let ws = WorkspaceBuilder::new()
        .exercise("00_intro/a.sh", "exit 1\n")
        .exercise("00_intro/b.sh", "exit 1\n")
        .solution("00_intro/a.sh", "echo solved\n")
        .build();
    let workspace = Workspace::open(ws.config_path()).unwrap();
    let store = SolutionStore::new(
        workspace.exercises_dir(),
        workspace.solutions_dir(),
        Arc::new(RealFileSystem),
    );

    let found = store.solution_for(&ws.exercise_path("00_intro/a.sh")).unwrap();
    assert_eq!(fs::read_to_string(found).unwrap(), "echo solved\n");
    assert!(store.solution_for(&ws.exercise_path("00_intro/b.sh")).is_none());
}
