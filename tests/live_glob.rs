// tests/live_glob.rs

mod common;
use crate::common::{EventScript, RecordingSubscriber, empty, init_tracing, native, set};

use liveglob::{Delimiter, GlobEventKind, LiveGlobError, ViewOptions};

#[test]
fn scenario_from_quiet_baseline() {
    init_tracing();
    let script = EventScript::new();
    let factory = script.factory();
    script.file("a.txt").file("b.txt").ready();

    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    assert_eq!(view.files(), set(&["a.txt", "b.txt"]));
    assert_eq!(view.added_files(), empty());

    script.file("c.txt");
    assert_eq!(view.files(), set(&["a.txt", "b.txt", "c.txt"]));
    assert_eq!(view.added_files(), set(&["c.txt"]));

    view.clean();
    assert_eq!(view.added_files(), empty());
    assert_eq!(view.files(), set(&["a.txt", "b.txt", "c.txt"]));
}

#[test]
fn dirty_initial_state_is_reported_as_added() {
    let script = EventScript::new();
    let factory = script.factory();
    script.dir("docs").file("a.txt").file("docs/readme.md").ready();

    let options = ViewOptions {
        initial_state_considered_dirty: true,
        ..ViewOptions::default()
    };
    let view = factory.create(["*.txt", "docs"], options).unwrap();

    assert_eq!(view.added_files(), set(&["a.txt"]));
    assert_eq!(view.added_directories(), set(&["docs"]));
    assert_eq!(view.directories(), set(&["docs"]));
}

#[test]
fn single_star_does_not_cross_directories() {
    let script = EventScript::new();
    let factory = script.factory();
    let shallow = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let deep = factory.create(["**/*.txt"], ViewOptions::default()).unwrap();

    script.dir("sub").file("top.txt").file("sub/nested.txt");

    assert_eq!(shallow.files(), set(&["top.txt"]));
    assert_eq!(deep.files(), set(&["top.txt", "sub/nested.txt"]));
    assert!(shallow.directories().is_empty());
}

#[test]
fn views_with_disjoint_patterns_are_independent() {
    let script = EventScript::new();
    let factory = script.factory();
    let text = factory.create(["**/*.txt"], ViewOptions::default()).unwrap();
    let rust = factory.create(["**/*.rs"], ViewOptions::default()).unwrap();

    script
        .dir("src")
        .file("notes.txt")
        .file("src/lib.rs")
        .file("src/main.rs")
        .remove_file("notes.txt")
        .file("todo.txt");

    assert_eq!(text.files(), set(&["todo.txt"]));
    assert_eq!(rust.files(), set(&["src/lib.rs", "src/main.rs"]));
    assert!(text.files().is_disjoint(&rust.files()));

    assert_eq!(text.added_files(), set(&["todo.txt"]));
    assert_eq!(rust.added_files(), set(&["src/lib.rs", "src/main.rs"]));
    assert!(rust.removed_files().is_empty());
    assert!(rust.changed_files().is_empty());
}

#[test]
fn negated_patterns_exclude_matches() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory
        .create(["**/*.rs", "!target/**"], ViewOptions::default())
        .unwrap();

    script
        .dir("target")
        .file("src/lib.rs")
        .file("target/build.rs");

    assert_eq!(view.files(), set(&["src/lib.rs"]));
    assert!(view.directories().is_empty());
}

#[test]
fn negation_only_and_empty_pattern_lists_are_rejected() {
    let factory = EventScript::new().factory();

    let err = factory
        .create(["!target/**"], ViewOptions::default())
        .unwrap_err();
    assert!(matches!(err, LiveGlobError::EmptyPatterns));

    let err = factory
        .create(Vec::<String>::new(), ViewOptions::default())
        .unwrap_err();
    assert!(matches!(err, LiveGlobError::EmptyPatterns));

    let err = factory.create(["src/[a"], ViewOptions::default()).unwrap_err();
    assert!(matches!(err, LiveGlobError::InvalidPattern { .. }));
    assert!(!factory.is_closed());
}

#[test]
fn subscribers_receive_granular_events() {
    let script = EventScript::new();
    let factory = script.factory();
    script.file("keep.txt");
    let view = factory
        .create(["**/*.txt", "docs"], ViewOptions::default())
        .unwrap();
    let recorder = RecordingSubscriber::new();
    recorder.attach(&view);

    script
        .dir("docs")
        .file("new.txt")
        .file("keep.txt")
        .remove_file("new.txt")
        .remove_dir("docs")
        .file("ignored.rs");

    assert_eq!(
        recorder.pairs(),
        vec![
            ("addDir", native("docs")),
            ("add", native("new.txt")),
            ("change", native("keep.txt")),
            ("unlink", native("new.txt")),
            ("unlinkDir", native("docs")),
        ]
    );
}

#[test]
fn unsubscribed_callbacks_stop_firing() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let recorder = RecordingSubscriber::new();
    let id = recorder.attach(&view);

    script.file("a.txt");
    assert!(view.unsubscribe(id));
    script.file("b.txt");

    assert_eq!(recorder.pairs(), vec![("add", native("a.txt"))]);
    assert_eq!(view.files(), set(&["a.txt", "b.txt"]));
}

#[test]
fn absolute_paths_use_the_raw_form() {
    let script = EventScript::new();
    let factory = script.factory();
    let options = ViewOptions {
        absolute: true,
        ..ViewOptions::default()
    };
    let view = factory.create(["*.txt"], options).unwrap();

    script.file("a.txt").file("b.rs");

    let expected = script.path("a.txt").to_string_lossy().into_owned();
    assert_eq!(view.files().into_iter().collect::<Vec<_>>(), vec![expected]);
}

#[test]
fn posix_delimiter_uses_forward_slashes() {
    let script = EventScript::new();
    let factory = script.factory();
    let options = ViewOptions {
        delimiter: Delimiter::Posix,
        ..ViewOptions::default()
    };
    let view = factory.create(["**/*.txt"], options).unwrap();

    script.file("a/b/c.txt");

    assert!(view.files().contains("a/b/c.txt"));
    assert_eq!(view.normalize_path(&script.path("a/b/c.txt")), "a/b/c.txt");
    assert!(view.matches(&script.path("a/b/c.txt")));
    assert!(!view.matches(&script.path("a/b/c.rs")));
}

#[test]
fn late_view_is_seeded_from_the_current_state() {
    let script = EventScript::new();
    let factory = script.factory();
    script.file("a.txt").file("b.txt").remove_file("a.txt").ready();
    assert!(factory.is_ready());

    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    assert_eq!(view.files(), set(&["b.txt"]));
    assert!(view.snapshot().diff.is_empty());
}

#[test]
fn snapshot_reads_every_set_at_once() {
    let script = EventScript::new();
    let factory = script.factory();
    script.file("old.txt");
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();

    script.file("new.txt").file("old.txt");
    let snapshot = view.snapshot();

    assert_eq!(snapshot.files, set(&["new.txt", "old.txt"]));
    assert_eq!(snapshot.diff.added_files, set(&["new.txt"]));
    assert_eq!(snapshot.diff.changed_files, set(&["old.txt"]));
    assert!(snapshot.directories.is_empty());
}

#[test]
fn closed_view_stops_changing() {
    let script = EventScript::new();
    let factory = script.factory();
    factory.set_auto_dispose(false);
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let recorder = RecordingSubscriber::new();
    recorder.attach(&view);

    script.file("a.txt");
    assert!(view.close());
    assert!(!view.close());
    script.file("b.txt");

    assert!(view.is_closed());
    assert_eq!(view.files(), set(&["a.txt"]));
    assert_eq!(recorder.len(), 1);
    assert!(!factory.is_closed());
    assert!(factory.files().iter().any(|f| f.ends_with("b.txt")));
}

#[test]
fn clones_share_one_view() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let other = view.clone();

    script.file("a.txt");
    other.clean();

    assert!(view.added_files().is_empty());
    assert!(other.close());
    assert!(view.is_closed());
}

#[test]
fn replacing_a_file_with_a_directory_is_reported_as_both_transitions() {
    let script = EventScript::new();
    let factory = script.factory();
    script.file("out");
    let view = factory.create(["out"], ViewOptions::default()).unwrap();
    let recorder = RecordingSubscriber::new();
    recorder.attach(&view);

    script.remove_file("out").dir("out");

    let kinds: Vec<GlobEventKind> = recorder.events().into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![GlobEventKind::Unlink, GlobEventKind::AddDir]);
    assert_eq!(view.removed_files(), set(&["out"]));
    assert_eq!(view.added_directories(), set(&["out"]));
    assert!(view.files().is_empty());
}

#[test]
fn paths_outside_the_working_directory_never_match() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory.create(["**/*.txt"], ViewOptions::default()).unwrap();

    let outside = script.root().parent().unwrap().join("elsewhere.txt");
    assert!(!view.matches(&outside));
}

#[tokio::test]
async fn event_stream_yields_changes_and_ends_on_close() {
    let script = EventScript::new();
    let factory = script.factory();
    factory.set_auto_dispose(false);
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let mut events = view.event_stream();

    script.file("a.txt").remove_file("a.txt");
    view.close();

    let first = events.recv().await.unwrap();
    assert_eq!((first.kind, first.path), (GlobEventKind::Add, native("a.txt")));
    let second = events.recv().await.unwrap();
    assert_eq!(second.kind, GlobEventKind::Unlink);
    assert!(events.recv().await.is_none());
}
