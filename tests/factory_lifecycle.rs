// tests/factory_lifecycle.rs

mod common;
use crate::common::{EventScript, ScriptedProvider, init_tracing, set, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use liveglob::{BackendError, LiveGlobError, LiveGlobFactory, ViewOptions};

fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = Arc::clone(&count);
    (count, move || {
        handle.fetch_add(1, Ordering::SeqCst);
    })
}

/// Wait until the spawned backend release has run.
async fn wait_for_disposes(provider: &ScriptedProvider, expected: usize) {
    with_timeout(async {
        while provider.disposes() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

#[test]
fn disposal_fans_in_from_the_last_view() {
    init_tracing();
    let script = EventScript::new();
    let factory = script.factory();
    let (teardowns, on_teardown) = counter();
    factory.on_disposal(on_teardown);

    let a = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let b = factory.create(["*.rs"], ViewOptions::default()).unwrap();
    assert_eq!(factory.view_count(), 2);

    assert!(a.close());
    assert!(!factory.is_closed());
    assert_eq!(factory.view_count(), 1);
    assert_eq!(teardowns.load(Ordering::SeqCst), 0);

    assert!(b.close());
    assert!(factory.is_closed());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);

    assert!(!b.close());
    assert!(!factory.dispose());
    assert_eq!(teardowns.load(Ordering::SeqCst), 1);
}

#[test]
fn create_after_disposal_fails_with_already_closed() {
    let script = EventScript::new();
    let factory = script.factory();
    assert!(factory.dispose());

    let err = factory
        .create(["*.txt"], ViewOptions::default())
        .unwrap_err();
    assert!(matches!(err, LiveGlobError::AlreadyClosed));
    assert_eq!(err.to_string(), "This factory has already been closed.");
}

#[test]
fn disposing_the_factory_closes_every_view() {
    let script = EventScript::new();
    let factory = script.factory();
    let a = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    let b = factory.create(["*.rs"], ViewOptions::default()).unwrap();

    script.file("a.txt");
    assert!(factory.dispose());
    script.file("b.txt").file("c.rs");

    assert!(a.is_closed());
    assert!(b.is_closed());
    assert_eq!(a.files(), set(&["a.txt"]));
    assert!(b.files().is_empty());
    assert_eq!(script.channel().listener_count(), 0);
}

#[test]
fn auto_dispose_can_be_turned_off() {
    let script = EventScript::new();
    let factory = script.factory();
    factory.set_auto_dispose(false);

    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    view.close();
    assert!(!factory.is_closed());

    let again = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    script.file("a.txt");
    assert_eq!(again.files(), set(&["a.txt"]));
}

#[test]
fn failed_create_leaves_other_views_untouched() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();

    assert!(factory.create(["[oops"], ViewOptions::default()).is_err());
    script.file("a.txt");

    assert_eq!(factory.view_count(), 1);
    assert_eq!(view.files(), set(&["a.txt"]));
}

#[test]
fn factory_keeps_the_unfiltered_state() {
    let script = EventScript::new();
    let factory = script.factory();
    script.dir("src").file("src/lib.rs").file("notes.txt").remove_file("notes.txt");

    let raw = |rel: &str| script.path(rel).to_string_lossy().into_owned();
    assert_eq!(
        factory.files().into_iter().collect::<Vec<_>>(),
        vec![raw("src/lib.rs")]
    );
    assert_eq!(
        factory.directories().into_iter().collect::<Vec<_>>(),
        vec![raw("src")]
    );
}

#[test]
fn diagnostics_do_not_change_state() {
    let script = EventScript::new();
    let factory = script.factory();
    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();

    script.warning("queue overflow").info("hello");

    assert!(factory.files().is_empty());
    assert!(view.snapshot().diff.is_empty());
}

#[tokio::test]
async fn open_with_reports_initial_tree_before_returning() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new()
        .with_dir("src")
        .with_file("src/lib.rs")
        .with_file("README.md");

    let factory = LiveGlobFactory::open_with(dir.path(), &provider)
        .await
        .unwrap();
    assert!(factory.is_ready());
    assert_eq!(provider.starts(), 1);

    let view = factory
        .create(["**/*.rs", "*.md"], ViewOptions::default())
        .unwrap();
    assert_eq!(view.files(), set(&["README.md", "src/lib.rs"]));

    provider.receiver().file_upserted(provider.path("src/main.rs"));
    assert_eq!(view.added_files(), set(&["src/main.rs"]));

    factory.close().await.unwrap();
    assert!(view.is_closed());
    assert_eq!(provider.disposes(), 1);
}

#[tokio::test]
async fn failed_start_is_surfaced_and_cleaned_up() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new().failing_start();

    let err = LiveGlobFactory::open_with(dir.path(), &provider)
        .await
        .unwrap_err();

    assert!(matches!(err, LiveGlobError::Backend(BackendError::Scan { .. })));
    assert_eq!(provider.starts(), 1);
    assert_eq!(provider.disposes(), 1);
}

#[tokio::test]
async fn capability_errors_are_passed_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new().unsupported("no relative roots");

    let err = LiveGlobFactory::open_with(dir.path(), &provider)
        .await
        .unwrap_err();

    match err {
        LiveGlobError::Backend(BackendError::Capability(message)) => {
            assert_eq!(message, "no relative roots")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(provider.starts(), 0);
}

#[tokio::test]
async fn closing_the_last_view_releases_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let provider = ScriptedProvider::new().with_file("a.txt");
    let factory = LiveGlobFactory::open_with(dir.path(), &provider)
        .await
        .unwrap();

    let view = factory.create(["*.txt"], ViewOptions::default()).unwrap();
    view.close();

    assert!(factory.is_closed());
    wait_for_disposes(&provider, 1).await;

    // Closing again does not release twice.
    factory.close().await.unwrap();
    assert_eq!(provider.disposes(), 1);
}

#[tokio::test]
async fn registry_reuses_one_factory_per_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();

    let registry = liveglob::FactoryRegistry::new();
    let options = liveglob::Options {
        cwd: Some(dir.path().to_path_buf()),
        ..liveglob::Options::default()
    };

    let first = registry.glob(["*.txt"], &options).await.unwrap();
    let second = registry.glob(["*.md"], &options).await.unwrap();
    assert_eq!(registry.open_factories().await, 1);
    assert_eq!(first.factory().view_count(), 2);
    assert_eq!(first.files(), set(&["a.txt"]));
    assert!(second.files().is_empty());

    first.close();
    second.close();
    assert_eq!(registry.open_factories().await, 0);

    // The closed factory is replaced transparently.
    let third = registry.glob(["*.txt"], &options).await.unwrap();
    assert_eq!(third.files(), set(&["a.txt"]));
    assert!(!third.factory().is_closed());
    third.factory().close().await.unwrap();
}
