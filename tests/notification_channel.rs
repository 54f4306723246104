// tests/notification_channel.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use liveglob::notification::Fanout;
use liveglob::{Notification, NotificationChannel};

fn collect(channel: &NotificationChannel) -> Arc<Mutex<Vec<Notification>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    channel.subscribe(move |n| sink.lock().unwrap().push(n.clone()));
    seen
}

#[test]
fn receiver_calls_map_to_notifications() {
    let channel = NotificationChannel::new();
    let seen = collect(&channel);
    let receiver = channel.receiver();

    receiver.directory_added("/w/src");
    receiver.file_upserted("/w/src/a.rs");
    receiver.file_removed("/w/src/a.rs");
    receiver.directory_removed("/w/src");
    receiver.warning("careful");
    receiver.info("hello");
    receiver.ready();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            Notification::DirectoryAdded(PathBuf::from("/w/src")),
            Notification::FileUpserted(PathBuf::from("/w/src/a.rs")),
            Notification::FileRemoved(PathBuf::from("/w/src/a.rs")),
            Notification::DirectoryRemoved(PathBuf::from("/w/src")),
            Notification::Warning("careful".to_string()),
            Notification::Info("hello".to_string()),
            Notification::Ready,
        ]
    );
}

#[test]
fn every_listener_sees_every_notification_in_order() {
    let channel = NotificationChannel::new();
    let first = collect(&channel);
    let second = collect(&channel);
    assert_eq!(channel.listener_count(), 2);

    let receiver = channel.receiver();
    receiver.file_upserted("/w/a");
    receiver.file_upserted("/w/b");

    let expected = vec![
        Notification::FileUpserted(PathBuf::from("/w/a")),
        Notification::FileUpserted(PathBuf::from("/w/b")),
    ];
    assert_eq!(*first.lock().unwrap(), expected);
    assert_eq!(*second.lock().unwrap(), expected);
}

#[test]
fn ready_is_delivered_once() {
    let channel = NotificationChannel::new();
    let seen = collect(&channel);
    assert!(!channel.is_ready());

    channel.receiver().ready();
    channel.receiver().ready();

    assert!(channel.is_ready());
    assert_eq!(*seen.lock().unwrap(), vec![Notification::Ready]);
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let channel = NotificationChannel::new();
    let seen = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&seen);
    let id = channel.subscribe(move |_| *counter.lock().unwrap() += 1);

    channel.receiver().file_upserted("/w/a");
    assert!(channel.unsubscribe(id));
    assert!(!channel.unsubscribe(id));
    channel.receiver().file_upserted("/w/b");

    assert_eq!(*seen.lock().unwrap(), 1);
    assert_eq!(channel.listener_count(), 0);
}

#[test]
fn listener_may_unsubscribe_itself_during_delivery() {
    let fanout: Fanout<u32> = Fanout::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let id_slot = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&seen);
    let slot = Arc::clone(&id_slot);
    let handle = fanout.clone();
    let id = fanout.subscribe(move |value| {
        sink.lock().unwrap().push(*value);
        if let Some(id) = *slot.lock().unwrap() {
            handle.unsubscribe(id);
        }
    });
    *id_slot.lock().unwrap() = Some(id);

    fanout.emit(&1);
    fanout.emit(&2);

    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(fanout.is_empty());
}

#[test]
fn snapshot_excludes_later_subscribers() {
    let fanout: Fanout<u32> = Fanout::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    fanout.subscribe(move |value| sink.lock().unwrap().push(("early", *value)));
    let delivery = fanout.snapshot();

    let sink = Arc::clone(&seen);
    fanout.subscribe(move |value| sink.lock().unwrap().push(("late", *value)));
    delivery.deliver(&7);

    assert_eq!(*seen.lock().unwrap(), vec![("early", 7)]);
    assert_eq!(fanout.len(), 2);
}

#[test]
fn raw_path_is_only_set_for_path_signals() {
    assert_eq!(
        Notification::FileRemoved(PathBuf::from("/w/a")).raw_path(),
        Some(PathBuf::from("/w/a").as_path())
    );
    assert_eq!(Notification::Ready.raw_path(), None);
    assert_eq!(Notification::Info("x".into()).raw_path(), None);
}
