//! Load-completion watcher scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use testrig_loader::LoadWatcher;

use crate::helpers;

#[test]
fn test_target_then_readiness_then_single_fire() {
    let rig = helpers::rig();
    let ready = Arc::new(AtomicBool::new(false));
    let fires = Arc::new(AtomicUsize::new(0));

    let watcher = {
        let ready = ready.clone();
        let fires = fires.clone();
        LoadWatcher::new(
            &rig.events,
            |path| path.to_string_lossy().ends_with("/Foo"),
            move || ready.load(Ordering::SeqCst),
            move || {
                fires.fetch_add(1, Ordering::SeqCst);
            },
        )
    };

    rig.host.append("/Bar");
    rig.host.append("/Baz");
    assert!(!watcher.saw_target());
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    rig.host.append("/Lib/Foo");
    assert!(watcher.saw_target());
    // Target seen but not ready: no fire yet.
    assert!(!watcher.fired());
    assert_eq!(fires.load(Ordering::SeqCst), 0);

    ready.store(true, Ordering::SeqCst);
    rig.host.notify("/re-delivery");
    assert!(watcher.fired());
    assert_eq!(fires.load(Ordering::SeqCst), 1);
    assert!(!rig.events.contains(&watcher.token()));

    // Terminal: further notifications are no-ops.
    rig.host.append("/Lib/Later");
    assert_eq!(fires.load(Ordering::SeqCst), 1);
}

#[test]
fn test_watchers_fire_independently() {
    let rig = helpers::rig();
    let foo_fires = Arc::new(AtomicUsize::new(0));
    let bar_fires = Arc::new(AtomicUsize::new(0));

    let foo_watcher = {
        let fires = foo_fires.clone();
        LoadWatcher::new(
            &rig.events,
            |path| path.to_string_lossy().ends_with("/Foo"),
            || true,
            move || {
                fires.fetch_add(1, Ordering::SeqCst);
            },
        )
    };
    let bar_watcher = {
        let fires = bar_fires.clone();
        LoadWatcher::new(
            &rig.events,
            |path| path.to_string_lossy().ends_with("/Bar"),
            || true,
            move || {
                fires.fetch_add(1, Ordering::SeqCst);
            },
        )
    };

    rig.host.append("/Lib/Foo");
    assert!(foo_watcher.fired());
    assert!(!bar_watcher.fired());
    assert_eq!(rig.events.handler_count(), 1);

    rig.host.append("/Lib/Bar");
    assert!(bar_watcher.fired());
    assert_eq!(foo_fires.load(Ordering::SeqCst), 1);
    assert_eq!(bar_fires.load(Ordering::SeqCst), 1);
    assert_eq!(rig.events.handler_count(), 0);
}

#[test]
fn test_loads_from_many_threads_fire_once() {
    let rig = helpers::rig();
    let fires = Arc::new(AtomicUsize::new(0));

    let watcher = {
        let fires = fires.clone();
        LoadWatcher::new(
            &rig.events,
            |path| path.to_string_lossy().ends_with("/Foo"),
            || true,
            move || {
                fires.fetch_add(1, Ordering::SeqCst);
            },
        )
    };

    // Loader notifications arrive on whatever thread triggered the load.
    let threads: Vec<_> = (0..8)
        .map(|i| {
            let host = rig.host.clone();
            std::thread::spawn(move || {
                if i == 0 {
                    host.append("/Lib/Foo");
                } else {
                    host.append(&format!("/Lib/Other{i}"));
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().expect("loader thread panicked");
    }

    assert!(watcher.fired());
    assert_eq!(fires.load(Ordering::SeqCst), 1);
}
