//! Main-thread override scenarios across threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use testrig_core::config::main_thread::MainThreadConfig;
use testrig_dispatch::main_thread::OverrideState;
use testrig_dispatch::{MainThreadOverride, OpCall, OpReturn};

use crate::helpers;

#[test]
fn test_runner_registration_on_loader_thread() {
    let rig = helpers::rig();
    rig.table
        .define_op("Thread", "is_main_thread", Arc::new(|_| OpReturn::Bool(false)));

    let override_layer = MainThreadOverride::new(
        rig.table.clone(),
        rig.events.clone(),
        rig.context.clone(),
        MainThreadConfig::default(),
    );
    override_layer.setup();
    assert_eq!(override_layer.state(), OverrideState::WaitingForModule);

    // The runner core registers its types and loads on a background
    // thread, the way a real loader delivers notifications.
    let loader_thread = {
        let host = rig.host.clone();
        let table = rig.table.clone();
        std::thread::spawn(move || {
            table.define_op("TestObservationCenter", "add_observer", Arc::new(|_| OpReturn::Unit));
            table.define_op(
                "TestObservationCenter",
                "remove_observer",
                Arc::new(|_| OpReturn::Unit),
            );
            host.append("/opt/runner/libtestrunner_core.so");
        })
    };
    loader_thread.join().expect("loader thread panicked");

    assert_eq!(override_layer.state(), OverrideState::Installed);
    assert_eq!(override_layer.intercept_count(), 3);
}

#[test]
fn test_observer_calls_serialize_from_any_thread() {
    let rig = helpers::rig();
    rig.table
        .define_op("Thread", "is_main_thread", Arc::new(|_| OpReturn::Bool(false)));

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let on_context = Arc::new(AtomicBool::new(true));
    {
        let context = rig.context.clone();
        let active = active.clone();
        let peak = peak.clone();
        let on_context = on_context.clone();
        rig.table.define_op(
            "TestObservationCenter",
            "add_observer",
            Arc::new(move |_| {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                on_context.fetch_and(context.is_current(), Ordering::SeqCst);
                active.fetch_sub(1, Ordering::SeqCst);
                OpReturn::Unit
            }),
        );
    }
    rig.table
        .define_op("TestObservationCenter", "remove_observer", Arc::new(|_| OpReturn::Unit));

    let override_layer = MainThreadOverride::new(
        rig.table.clone(),
        rig.events.clone(),
        rig.context.clone(),
        MainThreadConfig::default(),
    );
    override_layer.setup();
    rig.host.append("/opt/runner/libtestrunner_core.so");
    assert_eq!(override_layer.state(), OverrideState::Installed);

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let table = rig.table.clone();
            std::thread::spawn(move || {
                let call = OpCall::with_argument(Arc::new(()), Arc::new(1u32));
                table.invoke("TestObservationCenter", "add_observer", &call);
            })
        })
        .collect();
    for thread in threads {
        thread.join().expect("caller thread panicked");
    }

    // Every forwarded call ran on the context thread, one at a time.
    assert!(on_context.load(Ordering::SeqCst));
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[test]
fn test_identity_answers_differ_by_context() {
    let rig = helpers::rig();
    let original_hits = Arc::new(AtomicUsize::new(0));
    {
        let original_hits = original_hits.clone();
        rig.table.define_op(
            "Thread",
            "is_main_thread",
            Arc::new(move |_| {
                original_hits.fetch_add(1, Ordering::SeqCst);
                OpReturn::Bool(false)
            }),
        );
    }

    let override_layer = MainThreadOverride::new(
        rig.table.clone(),
        rig.events.clone(),
        rig.context.clone(),
        MainThreadConfig::default(),
    );
    override_layer.setup();

    // Outside the context the original answers, and is actually consulted.
    let call = OpCall::on(Arc::new(()));
    assert_eq!(
        rig.table.invoke("Thread", "is_main_thread", &call),
        Some(OpReturn::Bool(false))
    );
    assert_eq!(original_hits.load(Ordering::SeqCst), 1);

    // Inside the context the lie is unconditional; the original is not
    // consulted.
    let table = rig.table.clone();
    let answer = rig
        .context
        .run_sync(move || table.invoke("Thread", "is_main_thread", &OpCall::on(Arc::new(()))));
    assert_eq!(answer, Some(OpReturn::Bool(true)));
    assert_eq!(original_hits.load(Ordering::SeqCst), 1);
}
