//! Integration tests: start rollback, stop ordering, async stop completion.

use crate::mock_subsystems::*;
use cmdcore::dispatch::{Registry, SubsystemFlag};

#[test]
fn start_inits_in_table_order() {
    let mut reg = Registry::new();
    let chain = chain_subsystem();
    fail_init_of(None);
    assert_eq!(reg.start(&chain), Ok(()));
    assert_eq!(take_calls(), ["m0.init", "m1.init", "m2.init"]);
    assert!(chain.is_started());
}

#[test]
fn init_failure_rolls_back_in_reverse() {
    let mut reg = Registry::new();
    let chain = chain_subsystem();
    fail_init_of(Some("m2"));
    assert_eq!(reg.start(&chain), Err(INIT_FAILURE));
    assert_eq!(
        take_calls(),
        ["m0.init", "m1.init", "m2.init", "m1.deinit", "m0.deinit"]
    );
    assert!(!chain.is_started());
    assert!(chain.is_registered());
    fail_init_of(None);
}

#[test]
fn first_init_failure_deinits_nothing() {
    let mut reg = Registry::new();
    let chain = chain_subsystem();
    fail_init_of(Some("m0"));
    assert_eq!(reg.start(&chain), Err(INIT_FAILURE));
    assert_eq!(take_calls(), ["m0.init"]);
    assert!(chain.is_stopped());
    fail_init_of(None);
}

#[test]
fn second_module_failure_deinits_only_first() {
    // Modules {m0 (ok), m1 (fails)}: only m0.deinit runs.
    let mut reg = Registry::new();
    let chain = chain_subsystem();
    fail_init_of(Some("m1"));
    assert_eq!(reg.start(&chain), Err(INIT_FAILURE));
    let calls = take_calls();
    assert_eq!(calls, ["m0.init", "m1.init", "m0.deinit"]);
    assert!(!chain.has_flag(SubsystemFlag::Started));
    fail_init_of(None);
}

#[test]
fn stop_runs_hooks_in_reverse() {
    let mut reg = Registry::new();
    let chain = chain_subsystem();
    reg.start(&chain).unwrap();
    take_calls();

    chain.stop();
    assert_eq!(take_calls(), ["m2.stop", "m1.stop", "m0.stop"]);
    assert!(chain.has_finished_stopping());
    assert!(!chain.is_started());
}

#[test]
fn async_stop_completes_after_loop_and_work() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    take_calls();

    radio.stop();
    assert_eq!(take_calls(), ["radio.stop", "system.stop"]);
    assert_eq!(pending_stops(), 1);
    assert_eq!(radio.pending_async_stops(), 1);
    assert!(radio.has_flag(SubsystemFlag::StoppingOngoing));
    assert!(!radio.has_finished_stopping());
    assert!(!radio.is_stopped());

    finish_one_stop();
    assert!(radio.has_finished_stopping());
    assert!(!radio.has_flag(SubsystemFlag::StoppingOngoing));
    assert_eq!(radio.pending_async_stops(), 0);
}

#[test]
fn restart_after_async_stop() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    radio.stop();
    finish_one_stop();
    take_calls();

    assert_eq!(reg.start(&radio), Ok(()));
    assert!(radio.is_started());
    assert!(!radio.has_finished_stopping());
    assert_eq!(take_calls(), ["system.init", "radio.init"]);
    assert_eq!(reg.len(), 1);
}

#[test]
#[should_panic(expected = "async stop")]
fn stop_while_stopping_panics() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    radio.stop();
    radio.stop();
}

#[test]
fn deinit_is_unconditional_and_keeps_registration() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    radio.stop();
    take_calls();

    radio.deinit();
    assert_eq!(take_calls(), ["radio.deinit", "system.deinit"]);
    assert!(radio.is_stopped());
    assert!(radio.is_registered());
    assert_eq!(radio.pending_async_stops(), 0);

    // Never started: deinit still runs every hook.
    let chain = chain_subsystem();
    chain.deinit();
    assert_eq!(take_calls(), ["m2.deinit", "m1.deinit", "m0.deinit"]);
}

#[test]
fn flags_are_mutually_exclusive_through_cycle() {
    let run_state = [
        SubsystemFlag::Started,
        SubsystemFlag::StoppingOngoing,
        SubsystemFlag::StoppingReady,
    ];
    let count = |s: &cmdcore::Subsystem| run_state.iter().filter(|f| s.has_flag(**f)).count();

    let mut reg = Registry::new();
    let radio = radio_subsystem();
    assert_eq!(count(&radio), 0);
    reg.start(&radio).unwrap();
    assert_eq!(count(&radio), 1);
    radio.stop();
    assert_eq!(count(&radio), 1);
    finish_one_stop();
    assert_eq!(count(&radio), 1);
    radio.deinit();
    assert_eq!(count(&radio), 0);
}

#[test]
fn inline_completion_does_not_finish_early() {
    let mut reg = Registry::new();
    let mixed = mixed_subsystem();
    reg.start(&mixed).unwrap();
    take_calls();

    mixed.stop();
    assert_eq!(take_calls(), ["sync.stop", "radio.stop", "watch.pending"]);
    assert!(!mixed.has_finished_stopping());
    assert_eq!(mixed.pending_async_stops(), 1);

    finish_one_stop();
    assert!(mixed.has_finished_stopping());
    assert_eq!(mixed.pending_async_stops(), 0);
}

#[test]
fn all_inline_stops_finish_when_loop_ends() {
    let mut reg = Registry::new();
    let sync = sync_subsystem();
    reg.start(&sync).unwrap();
    take_calls();

    sync.stop();
    assert_eq!(take_calls(), ["sync.stop", "watch.pending"]);
    assert!(sync.has_finished_stopping());
    assert_eq!(sync.pending_async_stops(), 0);
}

#[test]
fn late_completion_after_restart_keeps_started() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    radio.stop();
    reg.start(&radio).unwrap();

    finish_one_stop();
    assert!(radio.is_started());
    assert!(!radio.has_finished_stopping());
    assert!(!radio.has_flag(SubsystemFlag::StoppingOngoing));
    assert_eq!(radio.pending_async_stops(), 0);
}

#[test]
fn late_completion_after_deinit_is_harmless() {
    let mut reg = Registry::new();
    let radio = radio_subsystem();
    reg.start(&radio).unwrap();
    radio.stop();
    radio.deinit();

    finish_one_stop();
    assert!(radio.is_stopped());
    assert_eq!(radio.pending_async_stops(), 0);

    // A fresh stop cycle still works.
    reg.start(&radio).unwrap();
    radio.stop();
    finish_one_stop();
    assert!(radio.has_finished_stopping());
}
