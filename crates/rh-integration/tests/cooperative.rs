//! Cores that need every call on one thread

mod common;

use common::*;
use rh_integration::Frontend;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn cooperative() -> rh_core::Metadata {
    rh_core::Metadata {
        uses_libco: true,
        ..metadata()
    }
}

#[test]
fn test_calls_stay_on_one_thread() {
    let _g = lock();
    let dir = tempdir().unwrap();
    let frontend = Frontend::new(config(&dir)).unwrap();
    frontend
        .load_core_handle(cooperative(), fake_core(FakeSetup::default()))
        .unwrap();
    assert!(frontend.is_cooperative());
    frontend.load_game(rom(&dir, "game.bin")).unwrap();
    frontend.set_session_id("coop");

    for _ in 0..5 {
        frontend.tick().unwrap();
    }
    frontend.save_game_state().unwrap();
    frontend.restore_game_state().unwrap();
    assert_eq!(frame(), 5);

    // ticks from another thread land on the same call thread
    std::thread::scope(|s| {
        s.spawn(|| frontend.tick().unwrap());
    });
    frontend.close().unwrap();

    let ids: HashSet<_> = threads().into_iter().collect();
    assert_eq!(ids.len(), 1);
    assert!(!ids.contains(&std::thread::current().id()));
    assert_eq!(calls().last(), Some(&"deinit"));
}

#[test]
fn test_direct_calls_run_on_caller() {
    let _g = lock();
    let dir = tempdir().unwrap();
    let frontend = Frontend::new(config(&dir)).unwrap();
    frontend
        .load_core_handle(metadata(), fake_core(FakeSetup::default()))
        .unwrap();
    assert!(!frontend.is_cooperative());
    frontend.load_game(rom(&dir, "game.bin")).unwrap();
    frontend.tick().unwrap();

    let me = std::thread::current().id();
    assert!(threads().iter().all(|id| *id == me));
}

#[test]
fn test_cooperative_session_resumes() {
    let _g = lock();
    let dir = tempdir().unwrap();
    let boot = || {
        let frontend = Frontend::new(config(&dir)).unwrap();
        frontend
            .load_core_handle(cooperative(), fake_core(FakeSetup::default()))
            .unwrap();
        frontend.load_game(rom(&dir, "game.bin")).unwrap();
        frontend.set_session_id("resume");
        frontend
    };

    {
        let frontend = boot();
        for _ in 0..20 {
            frontend.tick().unwrap();
        }
        frontend.save_game_state().unwrap();
    }

    let frontend = Arc::new(boot());
    let runner = {
        let frontend = frontend.clone();
        std::thread::spawn(move || frontend.start())
    };
    let deadline = Instant::now() + Duration::from_secs(5);
    while !calls().contains(&"unserialize") {
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(5));
    }
    frontend.close().unwrap();
    runner.join().unwrap().unwrap();

    // one frame runs before the restore
    let log = calls();
    let first_run = log.iter().position(|c| *c == "run").unwrap();
    let restore = log.iter().position(|c| *c == "unserialize").unwrap();
    assert!(first_run < restore);
    let ids: HashSet<_> = threads().into_iter().collect();
    assert_eq!(ids.len(), 1);
}

#[test]
fn test_failed_warm_up_still_restores() {
    let _g = lock();
    let dir = tempdir().unwrap();
    let frontend = Frontend::new(config(&dir)).unwrap();
    // 0RGB1555 frames can't be converted, so every tick fails
    let setup = FakeSetup {
        pixel_format: 0,
        ..Default::default()
    };
    frontend.load_core_handle(cooperative(), fake_core(setup)).unwrap();
    frontend.load_game(rom(&dir, "game.bin")).unwrap();
    frontend.set_session_id("warm");
    let mut state = vec![0u8; STATE_SIZE];
    state[0] = 7;
    std::fs::write(frontend.save_path(), &state).unwrap();

    let frontend = Arc::new(frontend);
    frontend.start().unwrap();

    let log = calls();
    let first_run = log.iter().position(|c| *c == "run").unwrap();
    let restore = log.iter().position(|c| *c == "unserialize").unwrap();
    assert!(first_run < restore);
    assert_eq!(log.last(), Some(&"deinit"));
}
