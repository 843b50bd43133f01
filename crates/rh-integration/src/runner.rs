//! Tick loop and autosave
//!
//! Both stop when the frontend drops its `done` sender.

use crate::frontend::Frontend;
use crossbeam::channel::{select, tick, Receiver};
use rh_ffi::HOST;
use std::sync::Weak;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

/// Ticks every `interval` until `done` fires or a tick fails fatally
pub(crate) fn run(frontend: &Frontend, interval: Duration, done: &Receiver<()>) {
    info!("Tick loop every {:?}", interval);
    let ticker = tick(interval);
    let mut frames: u64 = 0;

    loop {
        select! {
            recv(ticker) -> _ => {
                if let Err(e) = frontend.tick() {
                    if e.is_fatal() {
                        error!("Fatal error, stopping: {}", e);
                        break;
                    }
                    error!("Tick failed: {}", e);
                }
                frames += 1;
            }
            recv(done) -> _ => break,
        }
    }
    debug!("Tick loop done after {} frames", frames);
}

/// Saves every `period` while the session runs
pub(crate) fn spawn_autosave(
    frontend: Weak<Frontend>,
    period: Duration,
    done: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    info!("Autosave every [{}s]", period.as_secs());
    std::thread::Builder::new()
        .name("autosave".into())
        .spawn(move || {
            let ticker = tick(period);
            loop {
                select! {
                    recv(ticker) -> _ => {
                        let Some(frontend) = frontend.upgrade() else { return };
                        if HOST.is_stopped() {
                            return;
                        }
                        match frontend.save_game_state() {
                            Ok(()) => debug!("Autosave done"),
                            Err(e) => error!("Autosave failed: {}", e),
                        }
                    }
                    recv(done) -> _ => return,
                }
            }
        })
}
