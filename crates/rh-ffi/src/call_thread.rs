//! The single thread cooperative (stack-switching) cores run on
//!
//! Such cores keep their own stacks and break if they're entered from
//! different OS threads, so every call into them goes through one
//! process-lifetime worker. Requests queue on a capacity-1 channel and the
//! caller blocks until its job replies.

use crossbeam::channel::{bounded, Sender};
use once_cell::sync::Lazy;
use rh_core::CoreError;
use std::thread::{self, ThreadId};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker actor owning the cooperative thread
pub struct CallThread {
    jobs: Sender<Job>,
    id: ThreadId,
}

static CALL_THREAD: Lazy<Option<CallThread>> = Lazy::new(|| match CallThread::spawn() {
    Ok(t) => Some(t),
    Err(e) => {
        tracing::error!("Couldn't start the core call thread: {}", e);
        None
    }
});

impl CallThread {
    fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = bounded::<Job>(1);
        let handle = thread::Builder::new()
            .name("libco".to_string())
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    job();
                }
            })?;
        Ok(Self {
            jobs: tx,
            id: handle.thread().id(),
        })
    }

    /// The process-wide call thread, started on first use
    pub fn global() -> Result<&'static CallThread, CoreError> {
        CALL_THREAD.as_ref().ok_or(CoreError::CallThreadGone)
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Runs `f` on the call thread and waits for its result.
    ///
    /// Calls made from the call thread itself (a core calling back into the
    /// host which calls the core again) run inline.
    pub fn call<R, F>(&self, f: F) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce() -> R + Send + 'static,
    {
        if self.is_current() {
            return Ok(f());
        }
        let (tx, rx) = bounded(1);
        self.jobs
            .send(Box::new(move || {
                let _ = tx.send(f());
            }))
            .map_err(|_| CoreError::CallThreadGone)?;
        rx.recv().map_err(|_| CoreError::CallThreadGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_same_thread_for_every_call() {
        let ct = CallThread::global().unwrap();
        let ids: Vec<ThreadId> = (0..8)
            .map(|_| {
                thread::spawn(move || ct.call(|| thread::current().id()).unwrap())
                    .join()
                    .unwrap()
            })
            .collect();
        assert!(ids.iter().all(|id| *id == ct.id()));
        assert_ne!(thread::current().id(), ct.id());
    }

    #[test]
    fn test_nested_call_runs_inline() {
        let ct = CallThread::global().unwrap();
        let v = ct.call(move || ct.call(|| 41).unwrap() + 1).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn test_calls_are_serialized() {
        let ct = CallThread::global().unwrap();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let c = counter.clone();
                        ct.call(move || {
                            let v = c.load(std::sync::atomic::Ordering::Relaxed);
                            c.store(v + 1, std::sync::atomic::Ordering::Relaxed);
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(std::sync::atomic::Ordering::Relaxed), 400);
    }
}
