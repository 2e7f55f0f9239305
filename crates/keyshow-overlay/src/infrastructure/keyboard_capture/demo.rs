//! Demo listener for hosts without a low-level keyboard hook.
//!
//! Presses `SHIFT + A` on a background thread every interval, through a
//! [`SimulatedKeyboardListener`], so the whole pipeline can be watched
//! end-to-end on Linux or macOS.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use keyshow_core::keymap::vk;
use tracing::{debug, warn};

use super::simulated::SimulatedKeyboardListener;
use super::{KeyEventReceiver, KeyboardListener, ListenerError};

/// Interval between synthetic presses.
pub const DEFAULT_DEMO_INTERVAL: Duration = Duration::from_secs(2);

struct DemoWorker {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

/// A [`KeyboardListener`] that emits a synthetic `SHIFT + A` periodically.
pub struct DemoKeyboardListener {
    interval: Duration,
    source: Arc<SimulatedKeyboardListener>,
    worker: Mutex<Option<DemoWorker>>,
}

impl DemoKeyboardListener {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            source: Arc::new(SimulatedKeyboardListener::new()),
            worker: Mutex::new(None),
        }
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<DemoWorker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DemoKeyboardListener {
    fn default() -> Self {
        Self::new(DEFAULT_DEMO_INTERVAL)
    }
}

impl KeyboardListener for DemoKeyboardListener {
    fn start(&self) -> Result<KeyEventReceiver, ListenerError> {
        let mut worker = self.lock_worker();
        if worker.is_some() {
            return Err(ListenerError::AlreadyStarted);
        }

        let rx = self.source.start()?;
        let (shutdown, shutdown_rx) = mpsc::channel::<()>();
        let source = Arc::clone(&self.source);
        let interval = self.interval;

        let thread = thread::Builder::new()
            .name("keyshow-demo".to_string())
            .spawn(move || loop {
                match shutdown_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => press_shift_a(&source),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| {
                self.source.stop();
                ListenerError::HookInstallFailed(e.to_string())
            })?;

        *worker = Some(DemoWorker { shutdown, thread });
        debug!(?interval, "demo keyboard listener started");
        Ok(rx)
    }

    fn stop(&self) {
        let Some(worker) = self.lock_worker().take() else {
            return;
        };
        // Remove the simulated hook first so nothing is emitted after stop().
        self.source.stop();
        let _ = worker.shutdown.send(());
        if worker.thread.join().is_err() {
            warn!("demo keyboard thread panicked");
        }
        debug!("demo keyboard listener stopped");
    }

    fn is_running(&self) -> bool {
        self.lock_worker().is_some()
    }
}

impl Drop for DemoKeyboardListener {
    fn drop(&mut self) {
        self.stop();
    }
}

// Shift is held on the key state only, so each tick emits the single
// combined press.
fn press_shift_a(source: &SimulatedKeyboardListener) {
    source.keyboard().set_pressed(vk::VK_LSHIFT, true);
    let _ = source.tap(vk::VK_A);
    source.keyboard().set_pressed(vk::VK_LSHIFT, false);
}
