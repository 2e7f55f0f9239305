//! The serialized UI context that owns the overlay sink.
//!
//! The display coordinator never paints. It enqueues [`OverlayCommand`]s on an
//! [`OverlayHandle`]; a single Tokio task owns the [`OverlaySink`] and applies
//! the commands one at a time, in the order they were enqueued. Enqueueing
//! never blocks, so it is safe to do from inside the coordinator's lock.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

/// The overlay surface: window text, terminal line, or a test recorder.
///
/// Both operations are expected to be idempotent and cheap. They are only
/// ever called from the overlay context task.
pub trait OverlaySink: Send + 'static {
    fn show(&mut self, text: &str);
    fn clear(&mut self);
}

/// A UI side effect queued for the overlay context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayCommand {
    Show(String),
    Clear,
}

/// Cloneable handle used to enqueue overlay commands.
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    tx: UnboundedSender<OverlayCommand>,
}

impl OverlayHandle {
    pub fn show(&self, text: String) {
        self.send(OverlayCommand::Show(text));
    }

    pub fn clear(&self) {
        self.send(OverlayCommand::Clear);
    }

    fn send(&self, command: OverlayCommand) {
        if self.tx.send(command).is_err() {
            debug!("overlay context has shut down; dropping command");
        }
    }
}

/// Spawns the overlay context task on the current Tokio runtime.
///
/// The task runs until every [`OverlayHandle`] clone has been dropped and then
/// returns the sink, which lets tests inspect it afterwards.
pub fn spawn_overlay_context<S: OverlaySink>(sink: S) -> (OverlayHandle, JoinHandle<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_overlay_context(sink, rx));
    (OverlayHandle { tx }, task)
}

async fn run_overlay_context<S: OverlaySink>(
    mut sink: S,
    mut rx: UnboundedReceiver<OverlayCommand>,
) -> S {
    while let Some(command) = rx.recv().await {
        match command {
            OverlayCommand::Show(text) => sink.show(&text),
            OverlayCommand::Clear => sink.clear(),
        }
    }
    debug!("overlay context stopped");
    sink
}
