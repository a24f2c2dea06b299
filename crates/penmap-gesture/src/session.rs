//! Session shell around the classifier and mapper
//!
//! The session is the single logical owner of the gesture pipeline: one
//! task drains one event channel, so key events, pointer updates, timer
//! callbacks and reloads are processed strictly in arrival order. Timers
//! post back into the same channel rather than touching state directly.

use crate::classifier::{Classified, GestureClassifier};
use crate::mapper::{Command, GestureMapper};
use crate::table::GestureTable;
use penmap_core::{ButtonMask, GestureKind, PenSettings, PenState, RawKeyEvent, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Output side of the session: the virtual device the mapped button state
/// is written to.
pub trait ButtonSink {
    /// Button mask as currently held by the device.
    fn current_buttons(&self) -> ButtonMask;
    /// Replace the device's button mask.
    fn send_buttons(&mut self, buttons: ButtonMask) -> Result<()>;
    /// Publish which bits are toggle-held, for indicator purposes.
    fn set_toggle_indicator(&mut self, mask: ButtonMask);
}

/// User-facing notification surface. Must not block.
pub trait Notifier {
    fn show(&self, message: &str);
}

/// Notifier that writes to the log instead of a display surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, message: &str) {
        info!("{message}");
    }
}

/// Events drained by the session loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Raw key event from the pen's input device.
    Key(RawKeyEvent),
    /// Pointer state frame from the pen's input device.
    Pen(PenState),
    /// A scheduled press release came due.
    ReleaseDue(GestureKind),
    /// Fresh settings snapshot to rebuild the gesture table from.
    Reload(PenSettings),
    /// Stop the session loop.
    Shutdown,
}

/// Event loop wiring the classifier and mapper to a [`ButtonSink`].
///
/// Holds one timer slot per gesture kind; scheduling a release for a kind
/// replaces any earlier timer for that kind.
pub struct MapperSession<S, N> {
    classifier: GestureClassifier,
    mapper: GestureMapper,
    sink: S,
    notifier: N,
    /// Sender for release timers to post back into the session channel.
    tx: mpsc::Sender<SessionEvent>,
    timers: [Option<JoinHandle<()>>; GestureKind::COUNT],
}

impl<S: ButtonSink, N: Notifier> MapperSession<S, N> {
    pub fn new(table: GestureTable, sink: S, notifier: N, tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            classifier: GestureClassifier::new(),
            mapper: GestureMapper::new(table),
            sink,
            notifier,
            tx,
            timers: [const { None }; GestureKind::COUNT],
        }
    }

    /// Drain the event channel until [`SessionEvent::Shutdown`] arrives.
    ///
    /// The session holds a sender of its own for timer callbacks, so the
    /// channel never closes underneath it; `Shutdown` is the exit path.
    pub async fn run(mut self, mut rx: mpsc::Receiver<SessionEvent>) -> Result<()> {
        while let Some(event) = rx.recv().await {
            match event {
                SessionEvent::Key(raw) => {
                    if let Classified::Gesture(kind) = self.classifier.classify(&raw) {
                        debug!(%kind, "gesture detected");
                        let current = self.sink.current_buttons();
                        let cmds = self.mapper.on_gesture(kind, current);
                        self.execute(cmds)?;
                    }
                }
                SessionEvent::Pen(state) => {
                    let cmds = self.mapper.on_pen_state(&state);
                    self.execute(cmds)?;
                }
                SessionEvent::ReleaseDue(kind) => {
                    self.timers[kind.index()] = None;
                    let cmds = self.mapper.on_release_due(kind);
                    self.execute(cmds)?;
                }
                SessionEvent::Reload(settings) => {
                    let cmds = self.mapper.reload(GestureTable::rebuild(&settings));
                    self.execute(cmds)?;
                    info!("gesture settings reloaded");
                }
                SessionEvent::Shutdown => {
                    info!("session shutting down");
                    break;
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, cmds: Vec<Command>) -> Result<()> {
        for cmd in cmds {
            match cmd {
                Command::Buttons(patch) => {
                    // Applied against the mask the device holds right now,
                    // not the one the mapper saw when it decided.
                    let next = patch.apply(self.sink.current_buttons());
                    self.sink.send_buttons(next)?;
                }
                Command::ToggleIndicator(mask) => self.sink.set_toggle_indicator(mask),
                Command::Notify(message) => self.notifier.show(&message),
                Command::Schedule { kind, delay } => self.schedule(kind, delay),
                Command::CancelRelease(kind) => {
                    if let Some(timer) = self.timers[kind.index()].take() {
                        timer.abort();
                    }
                }
            }
        }
        Ok(())
    }

    fn schedule(&mut self, kind: GestureKind, delay: Duration) {
        if let Some(old) = self.timers[kind.index()].take() {
            old.abort();
        }
        let tx = self.tx.clone();
        self.timers[kind.index()] = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The session may already be gone on shutdown.
            let _ = tx.send(SessionEvent::ReleaseDue(kind)).await;
        }));
    }
}

impl<S, N> Drop for MapperSession<S, N> {
    fn drop(&mut self) {
        for timer in self.timers.iter_mut().filter_map(Option::take) {
            timer.abort();
        }
    }
}
