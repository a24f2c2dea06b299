//! Penmap Gesture - pen button gesture classification and mapping
//!
//! This crate turns raw pen button key events into semantic gestures and
//! maps each gesture onto the virtual stylus button state. The pipeline:
//!
//! raw key event -> [`GestureClassifier`] -> [`GestureKind`] ->
//! [`GestureMapper`] (consulting the [`GestureTable`]) -> output commands
//!
//! The classifier and mapper are pure state machines; [`MapperSession`]
//! is the shell that performs collaborator I/O and owns release timers.
//!
//! [`GestureKind`]: penmap_core::GestureKind

pub mod classifier;
pub mod mapper;
pub mod session;
pub mod table;

pub use classifier::{Classified, GestureClassifier};
pub use mapper::{ButtonPatch, Command, GestureMapper};
pub use session::{ButtonSink, LogNotifier, MapperSession, Notifier, SessionEvent};
pub use table::{GestureConfig, GestureMode, GestureTable};
