//! Penmap Core - Shared types for the pen gesture mapper
//!
//! This crate provides the foundational types used across all penmap
//! components: the raw pen button protocol, button masks, pen pointer
//! state snapshots, the preference schema and the error type.

pub mod error;
pub mod protocol;
pub mod settings;

pub use error::{Error, Result};
pub use protocol::{ButtonMask, GestureKind, KeyAction, PenState, RawKeyEvent};
pub use settings::{GestureSettings, PenSettings};
