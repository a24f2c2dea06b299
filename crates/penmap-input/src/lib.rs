//! Penmap Input - device I/O for the gesture pipeline
//!
//! Two halves: [`PenReader`] reads the physical pen's event device and
//! feeds the session channel; [`VirtualPenButtons`] is the uinput device
//! the mapped button state is written to.

pub mod reader;
pub mod uinput;

pub use reader::PenReader;
pub use uinput::VirtualPenButtons;
