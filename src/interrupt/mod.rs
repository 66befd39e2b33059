//! Spoken "stop" handling: the shared [`CancellationFlag`] and the background
//! [`InterruptMonitor`] that raises it.

pub mod flag;
pub mod monitor;

pub use flag::CancellationFlag;
pub use monitor::{InterruptHandle, InterruptMonitor};
