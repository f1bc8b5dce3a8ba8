//! Hand-gesture pointer control.
//!
//! Per-frame hand landmarks from an external detector become cursor
//! moves, pinch clicks and two-finger scrolls on a host UI.

pub mod backend;
pub mod config;
pub mod detector;
pub mod dispatch;
pub mod frame_timing;
pub mod gesture;
pub mod pipeline;
pub mod session;
pub mod sexp;
