//! Backends that feed a gesture session: a recorded-landmark detector and a
//! headless UI surface driven by a timer loop.

pub mod headless;
pub mod replay;
