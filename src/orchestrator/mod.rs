//! Application-level orchestration utilities.
//!
//! This module owns run lifecycle control (shuffle/run/pause/step/stop) and post-run
//! processing such as the re-shuffle after a stop and the closing status messages.
//! UI/CLI layers call into this module to keep responsibilities separated.

mod controller;
mod post_process;

pub(crate) use controller::{run_controller, UiCommand};
