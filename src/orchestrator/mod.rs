//! Application-level orchestration utilities.
//!
//! This module owns the minify session lifecycle (start/clear/copy/download) and the
//! cosmetic progress ticker. UI/CLI layers call into this module to keep
//! responsibilities separated.

mod controller;

pub(crate) use controller::{run_controller, SessionController, UiCommand};
