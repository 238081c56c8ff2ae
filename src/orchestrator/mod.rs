//! Application-level orchestration.
//!
//! This module owns the background work the UI must not block on, which is
//! place search. UI layers send commands in and receive events back.

mod controller;

pub(crate) use controller::{run_controller, UiCommand};
