//! # Capture State Machine
//!
//! Drives countdown → capture → pause cycles until the target photo count is
//! reached. Transitions are pure and return the commands the caller must
//! execute.

mod machine;

pub use machine::{CaptureMachine, CaptureState, Command, Timer, TimerKind, Transition};
