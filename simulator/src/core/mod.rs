//! Deterministic, pure logic of the simulator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod animation;
pub mod evaluator;
pub mod graph;
pub mod input;
pub mod presets;
pub mod sequencer;
pub mod trace;
