//! Decision-trace simulator for derivative market-value factors.
//!
//! An input row is evaluated against a small branching rule, producing an
//! ordered, auditable trace. The trace's outcome selects a path through a
//! static decision graph, which is then replayed one item per tick. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (input gate, evaluator, graph,
//!   replay state machine). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, input files, scaffolding).
//!
//! Orchestration modules ([`scheduler`], [`session`], [`render`]) own the
//! replay timer, the editable session state, and the command output.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod render;
pub mod scheduler;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
