//! Outcome -> replay path lookup.

use thiserror::Error;

use crate::core::graph::{GraphModel, PathDefinition, decision_graph, validate_graph};
use crate::core::trace::PathId;

/// The graph failed its structural or coverage invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decision graph invariants failed:\n- {}", .violations.join("\n- "))]
pub struct GraphError {
    pub violations: Vec<String>,
}

/// Total lookup from [`PathId`] to its [`PathDefinition`].
///
/// Construction validates the graph, so a sequencer that exists covers every
/// outcome the evaluator can produce.
#[derive(Debug, Clone)]
pub struct PathSequencer {
    graph: GraphModel,
}

impl PathSequencer {
    pub fn new(graph: GraphModel) -> Result<Self, GraphError> {
        let violations = validate_graph(&graph);
        if !violations.is_empty() {
            return Err(GraphError { violations });
        }
        Ok(Self { graph })
    }

    /// Sequencer over the built-in [`decision_graph`].
    pub fn standard() -> Result<Self, GraphError> {
        Self::new(decision_graph())
    }

    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    pub fn sequence_for(&self, path: PathId) -> &PathDefinition {
        match self.graph.paths.get(&path) {
            Some(definition) => definition,
            None => unreachable!("coverage checked at construction; no path for '{path}'"),
        }
    }
}
