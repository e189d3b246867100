//! Text and JSON renderings of traces, graphs, and replay frames.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::animation::Frame;
use crate::core::graph::{GraphModel, PathDefinition};
use crate::core::presets::Expectation;
use crate::core::sequencer::PathSequencer;
use crate::core::trace::{PathId, TraceResult};

const TRACE_TEMPLATE: &str = include_str!("templates/trace_report.txt");
const GRAPH_TEMPLATE: &str = include_str!("templates/graph.txt");

#[derive(Debug, Clone, Serialize)]
struct StepContext<'a> {
    name: &'a str,
    expression: &'a str,
    passed: bool,
}

#[derive(Debug, Clone, Serialize)]
struct PathContext<'a> {
    outcome: PathId,
    ids: &'a [String],
}

/// Template engine wrapper around minijinja.
struct ReportEngine {
    env: Environment<'static>,
}

impl ReportEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("trace", TRACE_TEMPLATE)
            .expect("trace template should be valid");
        env.add_template("graph", GRAPH_TEMPLATE)
            .expect("graph template should be valid");
        Self { env }
    }

    fn render_trace(
        &self,
        trace: &TraceResult,
        graph: &GraphModel,
        path: &PathDefinition,
        expectation: Option<&Expectation>,
    ) -> Result<String> {
        let steps: Vec<StepContext<'_>> = trace
            .steps()
            .iter()
            .map(|step| StepContext {
                name: &step.name,
                expression: &step.expression,
                passed: step.passed,
            })
            .collect();
        let (nodes, edges) = graph.partition(path);
        let template = self.env.get_template("trace")?;
        let rendered = template.render(context! {
            outcome => trace.path(),
            steps => steps,
            result => trace.result().map(|value| value.to_string()),
            error => trace.error(),
            expectation => expectation.map(describe_expectation),
            path => path.ids(),
            nodes => nodes,
            edges => edges,
        })?;
        Ok(rendered)
    }

    fn render_graph(&self, graph: &GraphModel) -> Result<String> {
        let paths: Vec<PathContext<'_>> = graph
            .paths
            .iter()
            .map(|(outcome, path)| PathContext {
                outcome: *outcome,
                ids: path.ids(),
            })
            .collect();
        let template = self.env.get_template("graph")?;
        let rendered = template.render(context! {
            nodes => &graph.nodes,
            edges => &graph.edges,
            paths => paths,
        })?;
        Ok(rendered)
    }
}

fn describe_expectation(expectation: &Expectation) -> String {
    match expectation {
        Expectation::Match { expected } => format!("{expected} (match)"),
        Expectation::Mismatch {
            expected,
            actual,
            difference,
        } => format!("{expected} (mismatch: actual {actual}, difference {difference})"),
        Expectation::NoResult { error } => format!("n/a (no result: {error})"),
    }
}

/// Human-readable trace report.
pub fn render_trace(
    trace: &TraceResult,
    sequencer: &PathSequencer,
    expectation: Option<&Expectation>,
) -> Result<String> {
    let path = sequencer.sequence_for(trace.path());
    ReportEngine::new()
        .render_trace(trace, sequencer.graph(), path, expectation)
        .context("render trace report")
}

/// Human-readable listing of the graph and its paths.
pub fn render_graph(graph: &GraphModel) -> Result<String> {
    ReportEngine::new()
        .render_graph(graph)
        .context("render graph")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    trace: &'a TraceResult,
    path: &'a PathDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    expectation: Option<&'a Expectation>,
}

/// Machine-readable trace report (pretty JSON, trailing newline).
pub fn render_trace_json(
    trace: &TraceResult,
    sequencer: &PathSequencer,
    expectation: Option<&Expectation>,
) -> Result<String> {
    let report = JsonReport {
        trace,
        path: sequencer.sequence_for(trace.path()),
        expectation,
    };
    let mut buf = serde_json::to_string_pretty(&report).context("serialize trace json")?;
    buf.push('\n');
    Ok(buf)
}

/// One replay line: position, current id, and the activated set.
pub fn render_frame(index: usize, total: usize, frame: &Frame) -> String {
    let position = match &frame.current {
        Some(current) => format!("[{index:>2}/{total}] {current:<10}"),
        None => format!("[done {total}] {:<10}", ""),
    };
    format!("{position} activated: {}", frame.activated.join(", "))
}
