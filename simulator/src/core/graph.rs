//! Static decision graph and the per-outcome replay paths.
//!
//! A path is a walk through the graph written as interleaved ids:
//! `node, edge, node, ..., node`. The replay animates exactly this order.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::core::trace::PathId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Decision,
    Action,
    Terminal,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Ordered node/edge ids visited by one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathDefinition {
    ids: Vec<String>,
}

impl PathDefinition {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub paths: BTreeMap<PathId, PathDefinition>,
}

impl GraphModel {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some() || self.edge(id).is_some()
    }

    /// Split a path into the node ids and edge ids it lights up.
    pub fn partition<'a>(&self, path: &'a PathDefinition) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for id in path.ids() {
            if self.node(id).is_some() {
                nodes.push(id.as_str());
            } else if self.edge(id).is_some() {
                edges.push(id.as_str());
            }
        }
        (nodes, edges)
    }
}

fn node(id: &str, label: &str, kind: NodeKind) -> GraphNode {
    GraphNode {
        id: id.to_string(),
        label: label.to_string(),
        kind,
    }
}

fn edge(id: &str, from: &str, to: &str, condition: Option<&str>) -> GraphEdge {
    GraphEdge {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        condition: condition.map(str::to_string),
    }
}

/// The decision graph for the derivative market-value factor.
pub fn decision_graph() -> GraphModel {
    let nodes = vec![
        node("start", "Message received", NodeKind::Action),
        node("checkType", "secType in {FUT, OPT}?", NodeKind::Decision),
        node("checkQty", "Hold/trade quantity ≠ 0?", NodeKind::Decision),
        node("branch", "PR#10007 netting mode", NodeKind::Decision),
        node("skipType", "Ignore", NodeKind::Skip),
        node("skipQty", "Ignore", NodeKind::Skip),
        node("noNet1", "Sum quantities directly", NodeKind::Action),
        node("net1", "Sign by direction (short negated)", NodeKind::Action),
        node("noNet2", "× contract multiplier", NodeKind::Action),
        node("net2", "× contract multiplier", NodeKind::Action),
        node("noNet3", "GROUP -> SUM", NodeKind::Action),
        node("net3", "GROUP -> SUM", NodeKind::Action),
        node("output", "× latest price -> market value", NodeKind::Terminal),
    ];

    let edges = vec![
        edge("e1", "start", "checkType", None),
        edge("e2", "checkType", "checkQty", Some("yes")),
        edge("e3", "checkQty", "branch", Some("yes")),
        edge("e-bl", "branch", "noNet1", Some("no netting (2)")),
        edge("e-br", "branch", "net1", Some("netting (3)")),
        edge("e-l1", "noNet1", "noNet2", None),
        edge("e-r1", "net1", "net2", None),
        edge("e-l2", "noNet2", "noNet3", None),
        edge("e-r2", "net2", "net3", None),
        edge("e-ml", "noNet3", "output", None),
        edge("e-mr", "net3", "output", None),
        edge("e-skip1", "checkType", "skipType", Some("no")),
        edge("e-skip2", "checkQty", "skipQty", Some("no")),
    ];

    let mut paths = BTreeMap::new();
    paths.insert(
        PathId::SkipType,
        PathDefinition::new(["start", "e1", "checkType", "e-skip1", "skipType"]),
    );
    paths.insert(
        PathId::SkipQty,
        PathDefinition::new([
            "start", "e1", "checkType", "e2", "checkQty", "e-skip2", "skipQty",
        ]),
    );
    paths.insert(
        PathId::NoNetting,
        PathDefinition::new([
            "start", "e1", "checkType", "e2", "checkQty", "e3", "branch", "e-bl", "noNet1",
            "e-l1", "noNet2", "e-l2", "noNet3", "e-ml", "output",
        ]),
    );
    paths.insert(
        PathId::Netting,
        PathDefinition::new([
            "start", "e1", "checkType", "e2", "checkQty", "e3", "branch", "e-br", "net1", "e-r1",
            "net2", "e-r2", "net3", "e-mr", "output",
        ]),
    );

    GraphModel {
        nodes,
        edges,
        paths,
    }
}

/// Check structural invariants of a graph and its paths:
/// - node and edge ids are unique across the whole graph
/// - every edge connects existing nodes
/// - every outcome has a path (coverage)
/// - every path is a non-empty walk `node, edge, node, ...` over existing ids,
///   visits no id twice, and ends at a terminal or skip node
pub fn validate_graph(graph: &GraphModel) -> Vec<String> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for id in graph
        .nodes
        .iter()
        .map(|node| &node.id)
        .chain(graph.edges.iter().map(|edge| &edge.id))
    {
        if !seen.insert(id.as_str()) {
            errors.push(format!("duplicate id '{id}'"));
        }
    }

    let nodes: HashMap<&str, &GraphNode> = graph
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();
    let edges: HashMap<&str, &GraphEdge> = graph
        .edges
        .iter()
        .map(|edge| (edge.id.as_str(), edge))
        .collect();

    for edge in &graph.edges {
        for endpoint in [&edge.from, &edge.to] {
            if !nodes.contains_key(endpoint.as_str()) {
                errors.push(format!(
                    "edge '{}' references unknown node '{}'",
                    edge.id, endpoint
                ));
            }
        }
    }

    for path_id in PathId::ALL {
        if !graph.paths.contains_key(&path_id) {
            errors.push(format!("{path_id}: no path defined"));
        }
    }

    for (path_id, path) in &graph.paths {
        validate_path(*path_id, path, &nodes, &edges, &mut errors);
    }

    errors
}

fn validate_path(
    path_id: PathId,
    path: &PathDefinition,
    nodes: &HashMap<&str, &GraphNode>,
    edges: &HashMap<&str, &GraphEdge>,
    errors: &mut Vec<String>,
) {
    if path.is_empty() {
        errors.push(format!("{path_id}: path is empty"));
        return;
    }

    let mut visited = HashSet::new();
    for id in path.ids() {
        if !visited.insert(id.as_str()) {
            errors.push(format!("{path_id}: id '{id}' visited twice"));
        }
        if !nodes.contains_key(id.as_str()) && !edges.contains_key(id.as_str()) {
            errors.push(format!("{path_id}: unknown id '{id}'"));
        }
    }

    for (position, id) in path.ids().iter().enumerate() {
        let expect_node = position % 2 == 0;
        let is_node = nodes.contains_key(id.as_str());
        let is_edge = edges.contains_key(id.as_str());
        if expect_node && is_edge {
            errors.push(format!(
                "{path_id}: expected a node at position {position}, found edge '{id}'"
            ));
        }
        if !expect_node && is_node {
            errors.push(format!(
                "{path_id}: expected an edge at position {position}, found node '{id}'"
            ));
        }
    }

    for window in path.ids().windows(3).step_by(2) {
        let (from, via, to) = (&window[0], &window[1], &window[2]);
        if let Some(edge) = edges.get(via.as_str()) {
            if edge.from != *from || edge.to != *to {
                errors.push(format!(
                    "{path_id}: edge '{via}' does not connect '{from}' to '{to}'"
                ));
            }
        }
    }

    let last = &path.ids()[path.len() - 1];
    match nodes.get(last.as_str()) {
        Some(node) if matches!(node.kind, NodeKind::Terminal | NodeKind::Skip) => {}
        Some(node) => errors.push(format!(
            "{path_id}: path ends at non-terminal node '{}'",
            node.id
        )),
        None => errors.push(format!("{path_id}: path must end at a node")),
    }
}
