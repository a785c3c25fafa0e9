//! The dependency graph of a resolve, used to explain why a module is part
//! of a build.

use std::collections::HashMap;

use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::resolver::closure::{is_marker, CORE, EXPLICIT};
use crate::resolver::stdlib::ResolvedModuleSet;
use crate::resolver::toolkit::ResolvedToolkitSet;

/// Why a module is included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The application imports it.
    Explicit,
    /// It is always included.
    Core,
}

/// A module dependency graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// Build a graph from the edges recorded during a resolve.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let root = graph.add_node(String::new());

        let mut node = |graph: &mut DiGraph<String, ()>, name: &str| {
            *nodes
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()))
        };

        for (from, to) in edges {
            let from_node = node(&mut graph, from);
            let to_node = node(&mut graph, to);
            if !graph.contains_edge(from_node, to_node) {
                graph.add_edge(from_node, to_node, ());
            }
        }

        for marker in [EXPLICIT, CORE] {
            if let Some(&marker_node) = nodes.get(marker) {
                graph.add_edge(root, marker_node, ());
            }
        }

        DependencyGraph { graph, nodes, root }
    }

    pub fn for_modules(resolved: &ResolvedModuleSet) -> Self {
        Self::from_edges(&resolved.edges)
    }

    pub fn for_toolkit(resolved: &ResolvedToolkitSet) -> Self {
        Self::from_edges(&resolved.edges)
    }

    pub fn contains(&self, name: &str) -> bool {
        !is_marker(name) && self.nodes.contains_key(name)
    }

    /// The shortest chain of modules from a seed to `name`, and why the seed
    /// was included.
    pub fn why(&self, name: &str) -> Option<(Reason, Vec<String>)> {
        if is_marker(name) {
            return None;
        }
        let target = *self.nodes.get(name)?;

        let (_, path) = astar(&self.graph, self.root, |n| n == target, |_| 1u32, |_| 0)?;

        // root, marker, seed, ..., target
        let reason = match self.graph[*path.get(1)?].as_str() {
            EXPLICIT => Reason::Explicit,
            _ => Reason::Core,
        };
        let chain = path[2..].iter().map(|&n| self.graph[n].clone()).collect();

        Some((reason, chain))
    }

    /// The modules that directly require `name`, sorted.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Incoming)
    }

    /// The modules `name` directly requires, sorted.
    pub fn dependencies(&self, name: &str) -> Vec<String> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };

        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|n| self.graph[n].clone())
            .filter(|n| !n.is_empty() && !is_marker(n))
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
