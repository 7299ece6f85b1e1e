//! Stable topological ordering of named entities.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// A dependency graph whose ordering breaks ties by insertion order.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: IndexMap<String, NodeIndex>,
}

/// The result of ordering a [`DependencyGraph`].
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Ordering {
    /// Every node, dependencies first.
    pub order: Vec<String>,
    /// Cycle members emitted while a dependency inside their cycle was
    /// still pending.
    pub forced: Vec<String>,
}

impl Ordering {
    /// Position of `name` in the order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }
}

impl DependencyGraph {
    /// Creates a graph over `names`; their order is the tie-break order.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut graph = Self::default();
        for name in names {
            if !graph.nodes.contains_key(name) {
                let index = graph.graph.add_node(name.to_string());
                graph.nodes.insert(name.to_string(), index);
            }
        }
        graph
    }

    /// Records that `dependent` must come after `dependency`. Unknown names
    /// and self references are ignored.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        if dependent == dependency {
            return;
        }
        if let (Some(&from), Some(&to)) = (self.nodes.get(dependency), self.nodes.get(dependent)) {
            // Edge goes from dependency to dependent.
            self.graph.update_edge(from, to, ());
        }
    }

    /// Orders nodes dependencies first. When nothing is ready, the earliest
    /// inserted member of a cycle that waits on nothing outside itself is
    /// emitted and reported as forced.
    pub fn order(&self) -> Ordering {
        let count = self.graph.node_count();
        let mut component = vec![0usize; count];
        for (id, members) in tarjan_scc(&self.graph).into_iter().enumerate() {
            for node in members {
                component[node.index()] = id;
            }
        }
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .count()
            })
            .collect();
        let mut emitted = vec![false; count];
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut ordering = Ordering::default();
        while ordering.order.len() < count {
            let next = match ready.pop() {
                Some(Reverse(i)) if emitted[i] => continue,
                Some(Reverse(i)) => i,
                None => {
                    let Some(i) = self.cycle_entry(&emitted, &component) else {
                        break;
                    };
                    ordering.forced.push(self.graph[NodeIndex::new(i)].clone());
                    i
                }
            };

            emitted[next] = true;
            let node = NodeIndex::new(next);
            ordering.order.push(self.graph[node].clone());
            for neighbor in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let i = neighbor.index();
                in_degree[i] = in_degree[i].saturating_sub(1);
                if in_degree[i] == 0 && !emitted[i] {
                    ready.push(Reverse(i));
                }
            }
        }
        ordering
    }

    /// Earliest pending node whose cycle has no pending dependency outside
    /// the cycle.
    fn cycle_entry(&self, emitted: &[bool], component: &[usize]) -> Option<usize> {
        let blocked: Vec<usize> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .filter(|(from, to)| {
                !emitted[from.index()] && component[from.index()] != component[to.index()]
            })
            .map(|(_, to)| component[to.index()])
            .collect();
        (0..emitted.len())
            .find(|&i| !emitted[i] && !blocked.contains(&component[i]))
            .or_else(|| emitted.iter().position(|done| !done))
    }
}
