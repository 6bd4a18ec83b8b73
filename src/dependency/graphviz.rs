//! Debug visualization of a footprint's behavior list as a GraphViz dot graph: one node per
//! behavior, one edge per def-use pair it shares with a later behavior. Dead behaviors (as
//! determined by [`super::DependencyMachine::compute_liveness`]) are drawn in a different fill
//! color so a trace author can see at a glance what the analysis discarded.

use std::collections::HashMap;

use anyhow::Result;
use petgraph::dot::Dot;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::prelude::EdgeRef;
use petgraph::Graph;

use super::{Behavior, Variable};

/// One node of the visualization graph: a behavior plus whether the liveness pass kept it.
pub struct BehaviorNode {
    pub index: usize,
    pub label: String,
    pub alive: bool,
}

impl std::fmt::Display for BehaviorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {}", self.index, self.label)
    }
}

type DepGraph = Graph<BehaviorNode, Variable>;

/// Build the dependency graph for a behavior list already tagged with liveness results.
///
/// An edge `i -> j` (`i < j`) is added for every variable that behavior `i` defines and behavior
/// `j` is the *next* behavior to use, mirroring the dependency the backward liveness scan itself
/// walks.
pub fn build_graph(behaviors: &[Behavior], alive: &[bool]) -> DepGraph {
    let mut graph = DepGraph::new();
    let mut nodes = Vec::with_capacity(behaviors.len());
    for (i, behavior) in behaviors.iter().enumerate() {
        let node = graph.add_node(BehaviorNode {
            index: i,
            label: format!("{} {}", behavior.source, if behavior.aborted { "(aborted)" } else { "" }),
            alive: alive.get(i).copied().unwrap_or(false),
        });
        nodes.push(node);
    }

    // For each variable, remember the last behavior that defined it as we scan forward; wire an
    // edge from that definer to whichever later behavior next uses it.
    let mut last_def: HashMap<Variable, usize> = HashMap::new();
    for (i, behavior) in behaviors.iter().enumerate() {
        for read in behavior.uses() {
            if let Some(&def_idx) = last_def.get(read) {
                graph.add_edge(nodes[def_idx], nodes[i], *read);
            }
        }
        for def in behavior.defs() {
            last_def.insert(*def, i);
        }
    }

    graph
}

fn get_edge_attributes(_: &DepGraph, _: EdgeReference<Variable>) -> String {
    String::from("")
}

fn get_node_attributes(_: &DepGraph, node: (NodeIndex, &BehaviorNode)) -> String {
    if node.1.alive {
        String::from("fillcolor = \"#5e6df7\"")
    } else {
        String::from("fillcolor = \"#888888\" style=dashed")
    }
}

/// Export a behavior list's dependency graph, already tagged with liveness, to GraphViz dot.
pub fn dot(behaviors: &[Behavior], alive: &[bool]) -> Result<String> {
    let graph = build_graph(behaviors, alive);
    Ok(format!(
        "{}",
        Dot::with_attr_getters(&graph, &[], &get_edge_attributes, &get_node_attributes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{DependencyMachine, SubCmdIdx};
    use crate::resource_model::Handle;

    #[test]
    fn dot_export_contains_one_node_per_behavior() {
        let behaviors = vec![
            Behavior::new(SubCmdIdx::default()).writing([Variable::Handle(Handle::from(1))]),
            Behavior::new(SubCmdIdx::default()).reading([Variable::Handle(Handle::from(1))]),
        ];
        let alive = DependencyMachine::compute_liveness(&behaviors);
        let out = dot(&behaviors, &alive).unwrap();
        assert!(out.contains("digraph"));
    }
}
