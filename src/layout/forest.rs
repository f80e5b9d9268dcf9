use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::ir::{Edge, Graph};

use super::{BackEdge, Forest, NodeId, TreeNode};

struct FlatNode {
    step: usize,
    level: usize,
    parent: Option<usize>,
    via_edge: Option<usize>,
    children: Vec<usize>,
    back_edges: Vec<(usize, usize)>,
}

struct Pending {
    step: usize,
    level: usize,
    parent: Option<usize>,
    via_edge: Option<usize>,
}

/// Builds one tree per root step (a step no edge points at).
///
/// Children follow ascending edge priority, ties keep input order. A step
/// reached along several paths is instantiated once per path. An edge that
/// would re-enter a step already on the current path becomes a [`BackEdge`]
/// on the node it leaves, so cyclic input still yields a finite forest.
pub fn build_forest(graph: &Graph) -> Forest {
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (idx, step) in graph.steps.iter().enumerate() {
        if index.contains_key(step.id.as_str()) {
            warn!(step = %step.id, "duplicate step id, keeping the first occurrence");
            continue;
        }
        index.insert(step.id.as_str(), idx);
    }

    let has_incoming: HashSet<&str> = graph
        .edges
        .iter()
        .map(|edge| edge.to_step_id.as_str())
        .collect();

    let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut dropped_edges = 0;
    for (edge_idx, edge) in graph.edges.iter().enumerate() {
        let (Some(&from), Some(_)) = (
            index.get(edge.from_step_id.as_str()),
            index.get(edge.to_step_id.as_str()),
        ) else {
            dropped_edges += 1;
            continue;
        };
        adjacency.entry(from).or_default().push(edge_idx);
    }
    for outgoing in adjacency.values_mut() {
        // sort_by_key is stable, so equal priorities keep input order
        outgoing.sort_by_key(|edge_idx| graph.edges[*edge_idx].priority);
    }
    if dropped_edges > 0 {
        debug!(dropped_edges, "ignored edges with unknown endpoints");
    }

    let roots: Vec<usize> = graph
        .steps
        .iter()
        .enumerate()
        .filter(|(idx, step)| {
            index.get(step.id.as_str()) == Some(idx) && !has_incoming.contains(step.id.as_str())
        })
        .map(|(idx, _)| idx)
        .collect();

    let mut flat: Vec<FlatNode> = Vec::new();
    let mut stack: Vec<Pending> = roots
        .iter()
        .rev()
        .map(|&step| Pending {
            step,
            level: 0,
            parent: None,
            via_edge: None,
        })
        .collect();

    while let Some(pending) = stack.pop() {
        let current = flat.len();
        if let Some(parent) = pending.parent.and_then(|p| flat.get_mut(p)) {
            parent.children.push(current);
        }
        flat.push(FlatNode {
            step: pending.step,
            level: pending.level,
            parent: pending.parent,
            via_edge: pending.via_edge,
            children: Vec::new(),
            back_edges: Vec::new(),
        });

        let mut expand = Vec::new();
        let mut back_edges = Vec::new();
        for &edge_idx in adjacency.get(&pending.step).into_iter().flatten() {
            let Some(&dest) = index.get(graph.edges[edge_idx].to_step_id.as_str()) else {
                continue;
            };
            match ancestor_with_step(&flat, current, dest) {
                Some(target) => back_edges.push((edge_idx, target)),
                None => expand.push(Pending {
                    step: dest,
                    level: pending.level + 1,
                    parent: Some(current),
                    via_edge: Some(edge_idx),
                }),
            }
        }
        if !back_edges.is_empty() {
            warn!(
                step = %graph.steps[pending.step].id,
                count = back_edges.len(),
                "cycle detected, drawing back-edge instead of expanding"
            );
        }
        if let Some(node) = flat.get_mut(current) {
            node.back_edges = back_edges;
        }
        stack.extend(expand.into_iter().rev());
    }

    let roots = assemble(graph, flat);
    Forest {
        roots,
        dropped_edges,
    }
}

/// Finds the node on the path from `from` up to its root that wraps `step`.
fn ancestor_with_step(flat: &[FlatNode], from: usize, step: usize) -> Option<usize> {
    let mut cursor = Some(from);
    while let Some(idx) = cursor {
        let node = flat.get(idx)?;
        if node.step == step {
            return Some(idx);
        }
        cursor = node.parent;
    }
    None
}

// Children always carry a larger pre-order index than their parent, so
// building from the back leaves every child ready before its parent.
fn assemble(graph: &Graph, flat: Vec<FlatNode>) -> Vec<TreeNode> {
    let mut built: Vec<Option<TreeNode>> = vec![None; flat.len()];
    let mut root_ids = Vec::new();

    for (idx, node) in flat.iter().enumerate().rev() {
        let children: Vec<TreeNode> = node
            .children
            .iter()
            .filter_map(|child| built.get_mut(*child).and_then(Option::take))
            .collect();
        let edges: Vec<Edge> = node
            .children
            .iter()
            .filter_map(|child| flat.get(*child).and_then(|c| c.via_edge))
            .map(|edge_idx| graph.edges[edge_idx].clone())
            .collect();
        let back_edges = node
            .back_edges
            .iter()
            .map(|&(edge_idx, target)| BackEdge {
                edge: graph.edges[edge_idx].clone(),
                target: NodeId(target),
            })
            .collect();
        built[idx] = Some(TreeNode {
            id: NodeId(idx),
            step: graph.steps[node.step].clone(),
            level: node.level,
            children,
            edges,
            back_edges,
        });
        if node.parent.is_none() {
            root_ids.push(idx);
        }
    }

    root_ids.reverse();
    root_ids
        .into_iter()
        .filter_map(|idx| built.get_mut(idx).and_then(Option::take))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::StepType;

    fn chain() -> Graph {
        let mut graph = Graph::new();
        graph.push_step("A", StepType::Start, "Alpha");
        graph.push_step("B", StepType::Task, "Beta");
        graph.push_step("C", StepType::End, "Gamma");
        graph.connect("A", "B", 0, None);
        graph.connect("B", "C", 0, None);
        graph
    }

    fn ids(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.step.id.as_str()).collect()
    }

    #[test]
    fn linear_chain_has_single_root() {
        let forest = build_forest(&chain());
        assert_eq!(ids(&forest.roots), vec!["A"]);
        let b = &forest.roots[0].children[0];
        assert_eq!(b.step.id, "B");
        assert_eq!(ids(&b.children), vec!["C"]);
        assert!(b.children[0].children.is_empty());
    }

    #[test]
    fn children_follow_priority_then_input_order() {
        let mut graph = Graph::new();
        for id in ["A", "B", "C", "D", "E"] {
            graph.push_step(id, StepType::Task, id);
        }
        graph.connect("A", "B", 2, Some("late"));
        graph.connect("A", "C", 1, Some("early"));
        graph.connect("A", "D", 2, None);
        graph.connect("A", "E", 1, None);
        let forest = build_forest(&graph);
        let root = &forest.roots[0];
        assert_eq!(ids(&root.children), vec!["C", "E", "B", "D"]);
        let priorities: Vec<i64> = root.edges.iter().map(|edge| edge.priority).collect();
        assert_eq!(priorities, vec![1, 1, 2, 2]);
        assert_eq!(root.edges[0].label.as_deref(), Some("early"));
    }

    #[test]
    fn dangling_edges_are_dropped() {
        let mut graph = chain();
        graph.connect("B", "missing", 0, None);
        graph.connect("ghost", "C", 0, None);
        let forest = build_forest(&graph);
        assert_eq!(forest.dropped_edges, 2);
        assert_eq!(forest.node_count(), 3);
        let b = &forest.roots[0].children[0];
        assert_eq!(ids(&b.children), vec!["C"]);
    }

    #[test]
    fn levels_increase_by_one() {
        let forest = build_forest(&chain());
        forest.walk(|node, parent| match parent {
            Some(parent) => assert_eq!(node.level, parent.level + 1),
            None => assert_eq!(node.level, 0),
        });
    }

    #[test]
    fn node_ids_are_preorder() {
        let mut graph = Graph::new();
        for id in ["R", "X", "Y", "X1"] {
            graph.push_step(id, StepType::Task, id);
        }
        graph.connect("R", "X", 0, None);
        graph.connect("R", "Y", 1, None);
        graph.connect("X", "X1", 0, None);
        let forest = build_forest(&graph);
        let mut order = Vec::new();
        forest.walk(|node, _| order.push((node.id.0, node.step.id.clone())));
        assert_eq!(
            order,
            vec![
                (0, "R".to_string()),
                (1, "X".to_string()),
                (2, "X1".to_string()),
                (3, "Y".to_string()),
            ]
        );
    }

    #[test]
    fn shared_descendant_is_duplicated_per_path() {
        let mut graph = Graph::new();
        for id in ["D", "Y", "N", "Done"] {
            graph.push_step(id, StepType::Task, id);
        }
        graph.steps[0].step_type = StepType::Decision;
        graph.connect("D", "Y", 0, Some("yes"));
        graph.connect("D", "N", 1, Some("no"));
        graph.connect("Y", "Done", 0, None);
        graph.connect("N", "Done", 0, None);
        let forest = build_forest(&graph);
        assert_eq!(forest.node_count(), 5);
        let mut done_ids = Vec::new();
        forest.walk(|node, _| {
            if node.step.id == "Done" {
                done_ids.push(node.id);
            }
        });
        assert_eq!(done_ids.len(), 2);
        assert_ne!(done_ids[0], done_ids[1]);
    }

    #[test]
    fn cycle_under_shared_descendant_targets_own_path() {
        let mut graph = Graph::new();
        for id in ["S", "A", "B", "X", "Y"] {
            graph.push_step(id, StepType::Task, id);
        }
        graph.connect("S", "A", 0, None);
        graph.connect("S", "B", 1, None);
        graph.connect("A", "X", 0, None);
        graph.connect("B", "X", 0, None);
        graph.connect("X", "Y", 0, None);
        graph.connect("Y", "X", 0, Some("loop"));
        let forest = build_forest(&graph);
        assert_eq!(forest.node_count(), 7);

        let mut x_ids = Vec::new();
        let mut back = Vec::new();
        forest.walk(|node, parent| {
            if node.step.id == "X" {
                x_ids.push(node.id);
            }
            for edge in &node.back_edges {
                back.push((parent.map(|p| p.id), edge.target));
            }
        });
        assert_eq!(x_ids, vec![NodeId(2), NodeId(5)]);
        // each Y loops back to the X directly above it, not the first X
        assert_eq!(
            back,
            vec![(Some(NodeId(2)), NodeId(2)), (Some(NodeId(5)), NodeId(5))]
        );
    }

    #[test]
    fn cycle_becomes_back_edge() {
        let mut graph = Graph::new();
        for id in ["S", "Check", "Fix"] {
            graph.push_step(id, StepType::Task, id);
        }
        graph.connect("S", "Check", 0, None);
        graph.connect("Check", "Fix", 0, Some("fail"));
        graph.connect("Fix", "Check", 0, Some("retry"));
        let forest = build_forest(&graph);
        assert_eq!(forest.node_count(), 3);
        let fix = &forest.roots[0].children[0].children[0];
        assert_eq!(fix.step.id, "Fix");
        assert!(fix.children.is_empty());
        assert_eq!(fix.back_edges.len(), 1);
        assert_eq!(fix.back_edges[0].target, NodeId(1));
        assert_eq!(fix.back_edges[0].edge.label.as_deref(), Some("retry"));
    }

    #[test]
    fn pure_cycle_yields_empty_forest() {
        let mut graph = Graph::new();
        graph.push_step("A", StepType::Task, "A");
        graph.push_step("B", StepType::Task, "B");
        graph.connect("A", "B", 0, None);
        graph.connect("B", "A", 0, None);
        assert!(build_forest(&graph).is_empty());
    }

    #[test]
    fn self_loop_is_cut() {
        let mut graph = Graph::new();
        graph.push_step("A", StepType::Task, "A");
        graph.push_step("B", StepType::Task, "B");
        graph.connect("A", "B", 0, None);
        graph.connect("B", "B", 0, Some("again"));
        let forest = build_forest(&graph);
        let b = &forest.roots[0].children[0];
        assert!(b.children.is_empty());
        assert_eq!(b.back_edges[0].target, b.id);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let mut graph = Graph::new();
        let count = 5_000;
        for idx in 0..count {
            graph.push_step(&format!("s{idx}"), StepType::Task, "step");
        }
        for idx in 1..count {
            graph.connect(&format!("s{}", idx - 1), &format!("s{idx}"), 0, None);
        }
        let forest = build_forest(&graph);
        assert_eq!(forest.max_level(), Some(count - 1));
    }

    #[test]
    fn empty_graph_is_noop() {
        let forest = build_forest(&Graph::new());
        assert!(forest.is_empty());
        assert_eq!(forest.node_count(), 0);
    }
}
