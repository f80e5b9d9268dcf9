use std::collections::BTreeMap;

use serde::Serialize;

use crate::ir::{Edge, Step};

/// Pre-order index of a tree node across the whole forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// An edge that would have re-entered a step already on the current
/// root-to-node path. Kept on the node it leaves instead of being expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct BackEdge {
    pub edge: Edge,
    /// The ancestor tree node the edge points back to.
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub step: Step,
    pub level: usize,
    /// Ordered by ascending edge priority; `edges[i]` reaches `children[i]`.
    pub children: Vec<TreeNode>,
    pub edges: Vec<Edge>,
    pub back_edges: Vec<BackEdge>,
}

impl TreeNode {
    /// Visits this node and its descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode, Option<&'a TreeNode>)) {
        let mut stack: Vec<(&TreeNode, Option<&TreeNode>)> = vec![(self, None)];
        while let Some((node, parent)) = stack.pop() {
            visit(node, parent);
            for child in node.children.iter().rev() {
                stack.push((child, Some(node)));
            }
        }
    }

    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    /// Edges dropped because an endpoint did not resolve to a known step.
    pub dropped_edges: usize,
}

impl Forest {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&'a TreeNode, Option<&'a TreeNode>)) {
        for root in &self.roots {
            root.walk(&mut visit);
        }
    }

    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TreeNode::subtree_len).sum()
    }

    pub fn max_level(&self) -> Option<usize> {
        let mut max = None;
        self.walk(|node, _| max = max.max(Some(node.level)));
        max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub level: usize,
}

pub type Positions = BTreeMap<NodeId, Position>;

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub id: NodeId,
    pub step_id: String,
    pub step_type: crate::ir::StepType,
    pub position: Position,
    pub width: f32,
    pub height: f32,
    pub label: TextBlock,
}

/// Extent of all node boxes in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub forest: Forest,
    pub positions: Positions,
    pub nodes: BTreeMap<NodeId, NodeLayout>,
    pub bounds: Bounds,
    /// Translation that keeps every box on the canvas. Display-only; the
    /// stored positions are not shifted.
    pub origin: (f32, f32),
    /// Canvas size at zoom 1.0.
    pub width: f32,
    pub height: f32,
}

impl Layout {
    pub fn position(&self, id: NodeId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }

    pub fn has_back_edges(&self) -> bool {
        let mut found = false;
        self.forest
            .walk(|node, _| found |= !node.back_edges.is_empty());
        found
    }
}
