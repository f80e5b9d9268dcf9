use std::collections::BTreeMap;

use tracing::debug;

use crate::config::LayoutConfig;
use crate::ir::StepType;

use super::{Forest, Position, Positions, TreeNode};

/// Assigns a position to every node of the forest.
///
/// Rows are uniform: `y = level * level_spacing + top_margin`. Roots sit on
/// `root_x`; every other node takes the x its parent proposed, except a
/// decision with several children, which is shifted by its rank within the
/// level. A parent with several children proposes a symmetric spread of
/// `sibling_spacing` around its own x, a parent with one child proposes its
/// own x. Nothing is placed left of `min_x`.
pub fn assign_positions(forest: &Forest, config: &LayoutConfig) -> Positions {
    let level_counts = count_levels(forest);
    let mut placed: BTreeMap<usize, usize> = BTreeMap::new();
    let mut positions = Positions::new();

    for (root_idx, root) in forest.roots.iter().enumerate() {
        let anchor = config.root_x + root_idx as f32 * config.root_stride;
        let mut stack: Vec<(&TreeNode, f32)> = vec![(root, anchor)];
        while let Some((node, proposed)) = stack.pop() {
            let x = place_x(node, proposed, &level_counts, &placed, config);
            let y = node.level as f32 * config.level_spacing + config.top_margin;
            *placed.entry(node.level).or_insert(0) += 1;
            positions.insert(
                node.id,
                Position {
                    x,
                    y,
                    level: node.level,
                },
            );

            let count = node.children.len();
            for (idx, child) in node.children.iter().enumerate().rev() {
                stack.push((child, child_x(x, idx, count, config)));
            }
        }
    }

    debug!(
        nodes = positions.len(),
        levels = level_counts.len(),
        "assigned positions"
    );
    positions
}

fn count_levels(forest: &Forest) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    forest.walk(|node, _| *counts.entry(node.level).or_insert(0) += 1);
    counts
}

fn place_x(
    node: &TreeNode,
    proposed: f32,
    level_counts: &BTreeMap<usize, usize>,
    placed: &BTreeMap<usize, usize>,
    config: &LayoutConfig,
) -> f32 {
    let x = if node.level == 0 {
        proposed
    } else if node.step.step_type == StepType::Decision && node.children.len() > 1 {
        let total = level_counts.get(&node.level).copied().unwrap_or(1) as f32;
        let rank = placed.get(&node.level).copied().unwrap_or(0) as f32;
        proposed + (rank - (total - 1.0) / 2.0) * config.decision_spread
    } else {
        proposed
    };
    x.max(config.min_x)
}

fn child_x(parent_x: f32, idx: usize, count: usize, config: &LayoutConfig) -> f32 {
    if count > 1 {
        parent_x + (idx as f32 - (count as f32 - 1.0) / 2.0) * config.sibling_spacing
    } else {
        parent_x
    }
}

/// Scales stored positions for display. Stored values are left untouched.
pub fn scaled(position: &Position, zoom: f32) -> (f32, f32) {
    (position.x * zoom, position.y * zoom)
}
