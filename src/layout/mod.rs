mod forest;
mod position;
mod text;
pub(crate) mod types;
pub use forest::build_forest;
pub use position::{assign_positions, scaled};
pub use types::*;

use crate::config::LayoutConfig;
use crate::ir::{Graph, StepType};
use crate::theme::Theme;
use std::collections::BTreeMap;
use tracing::debug;

const CANVAS_MARGIN: f32 = 20.0;

/// Builds the forest for `graph`, positions it, and sizes each node box.
///
/// Positions are node centres in layout units. Boxes can reach left of
/// `min_x` by half their width, so the layout also carries a display origin
/// that moves the whole drawing onto the canvas.
pub fn compute_layout(graph: &Graph, theme: &Theme, config: &LayoutConfig) -> Layout {
    let forest = build_forest(graph);
    let positions = assign_positions(&forest, config);

    let mut nodes = BTreeMap::new();
    let mut bounds: Option<Bounds> = None;
    forest.walk(|node, _| {
        let Some(position) = positions.get(&node.id) else {
            return;
        };
        let label = text::measure_label(node.step.display_name(), theme, config);
        let (width, height) = node_size(node.step.step_type, &label, config);
        let left = position.x - width / 2.0;
        let top = position.y - height / 2.0;
        let right = position.x + width / 2.0;
        let bottom = position.y + height / 2.0;
        bounds = Some(match bounds {
            None => Bounds {
                min_x: left,
                min_y: top,
                max_x: right,
                max_y: bottom,
            },
            Some(b) => Bounds {
                min_x: b.min_x.min(left),
                min_y: b.min_y.min(top),
                max_x: b.max_x.max(right),
                max_y: b.max_y.max(bottom),
            },
        });
        nodes.insert(
            node.id,
            NodeLayout {
                id: node.id,
                step_id: node.step.id.clone(),
                step_type: node.step.step_type,
                position: *position,
                width,
                height,
                label,
            },
        );
    });

    let bounds = bounds.unwrap_or_default();
    let origin = (
        (CANVAS_MARGIN - bounds.min_x).max(0.0),
        (CANVAS_MARGIN - bounds.min_y).max(0.0),
    );

    debug!(
        roots = forest.roots.len(),
        nodes = nodes.len(),
        dropped_edges = forest.dropped_edges,
        "computed process layout"
    );

    Layout {
        forest,
        positions,
        nodes,
        bounds,
        origin,
        width: bounds.max_x + origin.0 + CANVAS_MARGIN,
        height: bounds.max_y + origin.1 + CANVAS_MARGIN,
    }
}

/// Measures an edge label with the same wrapping rules as node labels.
pub fn measure_edge_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    text::measure_label(text, theme, config)
}

fn node_size(step_type: StepType, label: &TextBlock, config: &LayoutConfig) -> (f32, f32) {
    let width = (label.width + config.node_padding_x * 2.0).max(config.node_width);
    let height = (label.height + config.node_padding_y * 2.0).max(config.node_height);
    match step_type {
        // diamonds need room for the label inside the inscribed rectangle
        StepType::Decision => (width * 1.3, height * 1.4),
        StepType::Start | StepType::End | StepType::Task => (width, height),
    }
}
