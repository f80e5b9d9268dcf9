use crate::layout::{Layout, NodeId};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub origin: [f32; 2],
    pub roots: Vec<NodeId>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub dropped_edges: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub node_id: NodeId,
    pub step_id: String,
    pub step_type: String,
    pub name: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub parent: Option<NodeId>,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDump {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<String>,
    pub priority: i64,
    pub back_edge: bool,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        layout.forest.walk(|node, parent| {
            if let Some(placed) = layout.nodes.get(&node.id) {
                nodes.push(NodeDump {
                    node_id: node.id,
                    step_id: node.step.id.clone(),
                    step_type: node.step.step_type.as_str().to_string(),
                    name: node.step.name.clone(),
                    level: placed.position.level,
                    x: placed.position.x,
                    y: placed.position.y,
                    width: placed.width,
                    height: placed.height,
                    parent: parent.map(|p| p.id),
                    label_lines: placed.label.lines.clone(),
                });
            }
            for (child, edge) in node.children.iter().zip(&node.edges) {
                edges.push(EdgeDump {
                    from: node.id,
                    to: child.id,
                    label: edge.label.clone(),
                    priority: edge.priority,
                    back_edge: false,
                });
            }
            for back in &node.back_edges {
                edges.push(EdgeDump {
                    from: node.id,
                    to: back.target,
                    label: back.edge.label.clone(),
                    priority: back.edge.priority,
                    back_edge: true,
                });
            }
        });

        LayoutDump {
            width: layout.width,
            height: layout.height,
            origin: [layout.origin.0, layout.origin.1],
            roots: layout.forest.roots.iter().map(|root| root.id).collect(),
            nodes,
            edges,
            dropped_edges: layout.forest.dropped_edges,
        }
    }
}

pub fn layout_json(layout: &Layout) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&LayoutDump::from_layout(layout))?)
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{Graph, StepType};
    use crate::layout::compute_layout;
    use crate::theme::Theme;

    #[test]
    fn dump_lists_nodes_parents_and_edges() {
        let mut graph = Graph::new();
        graph.push_step("a", StepType::Start, "Begin");
        graph.push_step("b", StepType::Task, "Work");
        graph.connect("a", "b", 3, Some("next"));
        graph.connect("b", "a", 0, Some("again"));
        graph.push_step("root", StepType::Start, "Entry");
        graph.connect("root", "a", 0, None);

        let layout = compute_layout(&graph, &Theme::modern(), &LayoutConfig::default());
        let dump = LayoutDump::from_layout(&layout);
        assert_eq!(dump.roots, vec![NodeId(0)]);
        assert_eq!(dump.nodes.len(), 3);
        assert_eq!(dump.nodes[0].step_id, "root");
        assert_eq!(dump.nodes[1].parent, Some(NodeId(0)));
        assert_eq!(dump.nodes[2].level, 2);
        assert_eq!(dump.edges.len(), 3);
        assert!(dump.edges.iter().any(|edge| edge.back_edge && edge.to == NodeId(1)));

        let json = layout_json(&layout).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"][1]["stepId"], "a");
        assert_eq!(value["nodes"][0]["nodeId"], 0);
        assert_eq!(value["edges"][1]["label"], "next");
    }
}
