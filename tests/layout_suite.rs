use std::path::Path;

use process_tree_layout::{
    Graph, Layout, LayoutConfig, NodeId, RenderConfig, Theme, ViewState, compute_layout,
    layout_json, parse_graph, render_svg,
};

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

fn load_fixture(name: &str) -> Graph {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    parse_graph(&input).expect("parse failed")
}

fn layout_fixture(name: &str, config: &LayoutConfig) -> Layout {
    compute_layout(&load_fixture(name), &Theme::modern(), config)
}

fn render(layout: &Layout, zoom: f32) -> String {
    render_svg(
        layout,
        &Theme::modern(),
        &LayoutConfig::default(),
        &RenderConfig::default(),
        &ViewState::with_zoom(zoom),
    )
}

fn xy(layout: &Layout, id: usize) -> (f32, f32) {
    let pos = layout.position(NodeId(id)).expect("node has a position");
    (pos.x, pos.y)
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "chain.json",
        "cycle.json",
        "dangling.json",
        "decision.json",
        "empty.json",
        "multi_root.json",
        "shared.json",
        "wrapped.json5",
    ];

    for rel in candidates {
        let layout = layout_fixture(rel, &LayoutConfig::default());
        let svg = render(&layout, 1.0);
        assert_valid_svg(&svg, rel);
    }
}

#[test]
fn chain_is_a_vertical_column() {
    let layout = layout_fixture("chain.json", &LayoutConfig::default());
    assert_eq!(layout.forest.roots.len(), 1);
    for id in 0..4 {
        assert_eq!(xy(&layout, id), (400.0, 50.0 + 150.0 * id as f32));
    }
}

#[test]
fn decision_children_fan_out_by_priority() {
    let layout = layout_fixture("decision.json", &LayoutConfig::default());
    let ids: Vec<&str> = {
        let mut ids = Vec::new();
        layout.forest.walk(|node, _| ids.push(node.step.id.as_str()));
        ids
    };
    assert_eq!(ids, vec!["s", "d", "r", "e", "q", "x"]);

    assert_eq!(xy(&layout, 0), (400.0, 50.0));
    assert_eq!(xy(&layout, 1), (400.0, 200.0));
    assert_eq!(xy(&layout, 2), (100.0, 350.0));
    assert_eq!(xy(&layout, 3), (100.0, 500.0));
    assert_eq!(xy(&layout, 4), (400.0, 350.0));
    assert_eq!(xy(&layout, 5), (700.0, 350.0));

    let svg = render(&layout, 1.0);
    for label in ["yes", "no", "unclear"] {
        assert!(svg.contains(label), "missing edge label {label}");
    }
    assert!(svg.contains("<polygon class=\"step decision\""));
}

#[test]
fn cycle_becomes_back_edge() {
    let layout = layout_fixture("cycle.json", &LayoutConfig::default());
    assert_eq!(layout.forest.node_count(), 4);
    assert!(layout.has_back_edges());

    let mut back_targets = Vec::new();
    layout.forest.walk(|node, _| {
        for back in &node.back_edges {
            back_targets.push((node.step.id.clone(), back.target));
        }
    });
    assert_eq!(back_targets, vec![("edit".to_string(), NodeId(1))]);

    let svg = render(&layout, 1.0);
    assert_eq!(svg.matches("class=\"edge\"").count(), 3);
    assert_eq!(svg.matches("class=\"back-edge\"").count(), 1);
    assert!(svg.contains("resubmit"));
}

#[test]
fn shared_descendant_is_drawn_per_path() {
    let layout = layout_fixture("shared.json", &LayoutConfig::default());
    assert_eq!(layout.nodes.len(), 5);
    let done: Vec<f32> = layout
        .nodes
        .values()
        .filter(|node| node.step_id == "d")
        .map(|node| node.position.x)
        .collect();
    assert_eq!(done, vec![250.0, 550.0]);
    assert_eq!(render(&layout, 1.0).matches("Done").count(), 2);
}

#[test]
fn dangling_edges_are_dropped_but_still_block_roots() {
    let layout = layout_fixture("dangling.json", &LayoutConfig::default());
    assert_eq!(layout.forest.dropped_edges, 2);
    assert_eq!(layout.forest.roots.len(), 1);
    assert_eq!(layout.nodes.len(), 2);
    assert!(!render(&layout, 1.0).contains("Orphan"));
}

#[test]
fn empty_graph_renders_placeholder() {
    let layout = layout_fixture("empty.json", &LayoutConfig::default());
    assert!(layout.is_empty());
    let svg = render(&layout, 1.0);
    assert!(svg.contains("class=\"empty-state\""));
    assert!(svg.contains("No process steps to display"));
}

#[test]
fn json5_wrapper_and_aliases_parse() {
    let graph = load_fixture("wrapped.json5");
    assert_eq!(graph.steps.len(), 3);
    assert_eq!(graph.edges.len(), 2);
    assert_eq!(graph.steps[0].id, "10");

    let layout = compute_layout(&graph, &Theme::modern(), &LayoutConfig::default());
    let order: Vec<String> = layout.nodes.values().map(|n| n.step_id.clone()).collect();
    assert_eq!(order, vec!["10", "12", "11"]);
    assert_eq!(xy(&layout, 1), (250.0, 200.0));
    assert_eq!(xy(&layout, 2), (550.0, 200.0));
}

#[test]
fn root_stride_separates_trees() {
    let stacked = layout_fixture("multi_root.json", &LayoutConfig::default());
    assert_eq!(xy(&stacked, 0).0, xy(&stacked, 2).0);

    let config = LayoutConfig {
        root_stride: 350.0,
        ..LayoutConfig::default()
    };
    let spread = layout_fixture("multi_root.json", &config);
    assert_eq!(xy(&spread, 0), (400.0, 50.0));
    assert_eq!(xy(&spread, 1), (400.0, 200.0));
    assert_eq!(xy(&spread, 2), (750.0, 50.0));
}

#[test]
fn zoom_changes_drawing_not_layout() {
    let layout = layout_fixture("decision.json", &LayoutConfig::default());
    let before = layout.positions.clone();
    let small = render(&layout, 0.5);
    let large = render(&layout, 2.0);
    assert_ne!(small, large);
    assert_eq!(layout.positions, before);

    let json: serde_json::Value =
        serde_json::from_str(&layout_json(&layout).expect("layout json")).expect("valid json");
    assert_eq!(json["nodes"][2]["x"], 100.0);
}
