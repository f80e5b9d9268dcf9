use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::{Edge, StepType};
use crate::layout::{Layout, NodeLayout, TextBlock};
use crate::theme::Theme;
use crate::view::ViewState;
use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

const EMPTY_WIDTH: f32 = 480.0;
const EMPTY_HEIGHT: f32 = 160.0;
const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 4.0;
const BACK_EDGE_GAP: f32 = 40.0;

/// Maps layout units to SVG user units: shift by the layout origin, then zoom.
struct Canvas {
    origin: (f32, f32),
    zoom: f32,
}

impl Canvas {
    fn new(layout: &Layout, view: &ViewState) -> Self {
        Self {
            origin: layout.origin,
            zoom: view.zoom(),
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        ((x + self.origin.0) * self.zoom, (y + self.origin.1) * self.zoom)
    }

    fn len(&self, value: f32) -> f32 {
        value * self.zoom
    }
}

struct EdgePath<'a> {
    points: Vec<(f32, f32)>,
    edge: &'a Edge,
    back: bool,
}

/// Renders a positioned layout as SVG, scaled by the view's zoom.
///
/// Draws one box per tree node and one connector per parent/child edge.
/// Back-edges are dashed and run along the right of the drawing. An empty
/// layout renders a placeholder message instead of a blank canvas.
pub fn render_svg(
    layout: &Layout,
    theme: &Theme,
    config: &LayoutConfig,
    render: &RenderConfig,
    view: &ViewState,
) -> String {
    let theme = &escaped_theme(theme);
    let background = escape_xml(&render.background);
    if layout.is_empty() {
        return render_empty(theme, &background, &render.empty_message, view);
    }

    let canvas = Canvas::new(layout, view);
    let mut svg = String::new();
    let back_lane = layout.bounds.max_x + BACK_EDGE_GAP;
    let layout_width = if layout.has_back_edges() {
        layout.width + BACK_EDGE_GAP
    } else {
        layout.width
    };
    let width = canvas.len(layout_width.max(200.0));
    let height = canvas.len(layout.height.max(200.0));

    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    );
    let _ = write!(
        svg,
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        background
    );
    svg.push_str("<defs>");
    let _ = write!(
        svg,
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    );
    let _ = write!(
        svg,
        "<marker id=\"arrow-back\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.back_edge_color
    );
    svg.push_str("</defs>");

    let paths = collect_edge_paths(layout, back_lane);
    let label_positions = compute_edge_label_positions(&paths, layout, theme, config);

    for (path, label) in paths.iter().zip(label_positions) {
        let scaled: Vec<(f32, f32)> = path
            .points
            .iter()
            .map(|(x, y)| canvas.point(*x, *y))
            .collect();
        let d = points_to_path(&scaled);
        if path.back {
            let _ = write!(
                svg,
                "<path class=\"back-edge\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-dasharray=\"6 4\" marker-end=\"url(#arrow-back)\"/>",
                d,
                theme.back_edge_color,
                canvas.len(1.4)
            );
        } else {
            let _ = write!(
                svg,
                "<path class=\"edge\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" marker-end=\"url(#arrow)\"/>",
                d,
                theme.line_color,
                canvas.len(1.4)
            );
        }

        if let Some((x, y, block)) = label {
            let (rect_x, rect_y) = canvas.point(
                x - block.width / 2.0 - LABEL_PAD_X,
                y - block.height / 2.0 - LABEL_PAD_Y,
            );
            let rect_w = canvas.len(block.width + LABEL_PAD_X * 2.0);
            let rect_h = canvas.len(block.height + LABEL_PAD_Y * 2.0);
            let _ = write!(
                svg,
                "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{rect_w:.2}\" height=\"{rect_h:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
                theme.edge_label_background, theme.primary_border_color
            );
            svg.push_str(&text_block_svg(x, y, &block, theme, config, &canvas));
        }
    }

    for node in layout.nodes.values() {
        svg.push_str(&node_svg(node, theme, config, &canvas));
    }

    svg.push_str("</svg>");
    svg
}

fn render_empty(theme: &Theme, background: &str, message: &str, view: &ViewState) -> String {
    let width = view.scale(EMPTY_WIDTH);
    let height = view.scale(EMPTY_HEIGHT);
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\"><rect width=\"100%\" height=\"100%\" fill=\"{}\"/><text class=\"empty-state\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{:.2}\" fill=\"{}\">{}</text></svg>",
        background,
        width / 2.0,
        height / 2.0,
        theme.font_family,
        view.scale(theme.font_size),
        theme.primary_text_color,
        escape_xml(message)
    )
}

fn collect_edge_paths(layout: &Layout, back_lane: f32) -> Vec<EdgePath<'_>> {
    let mut paths = Vec::new();
    layout.forest.walk(|node, _| {
        let Some(from) = layout.nodes.get(&node.id) else {
            return;
        };
        for (child, edge) in node.children.iter().zip(&node.edges) {
            let Some(to) = layout.nodes.get(&child.id) else {
                continue;
            };
            let (fx, fy) = (from.position.x, from.position.y + from.height / 2.0);
            let (tx, ty) = (to.position.x, to.position.y - to.height / 2.0);
            let points = if (fx - tx).abs() < f32::EPSILON {
                vec![(fx, fy), (tx, ty)]
            } else {
                let mid_y = (fy + ty) / 2.0;
                vec![(fx, fy), (fx, mid_y), (tx, mid_y), (tx, ty)]
            };
            paths.push(EdgePath {
                points,
                edge,
                back: false,
            });
        }
        for back in &node.back_edges {
            let Some(to) = layout.nodes.get(&back.target) else {
                continue;
            };
            let start = (from.position.x + from.width / 2.0, from.position.y);
            let end = (to.position.x + to.width / 2.0, to.position.y);
            paths.push(EdgePath {
                points: vec![start, (back_lane, start.1), (back_lane, end.1), end],
                edge: &back.edge,
                back: true,
            });
        }
    });
    paths
}

fn node_svg(node: &NodeLayout, theme: &Theme, config: &LayoutConfig, canvas: &Canvas) -> String {
    let (cx, cy) = canvas.point(node.position.x, node.position.y);
    let w = canvas.len(node.width);
    let h = canvas.len(node.height);
    let fill = theme.fill_for(node.step_type);
    let stroke_width = canvas.len(1.4);
    let mut out = String::new();
    match node.step_type {
        StepType::Decision => {
            let _ = write!(
                out,
                "<polygon class=\"step decision\" points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
                cx,
                cy - h / 2.0,
                cx + w / 2.0,
                cy,
                cx,
                cy + h / 2.0,
                cx - w / 2.0,
                cy,
                fill,
                theme.primary_border_color,
                stroke_width
            );
        }
        StepType::Start | StepType::End | StepType::Task => {
            let radius = if node.step_type == StepType::Task {
                canvas.len(6.0)
            } else {
                h / 2.0
            };
            let _ = write!(
                out,
                "<rect class=\"step {}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{radius:.2}\" ry=\"{radius:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
                node.step_type.as_str(),
                cx - w / 2.0,
                cy - h / 2.0,
                w,
                h,
                fill,
                theme.primary_border_color,
                stroke_width
            );
        }
    }
    out.push_str(&text_block_svg(
        node.position.x,
        node.position.y,
        &node.label,
        theme,
        config,
        canvas,
    ));
    out
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    let mut d = String::new();
    for (idx, (x, y)) in points.iter().enumerate() {
        let cmd = if idx == 0 { "M" } else { " L" };
        let _ = write!(d, "{cmd} {x:.2} {y:.2}");
    }
    d
}

/// `x`/`y` are the block centre in layout units.
fn text_block_svg(
    x: f32,
    y: f32,
    label: &TextBlock,
    theme: &Theme,
    config: &LayoutConfig,
    canvas: &Canvas,
) -> String {
    let line_height = theme.font_size * config.label_line_height;
    let (sx, sy) = canvas.point(x, y - label.height / 2.0 + line_height / 2.0);
    let mut text = String::new();
    let _ = write!(
        text,
        "<text x=\"{sx:.2}\" y=\"{sy:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{:.2}\" fill=\"{}\">",
        theme.font_family,
        canvas.len(theme.font_size),
        theme.primary_text_color
    );
    for (idx, line) in label.lines.iter().enumerate() {
        let dy = if idx == 0 { 0.0 } else { canvas.len(line_height) };
        let _ = write!(
            text,
            "<tspan x=\"{sx:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        );
    }
    text.push_str("</text>");
    text
}

fn compute_edge_label_positions(
    paths: &[EdgePath<'_>],
    layout: &Layout,
    theme: &Theme,
    config: &LayoutConfig,
) -> Vec<Option<(f32, f32, TextBlock)>> {
    let mut occupied: Vec<(f32, f32, f32, f32)> = layout
        .nodes
        .values()
        .map(|node| {
            (
                node.position.x - node.width / 2.0,
                node.position.y - node.height / 2.0,
                node.width,
                node.height,
            )
        })
        .collect();
    let mut positions = Vec::with_capacity(paths.len());

    for path in paths {
        let Some(text) = path.edge.label.as_deref().filter(|l| !l.trim().is_empty()) else {
            positions.push(None);
            continue;
        };
        let label = crate::layout::measure_edge_label(text, theme, config);
        let (mid_x, mid_y) = edge_midpoint(&path.points);
        let mut offset = 0.0;
        let mut placed = None;

        for _ in 0..6 {
            let y = mid_y + offset;
            let rect = (
                mid_x - label.width / 2.0 - LABEL_PAD_X,
                y - label.height / 2.0 - LABEL_PAD_Y,
                label.width + LABEL_PAD_X * 2.0,
                label.height + LABEL_PAD_Y * 2.0,
            );
            if !collides(&rect, &occupied) {
                occupied.push(rect);
                placed = Some((mid_x, y, label.clone()));
                break;
            }
            offset += label.height + LABEL_PAD_Y * 2.0;
        }

        positions.push(placed.or(Some((mid_x, mid_y, label))));
    }

    positions
}

/// Centre of the middle segment; for elbow connectors that is the crossbar.
fn edge_midpoint(points: &[(f32, f32)]) -> (f32, f32) {
    match points {
        [] => (0.0, 0.0),
        [only] => *only,
        [first, .., last] if points.len() < 4 => ((first.0 + last.0) / 2.0, (first.1 + last.1) / 2.0),
        _ => {
            let mid = points.len() / 2;
            let (a, b) = (points[mid - 1], points[mid]);
            ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
        }
    }
}

fn collides(rect: &(f32, f32, f32, f32), occupied: &[(f32, f32, f32, f32)]) -> bool {
    occupied.iter().any(|(x, y, w, h)| {
        rect.0 < x + w && rect.0 + rect.2 > *x && rect.1 < y + h && rect.1 + rect.3 > *y
    })
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

/// Copy of `theme` whose strings are safe inside double-quoted attributes.
fn escaped_theme(theme: &Theme) -> Theme {
    Theme {
        font_family: escape_xml(&theme.font_family),
        font_size: theme.font_size,
        primary_color: escape_xml(&theme.primary_color),
        primary_text_color: escape_xml(&theme.primary_text_color),
        primary_border_color: escape_xml(&theme.primary_border_color),
        line_color: escape_xml(&theme.line_color),
        start_color: escape_xml(&theme.start_color),
        end_color: escape_xml(&theme.end_color),
        decision_color: escape_xml(&theme.decision_color),
        edge_label_background: escape_xml(&theme.edge_label_background),
        back_edge_color: escape_xml(&theme.back_edge_color),
        background: escape_xml(&theme.background),
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
