#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::ParseError;
pub use ir::{Edge, Graph, Step, StepType};
pub use layout::{Layout, NodeId, Position, Positions, TreeNode, build_forest, compute_layout};
pub use layout_dump::{LayoutDump, layout_json};
pub use parser::{parse_graph, parse_graphs};
pub use render::render_svg;
pub use theme::Theme;
pub use view::ViewState;

/// Everything needed to turn a graph document into a drawing.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    pub view: ViewState,
}

impl RenderOptions {
    pub fn modern() -> Self {
        Self::from_config(Config::default())
    }

    pub fn classic() -> Self {
        let mut config = Config::default();
        config.theme = Theme::classic();
        config.render.background = config.theme.background.clone();
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            theme: config.theme,
            layout: config.layout,
            render: config.render,
            view: ViewState::new(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::modern()
    }
}

/// Parses a graph document, lays it out and renders SVG in one call.
pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let graph = parse_graph(input)?;
    let layout = compute_layout(&graph, &options.theme, &options.layout);
    Ok(render_svg(
        &layout,
        &options.theme,
        &options.layout,
        &options.render,
        &options.view,
    ))
}

/// Parses a graph document and returns its layout as JSON.
pub fn layout_with_options(input: &str, options: &RenderOptions) -> anyhow::Result<String> {
    let graph = parse_graph(input)?;
    let layout = compute_layout(&graph, &options.theme, &options.layout);
    layout_json(&layout)
}
