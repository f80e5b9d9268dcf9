use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal anchor shared by every root.
    pub root_x: f32,
    /// Extra offset per root index; 0 keeps all roots on `root_x`.
    pub root_stride: f32,
    pub level_spacing: f32,
    pub top_margin: f32,
    pub sibling_spacing: f32,
    pub decision_spread: f32,
    pub min_x: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub node_padding_x: f32,
    pub node_padding_y: f32,
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_x: 400.0,
            root_stride: 0.0,
            level_spacing: 150.0,
            top_margin: 50.0,
            sibling_spacing: 300.0,
            decision_spread: 200.0,
            min_x: 50.0,
            node_width: 180.0,
            node_height: 60.0,
            node_padding_x: 16.0,
            node_padding_y: 10.0,
            label_line_height: 1.4,
            max_label_width_chars: 22,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
    pub empty_message: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            background: "#FFFFFF".to_string(),
            empty_message: "No process steps to display".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<NumberOrString>,
    primary_color: Option<String>,
    primary_text_color: Option<String>,
    primary_border_color: Option<String>,
    line_color: Option<String>,
    start_color: Option<String>,
    end_color: Option<String>,
    decision_color: Option<String>,
    edge_label_background: Option<String>,
    back_edge_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().trim_end_matches("px").parse::<f32>().ok(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    root_x: Option<f32>,
    root_stride: Option<f32>,
    level_spacing: Option<f32>,
    top_margin: Option<f32>,
    sibling_spacing: Option<f32>,
    decision_spread: Option<f32>,
    min_x: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    max_label_width_chars: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    empty_message: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => tracing::warn!(theme = theme_name, "unknown theme name, keeping default"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }
    config.render.background = config.theme.background.clone();

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.root_x {
            target.root_x = v;
        }
        if let Some(v) = layout.root_stride {
            target.root_stride = v;
        }
        if let Some(v) = layout.level_spacing {
            target.level_spacing = v;
        }
        if let Some(v) = layout.top_margin {
            target.top_margin = v;
        }
        if let Some(v) = layout.sibling_spacing {
            target.sibling_spacing = v;
        }
        if let Some(v) = layout.decision_spread {
            target.decision_spread = v;
        }
        if let Some(v) = layout.min_x {
            target.min_x = v;
        }
        if let Some(v) = layout.node_width {
            target.node_width = v.max(1.0);
        }
        if let Some(v) = layout.node_height {
            target.node_height = v.max(1.0);
        }
        if let Some(v) = layout.max_label_width_chars {
            target.max_label_width_chars = v.max(1);
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.empty_message {
            config.render.empty_message = v;
        }
    }

    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size.as_ref().and_then(NumberOrString::as_f32) {
        theme.font_size = v;
    }
    if let Some(v) = vars.primary_color {
        theme.primary_color = v;
    }
    if let Some(v) = vars.primary_text_color {
        theme.primary_text_color = v;
    }
    if let Some(v) = vars.primary_border_color {
        theme.primary_border_color = v;
    }
    if let Some(v) = vars.line_color {
        theme.line_color = v;
    }
    if let Some(v) = vars.start_color {
        theme.start_color = v;
    }
    if let Some(v) = vars.end_color {
        theme.end_color = v;
    }
    if let Some(v) = vars.decision_color {
        theme.decision_color = v;
    }
    if let Some(v) = vars.edge_label_background {
        theme.edge_label_background = v;
    }
    if let Some(v) = vars.back_edge_color {
        theme.back_edge_color = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
}
