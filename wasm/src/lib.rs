use process_tree_layout::{RenderOptions, Theme, ViewState, layout_with_options, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    zoom: Option<f32>,
    root_stride: Option<f32>,
}

fn build_render_options(options: ProcessRenderOptions) -> RenderOptions {
    let mut render_options = RenderOptions::modern();
    if let Some(theme) = options.theme.as_deref().and_then(Theme::by_name) {
        render_options.render.background = theme.background.clone();
        render_options.theme = theme;
    }

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(zoom) = options.zoom {
        render_options.view = ViewState::with_zoom(zoom);
    }
    if let Some(stride) = options.root_stride {
        render_options.layout.root_stride = stride;
    }

    render_options
}

fn parse_options(options_json: Option<String>) -> Result<ProcessRenderOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str::<ProcessRenderOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(ProcessRenderOptions::default()),
    }
}

#[wasm_bindgen]
pub fn render_process_svg(graph_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    render_with_options(graph_json, render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn layout_process_json(graph_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    layout_with_options(graph_json, &render_options)
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
