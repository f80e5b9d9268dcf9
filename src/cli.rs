use crate::config::{Config, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_graphs;
use crate::render::{render_svg, write_output_svg};
use crate::view::ViewState;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ptl", version, about = "Lay out and render process step graphs as decision trees")]
pub struct Args {
    /// Input graph file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Display zoom, clamped to 0.25..=2.0
    #[arg(short = 'z', long = "zoom", default_value_t = 1.0)]
    pub zoom: f32,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Also write the computed layout as JSON to this path
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("failed to load config {:?}", args.config))?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    let view = ViewState::with_zoom(args.zoom);

    let input = read_input(args.input.as_deref())?;
    let graphs = parse_graphs(&input).context("failed to parse graph document")?;
    if graphs.is_empty() {
        return Err(anyhow::anyhow!("No process graphs found in input"));
    }

    let outputs: Vec<Option<PathBuf>> = if graphs.len() == 1 {
        vec![args.output.clone()]
    } else {
        resolve_multi_outputs(args.output.as_deref(), args.output_format, graphs.len())?
            .into_iter()
            .map(Some)
            .collect()
    };

    for (idx, (graph, output)) in graphs.iter().zip(outputs).enumerate() {
        let layout = compute_layout(graph, &config.theme, &config.layout);
        info!(
            document = idx + 1,
            steps = graph.steps.len(),
            nodes = layout.nodes.len(),
            "laid out process graph"
        );
        if let Some(dump) = args.dump_layout.as_deref() {
            let path = if graphs.len() == 1 {
                dump.to_path_buf()
            } else {
                numbered_path(dump, idx, "json")
            };
            write_layout_dump(&path, &layout)?;
        }

        match args.output_format {
            OutputFormat::Svg => {
                let svg = render_svg(&layout, &config.theme, &config.layout, &config.render, &view);
                write_output_svg(&svg, output.as_deref())?;
            }
            OutputFormat::Png => {
                let svg = render_svg(&layout, &config.theme, &config.layout, &config.render, &view);
                let path = ensure_output(&output, "png")?;
                write_png(&svg, &path, &config)?;
            }
            OutputFormat::Json => {
                let json = crate::layout_dump::layout_json(&layout)?;
                match output.as_deref() {
                    Some(path) => std::fs::write(path, json)?,
                    None => println!("{json}"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, path: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, path, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _path: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn numbered_path(base: &Path, idx: usize, ext: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("process");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}-{}.{}", stem, idx + 1, ext))
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for multi-process input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("process-{}.{}", idx + 1, ext)))
            .collect());
    }
    Ok((0..count).map(|idx| numbered_path(base, idx, ext)).collect())
}
