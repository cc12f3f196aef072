// lyt-pack: Build a layout archive from a JSON description
use anyhow::{Context, Result};
use clap::Parser;
use glam::{Vec2, Vec3, Vec4};
use lyt_core::{ArchiveBuilder, PaneData, PaneExArg, WidgetId, WidgetPos, WidgetType};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[clap(author, version, about = "Pack a JSON layout description into a .lyt archive")]
struct Args {
    /// Path to the JSON description
    #[clap(value_name = "JSON_FILE")]
    input: PathBuf,

    /// Output archive (defaults to the input path with a .lyt extension)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WidgetDesc {
    name: String,
    #[serde(rename = "type", default = "default_widget_type")]
    widget_type: String,
    #[serde(default)]
    translate: Option<[f32; 3]>,
    #[serde(default)]
    scale: Option<[f32; 3]>,
    #[serde(default)]
    rotate: Option<[f32; 3]>,
    #[serde(default)]
    color: Option<[f32; 4]>,
    #[serde(default)]
    visible: Option<bool>,
    #[serde(default)]
    main_widget: Option<u16>,
    #[serde(default)]
    pane_vec: Option<[f32; 4]>,
    #[serde(default)]
    pane: Option<PaneDesc>,
    #[serde(default)]
    children: Vec<WidgetDesc>,
}

fn default_widget_type() -> String {
    "group".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum PaneDesc {
    Null {
        name: String,
        #[serde(default)]
        translate: [f32; 3],
    },
    Type1 {
        name: String,
        #[serde(default)]
        translate: [f32; 3],
        z_multiplier: f32,
    },
    Rect {
        name: String,
        #[serde(default)]
        translate: [f32; 3],
        width: f32,
        height: f32,
    },
    Text {
        name: String,
    },
    Ex {
        name: String,
        #[serde(default)]
        enable_translate: bool,
        #[serde(default)]
        translate: [f32; 3],
        #[serde(default)]
        width: f32,
        #[serde(default)]
        height: f32,
        #[serde(default)]
        rotate: [f32; 2],
        #[serde(default = "unit_scale")]
        scale: [f32; 2],
    },
}

fn unit_scale() -> [f32; 2] {
    [1.0, 1.0]
}

impl PaneDesc {
    fn into_parts(self) -> (String, PaneData) {
        match self {
            PaneDesc::Null { name, translate } => (name, PaneData::Null { translate: Vec3::from(translate) }),
            PaneDesc::Type1 { name, translate, z_multiplier } => (
                name,
                PaneData::Type1 {
                    translate: Vec3::from(translate),
                    z_multiplier,
                },
            ),
            PaneDesc::Rect { name, translate, width, height } => (
                name,
                PaneData::Rect {
                    translate: Vec3::from(translate),
                    width,
                    height,
                },
            ),
            PaneDesc::Text { name } => (
                name,
                PaneData::Text {
                    payload: Box::new([0; lyt_core::TEXT_PAYLOAD_SIZE]),
                },
            ),
            PaneDesc::Ex { name, enable_translate, translate, width, height, rotate, scale } => (
                name,
                PaneData::Ex {
                    enable_translate,
                    arg: PaneExArg {
                        translate: Vec3::from(translate),
                        width,
                        height,
                        rotate: Vec2::from(rotate),
                        scale: Vec2::from(scale),
                        ..Default::default()
                    },
                },
            ),
        }
    }
}

fn parse_widget_type(name: &str) -> Result<WidgetType> {
    match name {
        "group" => Ok(WidgetType::Group),
        "layout" => Ok(WidgetType::Layout),
        "main_widget" => Ok(WidgetType::MainWidget),
        "pane" => Ok(WidgetType::Pane),
        other => anyhow::bail!("Unknown widget type: {}. Use 'group', 'layout', 'main_widget' or 'pane'", other),
    }
}

fn add_widget(builder: &mut ArchiveBuilder, desc: WidgetDesc, parent: Option<WidgetId>) -> Result<()> {
    let widget_type = parse_widget_type(&desc.widget_type)
        .with_context(|| format!("Invalid widget '{}'", desc.name))?;
    let id = builder.add_widget(&desc.name, parent, widget_type);

    let mut pos = WidgetPos::default();
    if let Some(translate) = desc.translate {
        pos.set_translate(Vec3::from(translate));
    }
    if let Some(scale) = desc.scale {
        pos.set_scale(Vec3::from(scale));
    }
    if let Some(rotate) = desc.rotate {
        pos.set_rotate(Vec3::from(rotate));
    }
    if let Some(color) = desc.color {
        let color = Vec4::from(color);
        pos.color = color.truncate().extend(1.0);
        pos.set_opacity(color.w);
    }
    if let Some(visible) = desc.visible {
        pos.set_visible(visible);
    }
    builder.set_pos(id, pos);

    if let Some(slot) = desc.main_widget {
        builder.set_main_widget(id, slot);
    }
    if let Some(pane_vec) = desc.pane_vec {
        builder.set_pane_vec(id, Vec4::from(pane_vec));
    }
    if let Some(pane) = desc.pane {
        let (name, data) = pane.into_parts();
        let pane = builder.add_pane(&name, data);
        builder.set_pane(id, pane);
    }

    for child in desc.children {
        add_widget(builder, child, Some(id))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                (if args.debug { tracing::Level::DEBUG } else { tracing::Level::INFO }).into(),
            ),
        )
        .init();

    if !args.input.exists() {
        anyhow::bail!("Description file not found: {:?}", args.input);
    }

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {:?}", args.input))?;
    let root: WidgetDesc = serde_json::from_str(&text).context("Failed to parse layout description")?;

    let mut builder = ArchiveBuilder::new();
    add_widget(&mut builder, root, None)?;
    let data = builder.build();

    lyt_core::decode_archive(&data).context("Packed archive failed validation")?;

    let output = args.output.unwrap_or_else(|| args.input.with_extension("lyt"));
    fs::write(&output, &data).with_context(|| format!("Failed to write {:?}", output))?;
    info!(
        "Packed {} widgets and {} panes into {:?} ({} bytes)",
        builder.widget_count(),
        builder.pane_count(),
        output,
        data.len()
    );
    Ok(())
}
