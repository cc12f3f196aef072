use anyhow::{Context, Result};
use clap::Parser;
use lyt_core::{Matrix34, PaneData, WidgetId};
use lyt_runtime::{DrawEntry, Layout, DEFAULT_SPEED};
use serde_json::json;
use std::fs;
use std::path::Path;

#[derive(Parser)]
#[command(name = "lyt-dump")]
#[command(about = "Print the widget tree of a layout archive as text")]
struct Args {
    /// Path to the .lyt file to analyze
    lyt_file: String,

    /// Output format (tree, json, detailed)
    #[arg(long, default_value = "tree")]
    format: String,

    /// Save output to file instead of stdout
    #[arg(long)]
    output: Option<String>,

    /// Evaluate this many frames before printing
    #[arg(long, default_value_t = 0)]
    frames: u32,

    /// Speed passed to each evaluated frame
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    speed: f32,

    /// Show translate/scale/rotate and flag words
    #[arg(long)]
    show_pos: bool,

    /// Show world matrices (only meaningful with --frames)
    #[arg(long)]
    show_matrices: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let path = Path::new(&args.lyt_file);
    if !path.exists() {
        anyhow::bail!("Layout file not found: {}", args.lyt_file);
    }

    let data = fs::read(path).with_context(|| format!("Failed to read {}", args.lyt_file))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layout")
        .to_string();
    let mut layout = Layout::decode(&data, name).context("Failed to decode layout archive")?;

    for _ in 0..args.frames {
        layout.calc(args.speed);
    }

    let output_text = match args.format.as_str() {
        "tree" => generate_tree_output(&layout, &args),
        "json" => generate_json_output(&layout, &args),
        "detailed" => generate_detailed_output(&layout, &data, &args),
        _ => anyhow::bail!("Unknown format: {}. Use 'tree', 'json', or 'detailed'", args.format),
    }?;

    if let Some(output_file) = args.output {
        fs::write(&output_file, output_text)
            .with_context(|| format!("Failed to write to file: {}", output_file))?;
        println!("Output written to: {}", output_file);
    } else {
        print!("{}", output_text);
    }

    Ok(())
}

fn generate_tree_output(layout: &Layout, args: &Args) -> Result<String> {
    let mut output = String::new();
    render_widget_tree(&mut output, layout, args);
    Ok(output)
}

fn format_matrix(m: &Matrix34) -> String {
    let c = m.to_cols_array();
    format!(
        "[{:.2} {:.2} {:.2} {:.2} | {:.2} {:.2} {:.2} {:.2} | {:.2} {:.2} {:.2} {:.2}]",
        c[0], c[3], c[6], c[9], c[1], c[4], c[7], c[10], c[2], c[5], c[8], c[11]
    )
}

fn render_widget_tree(output: &mut String, layout: &Layout, args: &Args) {
    // (widget, continuation prefix drawn by its ancestors, branch glyph)
    let mut stack: Vec<(WidgetId, String, &str)> = vec![(layout.root_id(), String::new(), "")];

    while let Some((id, prefix, branch)) = stack.pop() {
        let Some(widget) = layout.widget(id) else {
            continue;
        };

        output.push_str(&format!(
            "{}{}{:?} \"{}\"",
            prefix,
            branch,
            widget.widget_type,
            layout.widget_name(id)
        ));
        if let Some(pane) = widget.pane().and_then(|p| layout.pane(p)) {
            output.push_str(&format!(" pane:{:?} \"{}\"", pane.pane_type(), layout.name_of(pane.name)));
        }
        if let Some(slot) = widget.main_widget() {
            output.push_str(&format!(" slot:{}", slot));
        }
        if !widget.pos.is_visible() {
            output.push_str(" [hidden]");
        }
        output.push('\n');

        // A last child leaves no vertical bar under itself.
        let child_prefix = match branch {
            "" => prefix,
            "└── " => prefix + "    ",
            _ => prefix + "│   ",
        };

        let detail_indent = format!("{}    ", child_prefix);
        if args.show_pos {
            let pos = &widget.pos;
            output.push_str(&format!(
                "{}• t:({:.2},{:.2},{:.2}) s:({:.2},{:.2},{:.2}) r:({:.2},{:.2},{:.2}) a:{:.2}\n",
                detail_indent,
                pos.translate.x, pos.translate.y, pos.translate.z,
                pos.scale.x, pos.scale.y, pos.scale.z,
                pos.rotate.x, pos.rotate.y, pos.rotate.z,
                pos.opacity()
            ));
            output.push_str(&format!(
                "{}• touched:0x{:08X} at_default:0x{:08X}\n",
                detail_indent,
                pos.touched.bits(),
                pos.at_default.bits()
            ));
        }
        if args.show_matrices && widget.initialised {
            output.push_str(&format!("{}• mtx: {}\n", detail_indent, format_matrix(widget.mtx())));
            if widget.pane().is_some() {
                output.push_str(&format!("{}• pane_mtx: {}\n", detail_indent, format_matrix(widget.pane_mtx())));
            }
        }

        // Pushed in reverse so children print in array order.
        let child_count = widget.children().len();
        for (i, child) in widget.children().iter().enumerate().rev() {
            let branch = if i == child_count - 1 { "└── " } else { "├── " };
            stack.push((*child, child_prefix.clone(), branch));
        }
    }
}

fn generate_json_output(layout: &Layout, args: &Args) -> Result<String> {
    let widgets: Vec<_> = layout
        .widgets()
        .iter()
        .enumerate()
        .map(|(index, widget)| {
            let mut entry = json!({
                "index": index,
                "name": layout.name_of(widget.name),
                "type": format!("{:?}", widget.widget_type),
                "parent": widget.parent().map(|p| p.0),
                "children": widget.children().iter().map(|c| c.0).collect::<Vec<_>>(),
                "pane": widget.pane().map(|p| p.0),
                "main_widget": widget.main_widget(),
                "visible": widget.pos.is_visible(),
                "translate": widget.pos.translate.to_array(),
                "scale": widget.pos.scale.to_array(),
                "rotate": widget.pos.rotate.to_array(),
                "color": widget.pos.color.to_array(),
            });
            if args.frames > 0 {
                entry["mtx"] = json!(widget.mtx().to_cols_array());
                entry["world_color"] = json!(widget.color().to_array());
            }
            entry
        })
        .collect();

    let panes: Vec<_> = layout
        .panes()
        .iter()
        .map(|pane| {
            json!({
                "name": layout.name_of(pane.name),
                "type": format!("{:?}", pane.pane_type()),
                "size": pane.size().map(|s| s.to_array()),
            })
        })
        .collect();

    let doc = json!({
        "name": layout.name(),
        "widget_count": layout.widgets().len(),
        "pane_count": layout.panes().len(),
        "root": layout.root_id().0,
        "widgets": widgets,
        "panes": panes,
    });
    let mut output = serde_json::to_string_pretty(&doc)?;
    output.push('\n');
    Ok(output)
}

fn generate_detailed_output(layout: &Layout, data: &[u8], args: &Args) -> Result<String> {
    let mut output = String::new();

    output.push_str("=== LAYOUT ARCHIVE ANALYSIS ===\n\n");

    output.push_str("HEADER:\n");
    output.push_str(&format!("  Size: {} bytes\n", data.len()));
    output.push_str(&format!("  Widgets: {}\n", layout.widgets().len()));
    output.push_str(&format!("  Panes: {}\n", layout.panes().len()));
    output.push('\n');

    output.push_str("PANE TABLE:\n");
    for (i, pane) in layout.panes().iter().enumerate() {
        output.push_str(&format!("  [{}] {:?} \"{}\"", i, pane.pane_type(), layout.name_of(pane.name)));
        match &pane.data {
            PaneData::Null { translate } => output.push_str(&format!(" t:{:?}", translate.to_array())),
            PaneData::Type1 { translate, z_multiplier } => {
                output.push_str(&format!(" t:{:?} z*{}", translate.to_array(), z_multiplier))
            }
            PaneData::Rect { translate, width, height } => {
                output.push_str(&format!(" t:{:?} {}x{}", translate.to_array(), width, height))
            }
            PaneData::Text { .. } => {}
            PaneData::Ex { enable_translate, arg } => output.push_str(&format!(
                " {}x{} rot:{:?} scale:{:?} translate:{}",
                arg.width,
                arg.height,
                arg.rotate.to_array(),
                arg.scale.to_array(),
                enable_translate
            )),
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str("WIDGET TREE:\n");
    render_widget_tree(&mut output, layout, args);

    if args.frames > 0 {
        output.push_str("\nDRAW LIST:\n");
        for entry in layout.draw_list() {
            match entry {
                DrawEntry::Pane(item) => output.push_str(&format!(
                    "  {} \"{}\" alpha:{:.2}{}\n",
                    format_matrix(&item.mtx),
                    layout.widget_name(item.widget),
                    item.color.w,
                    if item.visible { "" } else { " [hidden]" }
                )),
                DrawEntry::Nested(slot) => output.push_str(&format!("  <nested layout in slot {}>\n", slot)),
            }
        }
    }

    output.push_str("\n=== END ANALYSIS ===\n");
    Ok(output)
}
