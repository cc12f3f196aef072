// crates/lyt-runtime/src/draw.rs
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use lyt_core::{Matrix34, PaneId, PaneType, WidgetId};

use crate::Layout;

/// One pane reached by the last traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub widget: WidgetId,
    pub pane: PaneId,
    pub pane_type: PaneType,
    /// Widget world matrix with the pane offset applied.
    pub mtx: Matrix34,
    pub color: Vec4,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawEntry {
    Pane(DrawItem),
    /// The nested layout hosted in this main-widget slot draws here.
    Nested(u16),
}

/// Per-pane constants in the layout a shader expects: three matrix rows then the tint.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct DrawConstants {
    pub rows: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl From<&DrawItem> for DrawConstants {
    fn from(item: &DrawItem) -> Self {
        let cols = item.mtx.to_cols_array();
        let row = |r: usize| [cols[r], cols[3 + r], cols[6 + r], cols[9 + r]];
        Self {
            rows: [row(0), row(1), row(2)],
            color: item.color.to_array(),
        }
    }
}

impl Layout {
    /// Flatten the draw list, nested layouts included, into upload-ready constants.
    ///
    /// Hidden panes are skipped.
    pub fn draw_constants(&self) -> Vec<DrawConstants> {
        let mut out = Vec::with_capacity(self.draw_list.len());
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants(&self, out: &mut Vec<DrawConstants>) {
        for entry in &self.draw_list {
            match entry {
                DrawEntry::Pane(item) if item.visible => out.push(DrawConstants::from(item)),
                DrawEntry::Pane(_) => {}
                DrawEntry::Nested(slot) => {
                    if let Some(nested) = self.main_widgets.get(*slot as usize).and_then(|m| m.layout()) {
                        nested.collect_constants(out);
                    }
                }
            }
        }
    }
}
