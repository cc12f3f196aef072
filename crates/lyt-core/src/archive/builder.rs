// crates/lyt-core/src/archive/builder.rs
use std::collections::{HashMap, VecDeque};

use glam::Vec4;

use super::reader::PutLe;
use super::{ArchiveHeader, WidgetRecord, MAGIC, NONE_INDEX, NO_MAIN_WIDGET, VERSION};
use crate::{PaneData, PaneId, PaneType, WidgetId, WidgetPos, WidgetType, NO_NAME};

#[derive(Debug, Clone)]
struct WidgetEntry {
    name: u32,
    parent: Option<WidgetId>,
    widget_type: WidgetType,
    pane: Option<PaneId>,
    main_widget: Option<u16>,
    pane_vec: Vec4,
    pos: WidgetPos,
    children: Vec<WidgetId>,
}

/// Writes layout archives.
///
/// Widgets may be added in any order; `build` lays them out breadth-first
/// so that every widget's children form one contiguous range. The ids
/// handed out here are builder-local and do not survive into the archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    strings: Vec<u8>,
    offsets: HashMap<String, u32>,
    panes: Vec<(u32, PaneData)>,
    widgets: Vec<WidgetEntry>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn name(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return NO_NAME;
        }
        if let Some(&offset) = self.offsets.get(name) {
            return offset;
        }
        let offset = self.strings.len() as u32;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.offsets.insert(name.to_string(), offset);
        offset
    }

    pub fn add_pane(&mut self, name: &str, data: PaneData) -> PaneId {
        let name = self.name(name);
        self.panes.push((name, data));
        PaneId(self.panes.len() as u32 - 1)
    }

    /// Append a widget as the last child of `parent`.
    ///
    /// Panics if `parent` was not returned by this builder.
    pub fn add_widget(&mut self, name: &str, parent: Option<WidgetId>, widget_type: WidgetType) -> WidgetId {
        let name = self.name(name);
        let id = WidgetId(self.widgets.len() as u32);
        if let Some(parent) = parent {
            self.widgets[parent.index()].children.push(id);
        }
        self.widgets.push(WidgetEntry {
            name,
            parent,
            widget_type,
            pane: None,
            main_widget: None,
            pane_vec: Vec4::ZERO,
            pos: WidgetPos::default(),
            children: Vec::new(),
        });
        id
    }

    pub fn set_pane(&mut self, widget: WidgetId, pane: PaneId) {
        self.widgets[widget.index()].pane = Some(pane);
    }

    pub fn set_pos(&mut self, widget: WidgetId, pos: WidgetPos) {
        self.widgets[widget.index()].pos = pos;
    }

    pub fn set_main_widget(&mut self, widget: WidgetId, slot: u16) {
        self.widgets[widget.index()].main_widget = Some(slot);
    }

    pub fn set_pane_vec(&mut self, widget: WidgetId, pane_vec: Vec4) {
        self.widgets[widget.index()].pane_vec = pane_vec;
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn pane_count(&self) -> usize {
        self.panes.len()
    }

    /// Breadth-first order starting from every parentless widget in insertion order.
    fn table_order(&self) -> Vec<WidgetId> {
        let mut order = Vec::with_capacity(self.widgets.len());
        let mut queue: VecDeque<WidgetId> = (0..self.widgets.len() as u32)
            .map(WidgetId)
            .filter(|id| self.widgets[id.index()].parent.is_none())
            .collect();
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.widgets[id.index()].children.iter().copied());
        }
        order
    }

    pub fn build(&self) -> Vec<u8> {
        let order = self.table_order();
        let mut slot = vec![NONE_INDEX; self.widgets.len()];
        for (position, id) in order.iter().enumerate() {
            slot[id.index()] = position as u32;
        }

        let mut pane_table = Vec::new();
        for (name, data) in &self.panes {
            let size = data.pane_type().record_size().unwrap_or(PaneType::HEADER_SIZE);
            pane_table.put_u16(data.pane_type() as u16);
            pane_table.put_u16(size as u16);
            pane_table.put_u32(*name);
            pane_table.put_u32(0);
            data.write(&mut pane_table);
        }

        let mut widget_table = Vec::with_capacity(order.len() * WidgetRecord::SIZE);
        for id in &order {
            let entry = &self.widgets[id.index()];
            let first_child = entry
                .children
                .first()
                .map(|c| slot[c.index()])
                .unwrap_or(0);
            WidgetRecord {
                parent: entry.parent.map(|p| slot[p.index()]).unwrap_or(NONE_INDEX),
                name: entry.name,
                first_child,
                child_count: entry.children.len() as u32,
                main_widget: entry.main_widget.unwrap_or(NO_MAIN_WIDGET),
                widget_type: entry.widget_type as u16,
                pane: entry.pane.map(|p| p.0).unwrap_or(NONE_INDEX),
                pane_vec: entry.pane_vec,
                pos: entry.pos,
                old_pos: entry.pos,
            }
            .write(&mut widget_table);
        }

        let pane_table_offset = ArchiveHeader::SIZE;
        let widget_table_offset = pane_table_offset + pane_table.len();
        let string_table_offset = widget_table_offset + widget_table.len();

        let mut out = Vec::with_capacity(string_table_offset + self.strings.len());
        ArchiveHeader {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            widget_count: order.len() as u32,
            pane_count: self.panes.len() as u32,
            pane_table_offset: pane_table_offset as u32,
            widget_table_offset: widget_table_offset as u32,
            string_table_offset: string_table_offset as u32,
            string_table_size: self.strings.len() as u32,
        }
        .write(&mut out);
        out.extend_from_slice(&pane_table);
        out.extend_from_slice(&widget_table);
        out.extend_from_slice(&self.strings);
        out
    }
}
