// crates/lyt-core/src/widget.rs
use glam::Vec4;

use crate::{Matrix23, Matrix34, NameRef, WidgetPos};

/// Index of a widget in its layout's flat widget array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId(pub u32);

impl WidgetId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a pane in its layout's flat pane array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(pub u32);

impl PaneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum WidgetType {
    Group = 0,
    Layout = 1,
    MainWidget = 2,
    Pane = 3,
}

impl TryFrom<u16> for WidgetType {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, u16> {
        match value {
            0 => Ok(WidgetType::Group),
            1 => Ok(WidgetType::Layout),
            2 => Ok(WidgetType::MainWidget),
            3 => Ok(WidgetType::Pane),
            other => Err(other),
        }
    }
}

/// Values computed for a widget by the last frame evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetFrame {
    /// World matrix, inherited by children.
    pub mtx: Matrix34,
    /// World matrix with the pane's own offset applied; equals `mtx` without a pane.
    pub pane_mtx: Matrix34,
    pub mtx23: Matrix23,
    /// Accumulated tint; alpha is forced to zero under an invisible ancestor.
    pub color: Vec4,
}

impl Default for WidgetFrame {
    fn default() -> Self {
        Self {
            mtx: Matrix34::IDENTITY,
            pane_mtx: Matrix34::IDENTITY,
            mtx23: Matrix23::IDENTITY,
            color: Vec4::ONE,
        }
    }
}

/// A named node of a layout's widget tree.
///
/// Structural links are indices into the owning layout. `parent` is a
/// back-reference only; a widget's children are owned through its child list.
#[derive(Debug, Clone)]
pub struct Widget {
    pub name: NameRef,
    pub widget_type: WidgetType,
    pub pane_vec: Vec4,
    pub pos: WidgetPos,
    pub old_pos: WidgetPos,
    pub initialised: bool,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: Vec<WidgetId>,
    pub(crate) pane: Option<PaneId>,
    pub(crate) main_widget: Option<u16>,
    frame: WidgetFrame,
}

impl Widget {
    pub fn new(name: NameRef, widget_type: WidgetType) -> Self {
        Self {
            name,
            widget_type,
            pane_vec: Vec4::ZERO,
            pos: WidgetPos::default(),
            old_pos: WidgetPos::default(),
            initialised: false,
            parent: None,
            children: Vec::new(),
            pane: None,
            main_widget: None,
            frame: WidgetFrame::default(),
        }
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    pub fn pane(&self) -> Option<PaneId> {
        self.pane
    }

    /// Main-widget slot hosting a nested layout, if any.
    pub fn main_widget(&self) -> Option<u16> {
        self.main_widget
    }

    pub fn frame(&self) -> &WidgetFrame {
        &self.frame
    }

    pub fn mtx(&self) -> &Matrix34 {
        &self.frame.mtx
    }

    pub fn pane_mtx(&self) -> &Matrix34 {
        &self.frame.pane_mtx
    }

    pub fn mtx23(&self) -> &Matrix23 {
        &self.frame.mtx23
    }

    pub fn color(&self) -> Vec4 {
        self.frame.color
    }

    pub fn store_frame(&mut self, frame: WidgetFrame) {
        self.frame = frame;
        self.initialised = true;
    }

    /// Rewrite structural indices after the owning arena was compacted.
    ///
    /// `widget_map` and `pane_map` give the new index of every old index,
    /// or `None` for removed entries.
    pub fn remap(&mut self, widget_map: &[Option<WidgetId>], pane_map: &[Option<PaneId>]) {
        self.parent = self.parent.and_then(|p| widget_map[p.index()]);
        self.children = self
            .children
            .iter()
            .filter_map(|c| widget_map[c.index()])
            .collect();
        self.pane = self.pane.and_then(|p| pane_map[p.index()]);
    }

    pub fn set_parent(&mut self, parent: Option<WidgetId>) {
        self.parent = parent;
    }

    pub fn push_child(&mut self, child: WidgetId) {
        self.children.push(child);
    }

    pub fn remove_child(&mut self, child: WidgetId) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        self.children.len() != before
    }

    pub fn set_pane(&mut self, pane: Option<PaneId>) {
        self.pane = pane;
    }

    pub fn set_main_widget(&mut self, slot: Option<u16>) {
        self.main_widget = slot;
    }
}
