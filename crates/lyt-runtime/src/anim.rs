// crates/lyt-runtime/src/anim.rs
use std::collections::HashMap;

use lyt_core::{StringTable, Widget, WidgetId, WidgetPos};

/// Drives animation tracks onto a layout's widgets once per frame.
///
/// Players are bound with [`crate::Layout::init`] and run in bind order
/// before every transform traversal.
pub trait AnimPlayer {
    fn name(&self) -> &str;

    fn apply(&mut self, target: &mut AnimTarget<'_>, speed: f32);
}

/// Name-keyed write access to the widget positions of one layout.
pub struct AnimTarget<'a> {
    widgets: &'a mut [Widget],
    strings: &'a StringTable,
    index: &'a HashMap<String, WidgetId>,
}

impl<'a> AnimTarget<'a> {
    pub(crate) fn new(
        widgets: &'a mut [Widget],
        strings: &'a StringTable,
        index: &'a HashMap<String, WidgetId>,
    ) -> Self {
        Self { widgets, strings, index }
    }

    pub fn widget_id(&self, name: &str) -> Option<WidgetId> {
        self.index.get(name).copied()
    }

    pub fn pos(&self, name: &str) -> Option<&WidgetPos> {
        let id = self.widget_id(name)?;
        self.widgets.get(id.index()).map(|w| &w.pos)
    }

    pub fn pos_mut(&mut self, name: &str) -> Option<&mut WidgetPos> {
        let id = self.widget_id(name)?;
        self.pos_by_id_mut(id)
    }

    pub fn pos_by_id_mut(&mut self, id: WidgetId) -> Option<&mut WidgetPos> {
        self.widgets.get_mut(id.index()).map(|w| &mut w.pos)
    }

    pub fn widget_name(&self, id: WidgetId) -> Option<&str> {
        self.widgets.get(id.index()).map(|w| self.strings.get(w.name))
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }
}
