// crates/lyt-runtime/src/layout.rs
use std::collections::HashMap;

use lyt_core::{
    decode_archive, LayoutArchive, NameRef, Pane, PaneId, StringTable, Widget, WidgetId, WidgetType,
};
use tracing::debug;

use crate::{AnimPlayer, DrawEntry, LayoutError, Result};

/// Named attachment point where a nested layout is composed into its host.
pub struct MainWidget {
    pub name: String,
    pub(crate) layout: Option<Box<Layout>>,
}

impl MainWidget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: None,
        }
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_deref()
    }

    pub fn layout_mut(&mut self) -> Option<&mut Layout> {
        self.layout.as_deref_mut()
    }
}

/// A decoded widget tree together with its panes, names, bound animation
/// players and main-widget slots.
///
/// The flat widget array is the arena every structural index points into;
/// tree edits keep it identical to the set of widgets reachable from the root.
pub struct Layout {
    pub(crate) name: String,
    pub(crate) strings: StringTable,
    pub(crate) widgets: Vec<Widget>,
    pub(crate) panes: Vec<Pane>,
    pub(crate) root: WidgetId,
    pub(crate) main_widgets: Vec<MainWidget>,
    pub(crate) players: Vec<Box<dyn AnimPlayer + Send>>,
    pub(crate) name_index: HashMap<String, WidgetId>,
    pub(crate) draw_list: Vec<DrawEntry>,
    initialised: bool,
}

impl Layout {
    pub fn new(archive: LayoutArchive, name: impl Into<String>) -> Self {
        let mut layout = Self {
            name: name.into(),
            strings: archive.strings,
            widgets: archive.widgets,
            panes: archive.panes,
            root: archive.root,
            main_widgets: Vec::new(),
            players: Vec::new(),
            name_index: HashMap::new(),
            draw_list: Vec::new(),
            initialised: false,
        };
        layout.rebuild_name_index();
        layout
    }

    pub fn decode(data: &[u8], name: impl Into<String>) -> Result<Self> {
        Ok(Self::new(decode_archive(data)?, name))
    }

    /// Bind main-widget slots and animation players.
    ///
    /// # Panics
    ///
    /// Binding twice is a lifecycle error and panics.
    pub fn init(&mut self, main_widgets: Vec<MainWidget>, players: Vec<Box<dyn AnimPlayer + Send>>) {
        assert!(!self.initialised, "layout '{}' initialised twice", self.name);
        debug!(
            "Initialising layout '{}' with {} main widgets and {} players",
            self.name,
            main_widgets.len(),
            players.len()
        );
        self.main_widgets = main_widgets;
        self.players = players;
        self.initialised = true;
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_of(&self, name: NameRef) -> &str {
        self.strings.get(name)
    }

    pub fn widget_name(&self, id: WidgetId) -> &str {
        self.widget(id).map(|w| self.strings.get(w.name)).unwrap_or("")
    }

    pub fn root_id(&self) -> WidgetId {
        self.root
    }

    pub fn root_widget(&self) -> &Widget {
        &self.widgets[self.root.index()]
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn panes(&self) -> &[Pane] {
        &self.panes
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(id.index())
    }

    pub fn widget_mut(&mut self, id: WidgetId) -> Option<&mut Widget> {
        self.widgets.get_mut(id.index())
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.get(id.index())
    }

    /// First widget with this name in flat-array order.
    pub fn widget_id(&self, name: &str) -> Option<WidgetId> {
        self.name_index.get(name).copied()
    }

    pub fn get_widget(&self, name: &str) -> Option<&Widget> {
        self.widget_id(name).and_then(|id| self.widget(id))
    }

    pub fn get_widget_mut(&mut self, name: &str) -> Option<&mut Widget> {
        let id = self.widget_id(name)?;
        self.widget_mut(id)
    }

    pub fn get_pane(&self, name: &str) -> Option<&Pane> {
        self.panes.iter().find(|p| self.strings.get(p.name) == name)
    }

    pub fn pane_id(&self, name: &str) -> Option<PaneId> {
        self.panes
            .iter()
            .position(|p| self.strings.get(p.name) == name)
            .map(|i| PaneId(i as u32))
    }

    pub fn main_widgets(&self) -> &[MainWidget] {
        &self.main_widgets
    }

    pub fn players(&self) -> impl Iterator<Item = &(dyn AnimPlayer + Send)> {
        self.players.iter().map(|p| p.as_ref())
    }

    /// Entries produced by the last `calc`, in evaluation order.
    pub fn draw_list(&self) -> &[DrawEntry] {
        &self.draw_list
    }

    /// Host `layout` in main-widget slot `slot`.
    pub fn attach_layout(&mut self, slot: u16, layout: Layout) -> std::result::Result<(), (LayoutError, Layout)> {
        let count = self.main_widgets.len();
        let Some(main_widget) = self.main_widgets.get_mut(slot as usize) else {
            return Err((LayoutError::SlotOutOfRange { slot, count }, layout));
        };
        if main_widget.layout.is_some() {
            return Err((LayoutError::SlotOccupied(slot), layout));
        }
        debug!("Layout '{}' hosts '{}' in slot {}", self.name, layout.name, slot);
        main_widget.layout = Some(Box::new(layout));
        Ok(())
    }

    pub fn detach_layout(&mut self, slot: u16) -> Result<Layout> {
        let count = self.main_widgets.len();
        let main_widget = self
            .main_widgets
            .get_mut(slot as usize)
            .ok_or(LayoutError::SlotOutOfRange { slot, count })?;
        main_widget
            .layout
            .take()
            .map(|layout| *layout)
            .ok_or(LayoutError::SlotEmpty(slot))
    }

    /// Create a widget as the last child of `parent`.
    pub fn add_widget(&mut self, parent: WidgetId, name: &str, widget_type: WidgetType) -> Option<WidgetId> {
        self.widgets.get(parent.index())?;
        let id = WidgetId(self.widgets.len() as u32);
        let mut widget = Widget::new(self.strings.intern(name), widget_type);
        widget.set_parent(Some(parent));
        self.widgets.push(widget);
        self.widgets[parent.index()].push_child(id);
        if !name.is_empty() {
            self.name_index.entry(name.to_string()).or_insert(id);
        }
        Some(id)
    }

    /// Create a main-widget attachment node bound to `slot`.
    pub fn add_main_widget(&mut self, parent: WidgetId, name: &str, slot: u16) -> Option<WidgetId> {
        let id = self.add_widget(parent, name, WidgetType::MainWidget)?;
        self.widgets[id.index()].set_main_widget(Some(slot));
        Some(id)
    }

    /// Destroy `id` and its whole subtree, including the panes they own and
    /// any layouts hosted by main-widget slots inside it.
    ///
    /// The root cannot be removed. Indices of surviving widgets and panes
    /// may change.
    pub fn remove_widget(&mut self, id: WidgetId) -> bool {
        if id == self.root || id.index() >= self.widgets.len() {
            return false;
        }

        let mut doomed = vec![false; self.widgets.len()];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            doomed[current.index()] = true;
            stack.extend_from_slice(self.widgets[current.index()].children());
        }

        if let Some(parent) = self.widgets[id.index()].parent() {
            self.widgets[parent.index()].remove_child(id);
        }

        let mut dropped_panes = vec![false; self.panes.len()];
        for (index, widget) in self.widgets.iter().enumerate() {
            if !doomed[index] {
                continue;
            }
            if let Some(pane) = widget.pane() {
                dropped_panes[pane.index()] = true;
            }
            let hosted = widget
                .main_widget()
                .and_then(|slot| self.main_widgets.get_mut(slot as usize))
                .and_then(|m| m.layout.take());
            if let Some(hosted) = hosted {
                debug!("Layout '{}' dropped with its slot in '{}'", hosted.name, self.name);
            }
        }

        let widget_map = compact(&mut self.widgets, &doomed, |i| WidgetId(i as u32));
        let pane_map = compact(&mut self.panes, &dropped_panes, |i| PaneId(i as u32));
        for widget in &mut self.widgets {
            widget.remap(&widget_map, &pane_map);
        }
        if let Some(root) = widget_map[self.root.index()] {
            self.root = root;
        }
        self.draw_list.clear();
        self.rebuild_name_index();
        true
    }

    /// Unnamed widgets are never indexed.
    fn rebuild_name_index(&mut self) {
        self.name_index.clear();
        for (index, widget) in self.widgets.iter().enumerate() {
            if widget.name.is_empty() {
                continue;
            }
            self.name_index
                .entry(self.strings.get(widget.name).to_string())
                .or_insert(WidgetId(index as u32));
        }
    }
}

/// Drop flagged entries and return the old-to-new index map.
fn compact<T, I: Copy>(items: &mut Vec<T>, removed: &[bool], make: impl Fn(usize) -> I) -> Vec<Option<I>> {
    let mut map = Vec::with_capacity(items.len());
    let mut next = 0;
    for &gone in removed {
        if gone {
            map.push(None);
        } else {
            map.push(Some(make(next)));
            next += 1;
        }
    }
    let mut index = 0;
    items.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
    map
}
