// crates/lyt-runtime/src/calc.rs
use glam::{EulerRot, Quat, Vec4};
use lyt_core::{Matrix23, Matrix34, Pane, Widget, WidgetFrame, WidgetId, WidgetPos};
use tracing::trace;

use crate::{AnimTarget, DrawEntry, DrawItem, Layout, MainWidget};

/// Frame step used when the caller has no better estimate (one 30 Hz tick).
pub const DEFAULT_SPEED: f32 = 1.0 / 30.0;

/// Local transform of a widget: T(translate) * R(rotate) * S(scale).
pub fn local_matrix(pos: &WidgetPos) -> Matrix34 {
    let rotation = Quat::from_euler(
        EulerRot::XYZ,
        pos.rotate.x.to_radians(),
        pos.rotate.y.to_radians(),
        pos.rotate.z.to_radians(),
    );
    Matrix34::from_scale_rotation_translation(pos.scale, rotation, pos.translate)
}

impl Layout {
    /// Evaluate one frame as a top-level layout.
    pub fn calc(&mut self, speed: f32) {
        self.calc_with(&Matrix34::IDENTITY, Vec4::ONE, &Matrix23::IDENTITY, 0, speed);
    }

    /// Evaluate one frame under an inherited transform and tint.
    ///
    /// `reserved` is forwarded unchanged to nested layouts.
    pub fn calc_with(&mut self, parent_mtx: &Matrix34, color: Vec4, mtx23: &Matrix23, reserved: i32, speed: f32) {
        for widget in &mut self.widgets {
            widget.old_pos = widget.pos;
        }

        if !self.players.is_empty() {
            let mut target = AnimTarget::new(&mut self.widgets, &self.strings, &self.name_index);
            for player in &mut self.players {
                trace!("Running player '{}' at speed {}", player.name(), speed);
                player.apply(&mut target, speed);
            }
        }

        self.draw_list.clear();
        let mut traversal = Traversal {
            widgets: &mut self.widgets,
            panes: &self.panes,
            main_widgets: &mut self.main_widgets,
            draw_list: &mut self.draw_list,
            mtx23: *mtx23,
            reserved,
            speed,
        };
        traversal.run(self.root, *parent_mtx, color);
    }
}

struct Traversal<'a> {
    widgets: &'a mut [Widget],
    panes: &'a [Pane],
    main_widgets: &'a mut [MainWidget],
    draw_list: &'a mut Vec<DrawEntry>,
    mtx23: Matrix23,
    reserved: i32,
    speed: f32,
}

/// Pending widget plus the state inherited from its parent.
type Frame = (WidgetId, Matrix34, Vec4, bool);

impl Traversal<'_> {
    /// Depth-first over an explicit stack, so tree depth is bounded by memory only.
    fn run(&mut self, root: WidgetId, parent_mtx: Matrix34, parent_color: Vec4) {
        let mut stack: Vec<Frame> = vec![(root, parent_mtx, parent_color, true)];
        while let Some((id, parent_mtx, parent_color, parent_visible)) = stack.pop() {
            let (mtx, color, visible) = self.visit(id, &parent_mtx, parent_color, parent_visible);
            // Reversed so the first child is popped first.
            stack.extend(
                self.widgets[id.index()]
                    .children()
                    .iter()
                    .rev()
                    .map(|&child| (child, mtx, color, visible)),
            );
        }
    }

    fn visit(&mut self, id: WidgetId, parent_mtx: &Matrix34, parent_color: Vec4, parent_visible: bool) -> (Matrix34, Vec4, bool) {
        let widget = &self.widgets[id.index()];
        let pos = &widget.pos;
        let visible = parent_visible && pos.is_visible();

        let mtx = *parent_mtx * local_matrix(pos);
        let mut color = parent_color * pos.color;
        if !visible {
            color.w = 0.0;
        }

        let pane = widget.pane().map(|p| (p, &self.panes[p.index()]));
        let pane_mtx = match pane {
            Some((_, pane)) => mtx * pane.local_matrix(),
            None => mtx,
        };
        let slot = widget.main_widget();

        if let Some((pane_id, pane)) = pane {
            self.draw_list.push(DrawEntry::Pane(DrawItem {
                widget: id,
                pane: pane_id,
                pane_type: pane.pane_type(),
                mtx: pane_mtx,
                color,
                visible,
            }));
        }

        self.widgets[id.index()].store_frame(WidgetFrame {
            mtx,
            pane_mtx,
            mtx23: self.mtx23,
            color,
        });

        if let Some(slot) = slot {
            if let Some(nested) = self
                .main_widgets
                .get_mut(slot as usize)
                .and_then(|m| m.layout.as_deref_mut())
            {
                nested.calc_with(&mtx, color, &self.mtx23, self.reserved, self.speed);
                self.draw_list.push(DrawEntry::Nested(slot));
            }
        }

        (mtx, color, visible)
    }
}
